//! Conversions to and from strings
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::shape::EnumShape;
use crate::types::PrimitiveKind;
use crate::value::{EnumValue, Value};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::str::FromStr;

fn parse_failure(text: &str, to: impl Display, message: impl Display) -> Error {
    Error::Conversion {
        value: format!("{text:?}"),
        from: PrimitiveKind::String.name().to_string(),
        to: to.to_string(),
        message: message.to_string(),
    }
}

fn parse_number<T>(text: &str, kind: PrimitiveKind) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|err| parse_failure(text, kind, err))
}

/// Standard textual representation of a primitive value
pub fn render(value: &Value) -> Result<Value> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Bool(v) => v.to_string(),
        Value::Char(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::DateTime(v) => v.to_rfc3339(),
        other => return Err(Error::mismatch("primitive value", other.kind_name())),
    };
    Ok(Value::String(text))
}

/// Parse a string with the target kind's canonical parser
pub fn parse(value: &Value, kind: PrimitiveKind) -> Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::mismatch(PrimitiveKind::String, value.kind_name()))?;
    let parsed = match kind {
        PrimitiveKind::String => Value::String(text.to_string()),
        PrimitiveKind::Bool => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return Err(parse_failure(text, kind, "expected 'true' or 'false'"));
            }
        }
        PrimitiveKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(parse_failure(text, kind, "expected exactly one character")),
            }
        }
        PrimitiveKind::I8 => Value::I8(parse_number(text, kind)?),
        PrimitiveKind::I16 => Value::I16(parse_number(text, kind)?),
        PrimitiveKind::I32 => Value::I32(parse_number(text, kind)?),
        PrimitiveKind::I64 => Value::I64(parse_number(text, kind)?),
        PrimitiveKind::U8 => Value::U8(parse_number(text, kind)?),
        PrimitiveKind::U16 => Value::U16(parse_number(text, kind)?),
        PrimitiveKind::U32 => Value::U32(parse_number(text, kind)?),
        PrimitiveKind::U64 => Value::U64(parse_number(text, kind)?),
        PrimitiveKind::F32 => Value::F32(parse_number(text, kind)?),
        PrimitiveKind::F64 => Value::F64(parse_number(text, kind)?),
        PrimitiveKind::DateTime => {
            let moment = DateTime::parse_from_rfc3339(text.trim())
                .map_err(|err| parse_failure(text, kind, err))?;
            Value::DateTime(moment.with_timezone(&Utc))
        }
    };
    Ok(parsed)
}

/// Constant name of an enum value, or its discriminant if undeclared
pub fn enum_to_string(value: &Value, shape: &EnumShape) -> Result<Value> {
    match value {
        Value::Enum(EnumValue { raw, .. }) => Ok(Value::String(
            shape
                .name_of(*raw)
                .map_or_else(|| raw.to_string(), str::to_string),
        )),
        other => Err(Error::mismatch(&shape.ty, other.kind_name())),
    }
}

/// Parse a declared constant name or a numeric discriminant
pub fn string_to_enum(value: &Value, shape: &EnumShape) -> Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::mismatch(PrimitiveKind::String, value.kind_name()))?;
    let trimmed = text.trim();
    let raw = match shape.value_of(trimmed) {
        Some(raw) => raw,
        None => trimmed.parse::<i64>().map_err(|_| {
            parse_failure(text, &shape.ty, format!("no constant named '{trimmed}'"))
        })?,
    };
    Ok(Value::Enum(EnumValue::new(
        shape.ty.clone(),
        super::numeric::cast_integral(raw, shape.underlying),
    )))
}
