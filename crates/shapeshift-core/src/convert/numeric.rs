//! Numeric, boolean, character and temporal conversions
//!
//! Values pass through a wide intermediate [`Number`] and are narrowed to the
//! target representation with the target's own overflow behavior: integer
//! narrowing wraps, float to integer saturates, as Rust's `as` casts do.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::types::PrimitiveKind;
use crate::value::Value;
use chrono::{DateTime, Utc};

/// Intermediate representation of a numeric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

/// Whether a numeric-style conversion exists between two primitive kinds
///
/// Strings are handled by the text rules and never reach this table.
pub fn supports(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind as K;
    match (from, to) {
        (K::String, _) | (_, K::String) => false,
        (a, b) if a == b => true,
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (K::Bool, other) | (other, K::Bool) => other.is_numeric(),
        (K::Char, other) | (other, K::Char) => other.is_integral(),
        (K::DateTime, other) | (other, K::DateTime) => other.is_numeric(),
        _ => false,
    }
}

impl Number {
    /// Read a value as a number, using the form the target needs
    ///
    /// DateTime values become Unix seconds, fractional when the target is a
    /// float.
    pub fn from_value(value: &Value, target: PrimitiveKind) -> Option<Number> {
        Some(match value {
            Value::Bool(v) => Number::Int(i128::from(*v)),
            Value::Char(v) => Number::Int(i128::from(u32::from(*v))),
            Value::I8(v) => Number::Int(i128::from(*v)),
            Value::I16(v) => Number::Int(i128::from(*v)),
            Value::I32(v) => Number::Int(i128::from(*v)),
            Value::I64(v) => Number::Int(i128::from(*v)),
            Value::U8(v) => Number::Int(i128::from(*v)),
            Value::U16(v) => Number::Int(i128::from(*v)),
            Value::U32(v) => Number::Int(i128::from(*v)),
            Value::U64(v) => Number::Int(i128::from(*v)),
            Value::F32(v) => Number::Float(f64::from(*v)),
            Value::F64(v) => Number::Float(*v),
            Value::DateTime(v) if target.is_float() => Number::Float(
                v.timestamp() as f64 + f64::from(v.timestamp_subsec_nanos()) / 1e9,
            ),
            Value::DateTime(v) => Number::Int(i128::from(v.timestamp())),
            _ => return None,
        })
    }

    /// Narrow to the target representation
    pub fn into_value(self, target: PrimitiveKind) -> Result<Value> {
        use PrimitiveKind as K;
        let value = match (self, target) {
            (Number::Int(v), K::Bool) => Value::Bool(v != 0),
            (Number::Float(v), K::Bool) => Value::Bool(v != 0.0),
            (Number::Int(v), K::Char) => Value::Char(code_point(v)?),
            (Number::Float(v), K::Char) => {
                return Err(Error::Conversion {
                    value: v.to_string(),
                    from: "float".to_string(),
                    to: PrimitiveKind::Char.name().to_string(),
                    message: "only integral values convert to char".to_string(),
                })
            }
            (Number::Int(v), K::I8) => Value::I8(v as i8),
            (Number::Int(v), K::I16) => Value::I16(v as i16),
            (Number::Int(v), K::I32) => Value::I32(v as i32),
            (Number::Int(v), K::I64) => Value::I64(v as i64),
            (Number::Int(v), K::U8) => Value::U8(v as u8),
            (Number::Int(v), K::U16) => Value::U16(v as u16),
            (Number::Int(v), K::U32) => Value::U32(v as u32),
            (Number::Int(v), K::U64) => Value::U64(v as u64),
            (Number::Int(v), K::F32) => Value::F32(v as f32),
            (Number::Int(v), K::F64) => Value::F64(v as f64),
            (Number::Float(v), K::I8) => Value::I8(v as i8),
            (Number::Float(v), K::I16) => Value::I16(v as i16),
            (Number::Float(v), K::I32) => Value::I32(v as i32),
            (Number::Float(v), K::I64) => Value::I64(v as i64),
            (Number::Float(v), K::U8) => Value::U8(v as u8),
            (Number::Float(v), K::U16) => Value::U16(v as u16),
            (Number::Float(v), K::U32) => Value::U32(v as u32),
            (Number::Float(v), K::U64) => Value::U64(v as u64),
            (Number::Float(v), K::F32) => Value::F32(v as f32),
            (Number::Float(v), K::F64) => Value::F64(v),
            (number, K::DateTime) => Value::DateTime(timestamp(number)?),
            (number, K::String) => {
                return Err(Error::mismatch("numeric target", format!("{number:?} to string")))
            }
        };
        Ok(value)
    }

    fn render(self) -> String {
        match self {
            Number::Int(v) => v.to_string(),
            Number::Float(v) => v.to_string(),
        }
    }
}

fn code_point(raw: i128) -> Result<char> {
    u32::try_from(raw)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| Error::Conversion {
            value: raw.to_string(),
            from: "integer".to_string(),
            to: PrimitiveKind::Char.name().to_string(),
            message: "not a valid unicode scalar value".to_string(),
        })
}

fn timestamp(number: Number) -> Result<DateTime<Utc>> {
    let converted = match number {
        Number::Int(secs) => i64::try_from(secs)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        Number::Float(secs) if secs.is_finite() => {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
        Number::Float(_) => None,
    };
    converted.ok_or_else(|| Error::Conversion {
        value: number.render(),
        from: "number".to_string(),
        to: PrimitiveKind::DateTime.name().to_string(),
        message: "timestamp out of range".to_string(),
    })
}

/// Convert a value to another numeric-style primitive kind
pub fn convert(value: &Value, target: PrimitiveKind) -> Result<Value> {
    let number = Number::from_value(value, target)
        .ok_or_else(|| Error::mismatch("numeric value", value.kind_name()))?;
    number.into_value(target)
}

/// Narrow a discriminant to an integral representation, wrapping on overflow
pub fn cast_integral(raw: i64, kind: PrimitiveKind) -> i64 {
    match kind {
        PrimitiveKind::I8 => i64::from(raw as i8),
        PrimitiveKind::I16 => i64::from(raw as i16),
        PrimitiveKind::I32 => i64::from(raw as i32),
        PrimitiveKind::U8 => i64::from(raw as u8),
        PrimitiveKind::U16 => i64::from(raw as u16),
        PrimitiveKind::U32 => i64::from(raw as u32),
        _ => raw,
    }
}

/// Integral value as a raw discriminant; `u64` keeps its bit pattern
pub fn integral_value(value: &Value) -> Option<i64> {
    match value {
        Value::U64(v) => Some(*v as i64),
        other => other.as_i64(),
    }
}
