//! Conversion rule engine for value-like shapes
//!
//! Given the declared source and target shapes of a single value, produces a
//! [`Converter`] that turns one into the other. Custom converters registered
//! for a pair take precedence over the built-in rules. Converters never see
//! `Null`; null handling belongs to the compiled mapper.
//!
//! # Module Organization
//!
//! - [`numeric`] - Numeric, boolean, character and temporal conversions
//! - [`text`] - Rendering to and parsing from strings
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod numeric;
pub mod text;

use crate::error::{Error, Result};
use crate::shape::{EnumShape, Shape, ShapeKind};
use crate::types::{PrimitiveKind, TypeRef};
use crate::value::{EnumValue, Value};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A compiled single-value conversion
pub type Converter = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// User-supplied conversion closure
pub type ConverterFn = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// Wrap a closure as a [`Converter`]
pub fn converter<F>(f: F) -> Converter
where
    F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

type Pair = (TypeRef, TypeRef);

/// Built-in conversion rules plus registered custom converters
#[derive(Default)]
pub struct ConversionEngine {
    custom: RwLock<HashMap<Pair, ConverterFn>>,
    /// Pairs a compiled mapper has already looked up
    consumed: RwLock<HashSet<Pair>>,
}

impl ConversionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a custom converter for a type pair
    ///
    /// Fails once a compiled mapper has resolved a conversion for the pair.
    pub fn register(&self, source: TypeRef, target: TypeRef, convert: ConverterFn) -> Result<()> {
        let pair = (source, target);
        if self.consumed.read().contains(&pair) {
            return Err(Error::setup(
                "converter registered after the pair was compiled",
                &pair.0,
                &pair.1,
            ));
        }
        log::debug!("registered converter {} -> {}", pair.0, pair.1);
        if self.custom.write().insert(pair.clone(), convert).is_some() {
            log::warn!("converter {} -> {} replaced", pair.0, pair.1);
        }
        Ok(())
    }

    /// Remove a custom converter; returns whether one was registered
    pub fn unregister(&self, source: &TypeRef, target: &TypeRef) -> Result<bool> {
        let pair = (source.clone(), target.clone());
        if self.consumed.read().contains(&pair) {
            return Err(Error::setup(
                "converter removed after the pair was compiled",
                source,
                target,
            ));
        }
        Ok(self.custom.write().remove(&pair).is_some())
    }

    pub fn has_custom(&self, source: &TypeRef, target: &TypeRef) -> bool {
        self.custom
            .read()
            .contains_key(&(source.clone(), target.clone()))
    }

    /// Look up a custom converter, marking the pair as consumed
    pub fn custom(&self, source: &TypeRef, target: &TypeRef) -> Option<Converter> {
        let pair = (source.clone(), target.clone());
        let convert = self.custom.read().get(&pair).cloned();
        self.consumed.write().insert(pair);
        let convert = convert?;
        let from = source.to_string();
        let to = target.to_string();
        Some(converter(move |value| {
            convert(value).map_err(|err| Error::Conversion {
                value: value.to_string(),
                from: from.clone(),
                to: to.clone(),
                message: format!("{err:#}"),
            })
        }))
    }

    /// Converter between two value-like shapes
    ///
    /// A registered custom converter wins; otherwise the built-in rules apply
    /// and an unsupported pairing is a build error.
    pub fn converter_for(&self, source: &Shape, target: &Shape) -> Result<Converter> {
        if let Some(custom) = self.custom(source.ty(), target.ty()) {
            return Ok(custom);
        }
        builtin(source, target)
    }
}

impl std::fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("custom", &self.custom.read().len())
            .field("consumed", &self.consumed.read().len())
            .finish()
    }
}

fn unsupported(source: &Shape, target: &Shape) -> Error {
    Error::build(
        format!(
            "no conversion from {} shape to {} shape",
            source.kind().label(),
            target.kind().label()
        ),
        source.ty(),
        target.ty(),
    )
}

fn builtin(source: &Shape, target: &Shape) -> Result<Converter> {
    let built = match (source.kind(), target.kind()) {
        (ShapeKind::Primitive(from), ShapeKind::Primitive(to)) => primitive(*from, *to)
            .ok_or_else(|| unsupported(source, target))?,
        (ShapeKind::Enum(from), ShapeKind::Enum(to)) => enum_to_enum(from, to),
        (ShapeKind::Enum(from), ShapeKind::Primitive(PrimitiveKind::String)) => {
            let shape = from.clone();
            converter(move |value| text::enum_to_string(value, &shape))
        }
        (ShapeKind::Primitive(PrimitiveKind::String), ShapeKind::Enum(to)) => {
            let shape = to.clone();
            converter(move |value| text::string_to_enum(value, &shape))
        }
        (ShapeKind::Enum(from), ShapeKind::Primitive(to)) if to.is_integral() => {
            enum_to_integral(from, *to)
        }
        (ShapeKind::Primitive(from), ShapeKind::Enum(to)) if from.is_integral() => {
            integral_to_enum(to)
        }
        _ => return Err(unsupported(source, target)),
    };
    Ok(built)
}

fn primitive(from: PrimitiveKind, to: PrimitiveKind) -> Option<Converter> {
    if from == to {
        return Some(converter(|value| Ok(value.clone())));
    }
    match (from, to) {
        (_, PrimitiveKind::String) => Some(converter(text::render)),
        (PrimitiveKind::String, _) => Some(converter(move |value| text::parse(value, to))),
        _ if numeric::supports(from, to) => {
            Some(converter(move |value| numeric::convert(value, to)))
        }
        _ => None,
    }
}

/// Direct copy when representations agree, else through the integral value
fn enum_to_enum(from: &EnumShape, to: &EnumShape) -> Converter {
    let source = from.ty.clone();
    let target = to.ty.clone();
    let underlying = to.underlying;
    let same_repr = from.underlying == to.underlying;
    converter(move |value| match value {
        Value::Enum(EnumValue { ty, raw }) if *ty == source => {
            let raw = if same_repr {
                *raw
            } else {
                numeric::cast_integral(*raw, underlying)
            };
            Ok(Value::Enum(EnumValue::new(target.clone(), raw)))
        }
        other => Err(Error::mismatch(&source, other.kind_name())),
    })
}

fn enum_to_integral(from: &EnumShape, to: PrimitiveKind) -> Converter {
    let source = from.ty.clone();
    converter(move |value| match value {
        Value::Enum(EnumValue { raw, .. }) => {
            numeric::Number::Int(i128::from(*raw)).into_value(to)
        }
        other => Err(Error::mismatch(&source, other.kind_name())),
    })
}

fn integral_to_enum(to: &EnumShape) -> Converter {
    let target = to.ty.clone();
    let underlying = to.underlying;
    converter(move |value| {
        let raw = numeric::integral_value(value)
            .ok_or_else(|| Error::mismatch("integral value", value.kind_name()))?;
        Ok(Value::Enum(EnumValue::new(
            target.clone(),
            numeric::cast_integral(raw, underlying),
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn prim(kind: PrimitiveKind) -> Shape {
        Shape::primitive(kind)
    }

    fn enum_shape(name: &str, underlying: PrimitiveKind) -> Shape {
        Shape::enumeration(EnumShape {
            ty: TypeRef::named(name),
            underlying,
            constants: vec![("Low".to_string(), 1), ("High".to_string(), 300)],
        })
    }

    #[test]
    fn test_identity_and_numeric() {
        let engine = ConversionEngine::new();
        let same = engine.converter_for(&prim(PrimitiveKind::I32), &prim(PrimitiveKind::I32)).unwrap();
        assert_eq!(same(&Value::I32(5)).unwrap(), Value::I32(5));
        let widen = engine.converter_for(&prim(PrimitiveKind::I32), &prim(PrimitiveKind::F64)).unwrap();
        assert_eq!(widen(&Value::I32(5)).unwrap(), Value::F64(5.0));
    }

    #[test]
    fn test_string_rules() {
        let engine = ConversionEngine::new();
        let render = engine.converter_for(&prim(PrimitiveKind::I32), &prim(PrimitiveKind::String)).unwrap();
        assert_eq!(render(&Value::I32(42)).unwrap(), Value::from("42"));
        let nullable = Shape::nullable(&prim(PrimitiveKind::I32));
        let parse = engine.converter_for(&prim(PrimitiveKind::String), &nullable).unwrap();
        assert_eq!(parse(&Value::from("42")).unwrap(), Value::I32(42));
    }

    #[test]
    fn test_unsupported_is_build_error() {
        let engine = ConversionEngine::new();
        let err = engine
            .converter_for(&prim(PrimitiveKind::Bool), &prim(PrimitiveKind::DateTime))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Build);
    }

    #[test]
    fn test_enum_conversions() {
        let engine = ConversionEngine::new();
        let wide = enum_shape("Level", PrimitiveKind::I32);
        let narrow = enum_shape("SmallLevel", PrimitiveKind::U8);
        let high = Value::Enum(EnumValue::new(TypeRef::named("Level"), 300));

        let to_narrow = engine.converter_for(&wide, &narrow).unwrap();
        assert_eq!(
            to_narrow(&high).unwrap(),
            Value::Enum(EnumValue::new(TypeRef::named("SmallLevel"), 44))
        );

        let same_repr = enum_shape("OtherLevel", PrimitiveKind::I32);
        let copy = engine.converter_for(&wide, &same_repr).unwrap();
        assert_eq!(
            copy(&high).unwrap(),
            Value::Enum(EnumValue::new(TypeRef::named("OtherLevel"), 300))
        );

        let to_int = engine.converter_for(&wide, &prim(PrimitiveKind::I64)).unwrap();
        assert_eq!(to_int(&high).unwrap(), Value::I64(300));
        let from_int = engine.converter_for(&prim(PrimitiveKind::I16), &wide).unwrap();
        assert_eq!(from_int(&Value::I16(1)).unwrap(), Value::Enum(EnumValue::new(TypeRef::named("Level"), 1)));
        let to_text = engine.converter_for(&wide, &prim(PrimitiveKind::String)).unwrap();
        assert_eq!(to_text(&high).unwrap(), Value::from("High"));
    }

    #[test]
    fn test_custom_converter_wins_and_seals() {
        let engine = ConversionEngine::new();
        engine
            .register(
                TypeRef::I32,
                TypeRef::STRING,
                Arc::new(|value: &Value| Ok(Value::from(format!("#{value}")))),
            )
            .unwrap();
        let convert = engine
            .converter_for(&prim(PrimitiveKind::I32), &prim(PrimitiveKind::String))
            .unwrap();
        assert_eq!(convert(&Value::I32(7)).unwrap(), Value::from("#7"));

        let err = engine
            .register(TypeRef::I32, TypeRef::STRING, Arc::new(|value: &Value| Ok(value.clone())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_custom_converter_error_becomes_conversion_error() {
        let engine = ConversionEngine::new();
        engine
            .register(
                TypeRef::STRING,
                TypeRef::I32,
                Arc::new(|_: &Value| Err(anyhow::anyhow!("always fails"))),
            )
            .unwrap();
        let convert = engine.custom(&TypeRef::STRING, &TypeRef::I32).unwrap();
        let err = convert(&Value::from("1")).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref message, .. } if message.contains("always fails")));
    }
}
