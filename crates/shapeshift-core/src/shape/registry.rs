//! Default shape catalog backed by explicit declarations
//!
//! Structural types (primitives, nullable wrappers, collections and
//! dictionaries) are described without registration. Named enum and object
//! types must be declared before anything maps them. Descriptions are
//! computed once per type and cached.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::{ElementTypes, EnumShape, MemberInfo, Shape, ShapeCatalog};
use crate::error::{Error, Result};
use crate::types::{CollectionKind, PrimitiveKind, TypeRef};
use crate::value::{EnumValue, Value};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Declaration {
    Object {
        members: Vec<MemberInfo>,
        has_default_constructor: bool,
    },
    Enum {
        underlying: PrimitiveKind,
        constants: Vec<(String, i64)>,
    },
}

/// In-memory shape catalog
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    declarations: RwLock<HashMap<Arc<str>, Declaration>>,
    described: RwLock<HashMap<TypeRef, Arc<Shape>>>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring an object type
    pub fn declare_object(&self, name: impl AsRef<str>) -> ObjectDeclaration<'_> {
        ObjectDeclaration {
            registry: self,
            name: Arc::from(name.as_ref()),
            members: Vec::new(),
            has_default_constructor: true,
        }
    }

    /// Start declaring an enum type with an integral underlying representation
    pub fn declare_enum(&self, name: impl AsRef<str>, underlying: PrimitiveKind) -> EnumDeclaration<'_> {
        EnumDeclaration {
            registry: self,
            name: Arc::from(name.as_ref()),
            underlying,
            constants: Vec::new(),
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declarations.read().contains_key(name)
    }

    fn declare(&self, name: Arc<str>, declaration: Declaration) -> Result<TypeRef> {
        let ty = TypeRef::Named(name.clone());
        if self.described.read().contains_key(&ty) {
            return Err(Error::setup(
                format!("type '{name}' was already described and cannot be redeclared"),
                &ty,
                &ty,
            ));
        }
        log::debug!("declared shape '{}'", name);
        self.declarations.write().insert(name, declaration);
        Ok(ty)
    }

    /// Default value of a member, resolved from declarations only
    fn member_default(&self, ty: &TypeRef) -> Value {
        match ty {
            TypeRef::Primitive(kind) => Value::zero(*kind),
            TypeRef::Named(name) => match self.declarations.read().get(name) {
                Some(Declaration::Enum { constants, .. }) => Value::Enum(EnumValue::new(
                    ty.clone(),
                    constants.first().map_or(0, |(_, raw)| *raw),
                )),
                _ => Value::Null,
            },
            _ => Value::Null,
        }
    }

    fn compute(&self, ty: &TypeRef) -> Result<Shape> {
        match ty {
            TypeRef::Primitive(kind) => Ok(Shape::primitive(*kind)),
            TypeRef::Nullable(inner) => {
                let inner_shape = self.describe(inner)?;
                if !inner_shape.is_value_like() || inner_shape.is_nullable() {
                    return Err(Error::build(
                        format!(
                            "nullable wrapper only applies to primitive and enum types, not {} shape",
                            inner_shape.kind().label()
                        ),
                        ty,
                        ty,
                    ));
                }
                Ok(Shape::nullable(&inner_shape))
            }
            TypeRef::Named(name) => {
                let declaration = self.declarations.read().get(name).cloned();
                match declaration {
                    Some(Declaration::Object {
                        members,
                        has_default_constructor,
                    }) => {
                        let members = members
                            .into_iter()
                            .map(|member| {
                                let default = self.member_default(&member.ty);
                                member.with_default(default)
                            })
                            .collect();
                        Ok(Shape::object(ty.clone(), members, has_default_constructor))
                    }
                    Some(Declaration::Enum {
                        underlying,
                        constants,
                    }) => Ok(Shape::enumeration(EnumShape {
                        ty: ty.clone(),
                        underlying,
                        constants,
                    })),
                    None => Err(Error::build(format!("unknown type '{name}'"), ty, ty)),
                }
            }
            TypeRef::Collection(CollectionKind::Dictionary, _) => Err(Error::build(
                "dictionaries need a key and a value type",
                ty,
                ty,
            )),
            TypeRef::Collection(kind, element) => Ok(Shape::enumerable(
                ty.clone(),
                *kind,
                ElementTypes::Single((**element).clone()),
            )),
            TypeRef::Dictionary(key, value) => Ok(Shape::enumerable(
                ty.clone(),
                CollectionKind::Dictionary,
                ElementTypes::KeyValue((**key).clone(), (**value).clone()),
            )),
        }
    }
}

impl ShapeCatalog for ShapeRegistry {
    fn describe(&self, ty: &TypeRef) -> Result<Arc<Shape>> {
        if let Some(shape) = self.described.read().get(ty) {
            return Ok(shape.clone());
        }
        let shape = Arc::new(self.compute(ty)?);
        let mut described = self.described.write();
        Ok(described.entry(ty.clone()).or_insert(shape).clone())
    }
}

/// Builder for an object declaration
#[must_use = "declarations take effect when finished"]
pub struct ObjectDeclaration<'r> {
    registry: &'r ShapeRegistry,
    name: Arc<str>,
    members: Vec<MemberInfo>,
    has_default_constructor: bool,
}

impl<'r> ObjectDeclaration<'r> {
    /// Readable and writable member
    pub fn member(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.members.push(MemberInfo::new(name, ty));
        self
    }

    pub fn read_only(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.members.push(MemberInfo::new(name, ty).read_only());
        self
    }

    pub fn write_only(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.members.push(MemberInfo::new(name, ty).write_only());
        self
    }

    /// Mark the type as not constructible by the engine
    pub fn without_default_constructor(mut self) -> Self {
        self.has_default_constructor = false;
        self
    }

    pub fn finish(self) -> Result<TypeRef> {
        let duplicate = {
            let mut seen = HashSet::new();
            self.members
                .iter()
                .find(|member| !seen.insert(member.name.as_str()))
                .map(|member| member.name.clone())
        };
        if let Some(duplicate) = duplicate {
            let ty = TypeRef::Named(self.name.clone());
            return Err(Error::setup(
                format!("member '{duplicate}' declared twice"),
                &ty,
                &ty,
            ));
        }
        self.registry.declare(
            self.name,
            Declaration::Object {
                members: self.members,
                has_default_constructor: self.has_default_constructor,
            },
        )
    }
}

/// Builder for an enum declaration
#[must_use = "declarations take effect when finished"]
pub struct EnumDeclaration<'r> {
    registry: &'r ShapeRegistry,
    name: Arc<str>,
    underlying: PrimitiveKind,
    constants: Vec<(String, i64)>,
}

impl<'r> EnumDeclaration<'r> {
    pub fn constant(mut self, name: impl Into<String>, raw: i64) -> Self {
        self.constants.push((name.into(), raw));
        self
    }

    pub fn finish(self) -> Result<TypeRef> {
        if !self.underlying.is_integral() {
            let ty = TypeRef::Named(self.name.clone());
            return Err(Error::setup(
                format!("enum underlying type must be integral, got {}", self.underlying),
                &ty,
                &ty,
            ));
        }
        self.registry.declare(
            self.name,
            Declaration::Enum {
                underlying: self.underlying,
                constants: self.constants,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::shape::ShapeKind;

    fn registry() -> ShapeRegistry {
        let registry = ShapeRegistry::new();
        registry
            .declare_enum("Color", PrimitiveKind::U8)
            .constant("Red", 1)
            .constant("Blue", 4)
            .finish()
            .unwrap();
        registry
            .declare_object("Widget")
            .member("id", TypeRef::I32)
            .member("name", TypeRef::STRING)
            .member("color", TypeRef::named("Color"))
            .read_only("checksum", TypeRef::U64)
            .finish()
            .unwrap();
        registry
    }

    #[test]
    fn test_describe_object_with_defaults() {
        let registry = registry();
        let shape = registry.describe(&TypeRef::named("Widget")).unwrap();
        assert!(shape.is_object());
        assert_eq!(shape.members().len(), 4);
        assert_eq!(shape.member("id").unwrap().default, Value::I32(0));
        assert_eq!(shape.member("name").unwrap().default, Value::Null);
        assert_eq!(
            shape.member("color").unwrap().default,
            Value::Enum(EnumValue::new(TypeRef::named("Color"), 1))
        );
        assert!(!shape.member("checksum").unwrap().writable);
    }

    #[test]
    fn test_describe_is_cached() {
        let registry = registry();
        let first = registry.describe(&TypeRef::named("Widget")).unwrap();
        let second = registry.describe(&TypeRef::named("Widget")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_structural_types_need_no_declaration() {
        let registry = ShapeRegistry::new();
        let list = registry.describe(&TypeRef::list(TypeRef::I32)).unwrap();
        assert!(list.is_enumerable());
        assert_eq!(
            list.kind().elements(),
            Some(&ElementTypes::Single(TypeRef::I32))
        );
        let dict = registry
            .describe(&TypeRef::dictionary(TypeRef::STRING, TypeRef::F64))
            .unwrap();
        assert!(matches!(
            dict.kind(),
            ShapeKind::Enumerable { collection: CollectionKind::Dictionary, .. }
        ));
    }

    #[test]
    fn test_nullable_only_wraps_value_types() {
        let registry = registry();
        let nullable_enum = registry
            .describe(&TypeRef::nullable(TypeRef::named("Color")))
            .unwrap();
        assert!(nullable_enum.is_nullable());
        assert!(matches!(nullable_enum.kind(), ShapeKind::Enum(_)));

        let err = registry
            .describe(&TypeRef::nullable(TypeRef::named("Widget")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Build);
    }

    #[test]
    fn test_unknown_type_is_build_error() {
        let err = ShapeRegistry::new()
            .describe(&TypeRef::named("Missing"))
            .unwrap_err();
        assert!(err.to_string().contains("unknown type 'Missing'"));
    }

    #[test]
    fn test_redeclare_after_describe_fails() {
        let registry = registry();
        registry.describe(&TypeRef::named("Widget")).unwrap();
        let err = registry.declare_object("Widget").finish().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_enum_requires_integral_underlying() {
        let err = ShapeRegistry::new()
            .declare_enum("Bad", PrimitiveKind::F64)
            .finish()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let err = ShapeRegistry::new()
            .declare_object("Dup")
            .member("a", TypeRef::I32)
            .member("a", TypeRef::I64)
            .finish()
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }
}
