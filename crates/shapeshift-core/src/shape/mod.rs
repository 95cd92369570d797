//! Shape descriptors: the structural classification of a type
//!
//! Every type the engine maps is described by exactly one [`ShapeKind`]:
//! Primitive, Enum, Enumerable or Object, checked in that order. Shapes are
//! supplied by a [`ShapeCatalog`]; [`ShapeRegistry`] is the default catalog.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod registry;

pub use registry::{EnumDeclaration, ObjectDeclaration, ShapeRegistry};

use crate::error::Result;
use crate::types::{CollectionKind, PrimitiveKind, TypeRef};
use crate::value::{EnumValue, ObjectRef, Value};
use std::sync::Arc;

/// Source of shape descriptors
///
/// Implementations must describe a type the same way every time; the engine
/// caches what it builds from a description for the life of the process.
pub trait ShapeCatalog: Send + Sync {
    fn describe(&self, ty: &TypeRef) -> Result<Arc<Shape>>;
}

/// A declared member of an object shape
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub ty: TypeRef,
    pub readable: bool,
    pub writable: bool,
    /// Value the member holds right after construction
    pub default: Value,
}

impl MemberInfo {
    /// A readable and writable member defaulting to `Null`
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            readable: true,
            writable: true,
            default: Value::Null,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}

/// Enum shape details
#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    /// The named enum type (never a nullable wrapper)
    pub ty: TypeRef,
    /// Integral representation of the discriminants
    pub underlying: PrimitiveKind,
    /// Declared constants in declaration order
    pub constants: Vec<(String, i64)>,
}

impl EnumShape {
    pub fn name_of(&self, raw: i64) -> Option<&str> {
        self.constants
            .iter()
            .find(|(_, value)| *value == raw)
            .map(|(name, _)| name.as_str())
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.constants
            .iter()
            .find(|(constant, _)| constant == name)
            .map(|(_, value)| *value)
    }

    /// Discriminant of a freshly constructed field
    pub fn default_raw(&self) -> i64 {
        self.constants.first().map_or(0, |(_, value)| *value)
    }
}

/// Element types of an enumerable shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementTypes {
    Single(TypeRef),
    KeyValue(TypeRef, TypeRef),
}

/// Structural classification of a type
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Primitive(PrimitiveKind),
    Enum(EnumShape),
    Enumerable {
        collection: CollectionKind,
        elements: ElementTypes,
    },
    Object,
}

impl ShapeKind {
    /// Primitive and enum shapes convert value-wise
    pub fn is_value_like(&self) -> bool {
        matches!(self, ShapeKind::Primitive(_) | ShapeKind::Enum(_))
    }

    /// Element types of an enumerable shape
    pub fn elements(&self) -> Option<&ElementTypes> {
        match self {
            ShapeKind::Enumerable { elements, .. } => Some(elements),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Primitive(_) => "primitive",
            ShapeKind::Enum(_) => "enum",
            ShapeKind::Enumerable { .. } => "enumerable",
            ShapeKind::Object => "object",
        }
    }
}

/// Descriptor of one type
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    ty: TypeRef,
    kind: ShapeKind,
    nullable: bool,
    members: Vec<MemberInfo>,
    has_default_constructor: bool,
}

impl Shape {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self {
            ty: TypeRef::Primitive(kind),
            kind: ShapeKind::Primitive(kind),
            nullable: false,
            members: Vec::new(),
            has_default_constructor: true,
        }
    }

    pub fn enumeration(enum_shape: EnumShape) -> Self {
        Self {
            ty: enum_shape.ty.clone(),
            kind: ShapeKind::Enum(enum_shape),
            nullable: false,
            members: Vec::new(),
            has_default_constructor: true,
        }
    }

    /// Nullable wrapper over a primitive or enum shape
    pub fn nullable(inner: &Shape) -> Self {
        Self {
            ty: TypeRef::nullable(inner.ty.clone()),
            kind: inner.kind.clone(),
            nullable: true,
            members: Vec::new(),
            has_default_constructor: true,
        }
    }

    pub fn enumerable(ty: TypeRef, collection: CollectionKind, elements: ElementTypes) -> Self {
        Self {
            ty,
            kind: ShapeKind::Enumerable {
                collection,
                elements,
            },
            nullable: false,
            members: Vec::new(),
            has_default_constructor: true,
        }
    }

    pub fn object(ty: TypeRef, members: Vec<MemberInfo>, has_default_constructor: bool) -> Self {
        Self {
            ty,
            kind: ShapeKind::Object,
            nullable: false,
            members,
            has_default_constructor,
        }
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn has_default_constructor(&self) -> bool {
        self.has_default_constructor
    }

    pub fn is_value_like(&self) -> bool {
        self.kind.is_value_like()
    }

    pub fn is_enumerable(&self) -> bool {
        matches!(self.kind, ShapeKind::Enumerable { .. })
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ShapeKind::Object)
    }

    /// Whether a `Null` may be stored where this shape is expected
    pub fn accepts_null(&self) -> bool {
        self.nullable
            || !self.is_value_like()
            || matches!(self.kind, ShapeKind::Primitive(PrimitiveKind::String))
    }

    /// The value a freshly constructed field of this shape holds
    pub fn default_value(&self) -> Value {
        if self.nullable {
            return Value::Null;
        }
        match &self.kind {
            ShapeKind::Primitive(kind) => Value::zero(*kind),
            ShapeKind::Enum(enum_shape) => {
                Value::Enum(EnumValue::new(enum_shape.ty.clone(), enum_shape.default_raw()))
            }
            ShapeKind::Enumerable { .. } | ShapeKind::Object => Value::Null,
        }
    }

    /// Run the zero-argument constructor
    ///
    /// Returns `None` for non-object shapes and for objects without a
    /// default constructor.
    pub fn instantiate(&self) -> Option<ObjectRef> {
        if !self.is_object() || !self.has_default_constructor {
            return None;
        }
        Some(ObjectRef::with_fields(
            self.ty.clone(),
            self.members
                .iter()
                .map(|member| (member.name.clone(), member.default.clone())),
        ))
    }
}
