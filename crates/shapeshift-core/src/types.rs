//! Type identities used as mapping keys
//!
//! A [`TypeRef`] names a type structurally: primitives, nullable wrappers and
//! collections are spelled out in the reference itself, while enums and
//! objects are referenced by name and resolved through a
//! [`ShapeCatalog`](crate::shape::ShapeCatalog).
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Core value representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    /// UTC timestamp, converts to and from numbers as Unix seconds
    DateTime,
}

impl PrimitiveKind {
    /// Signed and unsigned integer kinds
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8
                | PrimitiveKind::I16
                | PrimitiveKind::I32
                | PrimitiveKind::I64
                | PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
        )
    }

    /// Floating point kinds
    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }

    /// Integer or floating point kinds
    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_float()
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::String => "string",
            PrimitiveKind::DateTime => "datetime",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collection flavours an enumerable shape can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Fixed-length, index-addressable
    Array,
    /// Ordered, growable
    List,
    /// Unordered, equal elements collapse
    Set,
    /// Generic add-capable collection
    Bag,
    /// Plain enumerable without a count
    Sequence,
    /// Key/value pairs, equal keys collapse
    Dictionary,
}

impl CollectionKind {
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::Array => "Array",
            CollectionKind::List => "List",
            CollectionKind::Set => "Set",
            CollectionKind::Bag => "Bag",
            CollectionKind::Sequence => "Sequence",
            CollectionKind::Dictionary => "Dictionary",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural, hashable type identity
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    /// `T?` over a primitive or enum type
    Nullable(Box<TypeRef>),
    /// Enum or object type resolved through the shape catalog
    Named(Arc<str>),
    /// Single-element collection (never [`CollectionKind::Dictionary`])
    Collection(CollectionKind, Box<TypeRef>),
    Dictionary(Box<TypeRef>, Box<TypeRef>),
}

impl TypeRef {
    pub const BOOL: TypeRef = TypeRef::Primitive(PrimitiveKind::Bool);
    pub const CHAR: TypeRef = TypeRef::Primitive(PrimitiveKind::Char);
    pub const I8: TypeRef = TypeRef::Primitive(PrimitiveKind::I8);
    pub const I16: TypeRef = TypeRef::Primitive(PrimitiveKind::I16);
    pub const I32: TypeRef = TypeRef::Primitive(PrimitiveKind::I32);
    pub const I64: TypeRef = TypeRef::Primitive(PrimitiveKind::I64);
    pub const U8: TypeRef = TypeRef::Primitive(PrimitiveKind::U8);
    pub const U16: TypeRef = TypeRef::Primitive(PrimitiveKind::U16);
    pub const U32: TypeRef = TypeRef::Primitive(PrimitiveKind::U32);
    pub const U64: TypeRef = TypeRef::Primitive(PrimitiveKind::U64);
    pub const F32: TypeRef = TypeRef::Primitive(PrimitiveKind::F32);
    pub const F64: TypeRef = TypeRef::Primitive(PrimitiveKind::F64);
    pub const STRING: TypeRef = TypeRef::Primitive(PrimitiveKind::String);
    pub const DATETIME: TypeRef = TypeRef::Primitive(PrimitiveKind::DateTime);

    /// Reference an enum or object type by name
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeRef::Named(Arc::from(name.as_ref()))
    }

    pub fn nullable(inner: TypeRef) -> Self {
        TypeRef::Nullable(Box::new(inner))
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Collection(CollectionKind::Array, Box::new(element))
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::Collection(CollectionKind::List, Box::new(element))
    }

    pub fn set(element: TypeRef) -> Self {
        TypeRef::Collection(CollectionKind::Set, Box::new(element))
    }

    pub fn bag(element: TypeRef) -> Self {
        TypeRef::Collection(CollectionKind::Bag, Box::new(element))
    }

    pub fn sequence(element: TypeRef) -> Self {
        TypeRef::Collection(CollectionKind::Sequence, Box::new(element))
    }

    pub fn dictionary(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Dictionary(Box::new(key), Box::new(value))
    }

    /// The declared name for named types
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    /// Strip a nullable wrapper, if any
    pub fn underlying(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner.underlying(),
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(kind) => write!(f, "{kind}"),
            TypeRef::Nullable(inner) => write!(f, "{inner}?"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Collection(kind, element) => write!(f, "{kind}<{element}>"),
            TypeRef::Dictionary(key, value) => write!(f, "Dictionary<{key}, {value}>"),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({self})")
    }
}

impl From<PrimitiveKind> for TypeRef {
    fn from(kind: PrimitiveKind) -> Self {
        TypeRef::Primitive(kind)
    }
}
