//! Live values flowing through compiled mappers
//!
//! Objects are shared, interior-mutable handles compared by identity so that
//! cyclic and diamond-shaped graphs can be represented and mapped. Primitive
//! values, enum constants and collections are plain data.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::types::{CollectionKind, PrimitiveKind, TypeRef};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Enum(EnumValue),
    Object(ObjectRef),
    Collection(Collection),
}

impl Value {
    /// The value a freshly constructed field of `kind` holds
    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::I16 => Value::I16(0),
            PrimitiveKind::I32 => Value::I32(0),
            PrimitiveKind::I64 => Value::I64(0),
            PrimitiveKind::U8 => Value::U8(0),
            PrimitiveKind::U16 => Value::U16(0),
            PrimitiveKind::U32 => Value::U32(0),
            PrimitiveKind::U64 => Value::U64(0),
            PrimitiveKind::F32 => Value::F32(0.0),
            PrimitiveKind::F64 => Value::F64(0.0),
            PrimitiveKind::String => Value::Null,
            PrimitiveKind::DateTime => Value::DateTime(DateTime::<Utc>::default()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive kind of this value, if it is a primitive
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Char(_) => PrimitiveKind::Char,
            Value::I8(_) => PrimitiveKind::I8,
            Value::I16(_) => PrimitiveKind::I16,
            Value::I32(_) => PrimitiveKind::I32,
            Value::I64(_) => PrimitiveKind::I64,
            Value::U8(_) => PrimitiveKind::U8,
            Value::U16(_) => PrimitiveKind::U16,
            Value::U32(_) => PrimitiveKind::U32,
            Value::U64(_) => PrimitiveKind::U64,
            Value::F32(_) => PrimitiveKind::F32,
            Value::F64(_) => PrimitiveKind::F64,
            Value::String(_) => PrimitiveKind::String,
            Value::DateTime(_) => PrimitiveKind::DateTime,
            _ => return None,
        })
    }

    /// Runtime type of this value
    ///
    /// Collections and `Null` carry no element type information and return
    /// `None`.
    pub fn type_ref(&self) -> Option<TypeRef> {
        match self {
            Value::Enum(value) => Some(value.ty.clone()),
            Value::Object(object) => Some(object.type_ref().clone()),
            Value::Null | Value::Collection(_) => None,
            other => other.primitive_kind().map(TypeRef::Primitive),
        }
    }

    /// Short name of the value's variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Enum(_) => "enum",
            Value::Object(_) => "object",
            Value::Collection(_) => "collection",
            other => other.primitive_kind().map(PrimitiveKind::name).unwrap_or("unknown"),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral values widened to `i64`; `u64` values above `i64::MAX` yield `None`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U8(v) => Some(i64::from(*v)),
            Value::U16(v) => Some(i64::from(*v)),
            Value::U32(v) => Some(i64::from(*v)),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v:?}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::DateTime(v) => f.write_str(&v.to_rfc3339()),
            Value::Enum(v) => write!(f, "{}::{}", v.ty, v.raw),
            Value::Object(v) => write!(f, "{} {{..}}", v.type_ref()),
            Value::Collection(v) => write!(f, "{}[{}]", v.kind(), v.len()),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    DateTime<Utc> => DateTime,
    EnumValue => Enum,
    ObjectRef => Object,
    Collection => Collection,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A constant of a named enum type, stored as its discriminant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ty: TypeRef,
    pub raw: i64,
}

impl EnumValue {
    pub fn new(ty: TypeRef, raw: i64) -> Self {
        Self { ty, raw }
    }
}

struct ObjectInner {
    ty: TypeRef,
    fields: RwLock<BTreeMap<String, Value>>,
}

/// Shared handle to a mutable object
///
/// Equality and hashing are by identity. No lock is held across calls, so a
/// handle may be read and written through aliases without deadlocking.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectInner>);

impl ObjectRef {
    /// Create an object with no fields set
    pub fn new(ty: TypeRef) -> Self {
        Self::with_fields(ty, std::iter::empty::<(String, Value)>())
    }

    /// Create an object with the given field values
    pub fn with_fields<I, K>(ty: TypeRef, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        ObjectRef(Arc::new(ObjectInner {
            ty,
            fields: RwLock::new(fields),
        }))
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.0.ty
    }

    /// Identity of this object for the lifetime of the handle
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Clone of a field's value, if the field exists
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.fields.read().get(name).cloned()
    }

    /// Clone of a field's value, `Null` when absent
    pub fn field(&self, name: &str) -> Value {
        self.get(name).unwrap_or(Value::Null)
    }

    /// Set a field, returning the previous value
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.fields.write().insert(name.into(), value.into())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.read().keys().cloned().collect()
    }

    /// Snapshot of every field
    pub fn fields(&self) -> BTreeMap<String, Value> {
        self.0.fields.read().clone()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("ty", &self.0.ty)
            .field("id", &format_args!("{:#x}", self.id()))
            .finish()
    }
}

/// Element storage for each collection kind
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Bag(Vec<Value>),
    Sequence(Vec<Value>),
    Dictionary(Vec<(Value, Value)>),
}

impl Collection {
    pub fn empty(kind: CollectionKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: CollectionKind, capacity: usize) -> Self {
        match kind {
            CollectionKind::Array => Collection::Array(Vec::with_capacity(capacity)),
            CollectionKind::List => Collection::List(Vec::with_capacity(capacity)),
            CollectionKind::Set => Collection::Set(Vec::with_capacity(capacity)),
            CollectionKind::Bag => Collection::Bag(Vec::with_capacity(capacity)),
            CollectionKind::Sequence => Collection::Sequence(Vec::with_capacity(capacity)),
            CollectionKind::Dictionary => Collection::Dictionary(Vec::with_capacity(capacity)),
        }
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Collection::Array(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Collection::List(items.into_iter().collect())
    }

    /// Build a set, collapsing equal elements
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut set = Collection::Set(Vec::new());
        for item in items {
            set.insert_element(item);
        }
        set
    }

    pub fn bag(items: impl IntoIterator<Item = Value>) -> Self {
        Collection::Bag(items.into_iter().collect())
    }

    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Collection::Sequence(items.into_iter().collect())
    }

    /// Build a dictionary; a later equal key replaces the earlier entry
    pub fn dictionary(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut dictionary = Collection::Dictionary(Vec::new());
        for (key, value) in entries {
            dictionary.insert_pair(key, value);
        }
        dictionary
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Collection::Array(_) => CollectionKind::Array,
            Collection::List(_) => CollectionKind::List,
            Collection::Set(_) => CollectionKind::Set,
            Collection::Bag(_) => CollectionKind::Bag,
            Collection::Sequence(_) => CollectionKind::Sequence,
            Collection::Dictionary(_) => CollectionKind::Dictionary,
        }
    }

    /// Element count for count-capable collections; `None` for sequences
    pub fn count(&self) -> Option<usize> {
        match self {
            Collection::Sequence(_) => None,
            other => Some(other.len()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Array(items)
            | Collection::List(items)
            | Collection::Set(items)
            | Collection::Bag(items)
            | Collection::Sequence(items) => items.len(),
            Collection::Dictionary(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements of a non-dictionary collection
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Collection::Array(items)
            | Collection::List(items)
            | Collection::Set(items)
            | Collection::Bag(items)
            | Collection::Sequence(items) => Some(items),
            Collection::Dictionary(_) => None,
        }
    }

    /// Entries of a dictionary
    pub fn entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Collection::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary value by key
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        self.entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.elements().is_some_and(|items| items.contains(value))
    }

    /// Append an element; fails for dictionaries
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.insert_element(value) {
            Ok(())
        } else {
            Err(Error::mismatch("single-element collection", "Dictionary"))
        }
    }

    /// Insert a key/value pair; fails for non-dictionaries
    pub fn insert(&mut self, key: Value, value: Value) -> Result<()> {
        if self.insert_pair(key, value) {
            Ok(())
        } else {
            Err(Error::mismatch("Dictionary", self.kind().name()))
        }
    }

    pub fn clear(&mut self) {
        match self {
            Collection::Array(items)
            | Collection::List(items)
            | Collection::Set(items)
            | Collection::Bag(items)
            | Collection::Sequence(items) => items.clear(),
            Collection::Dictionary(entries) => entries.clear(),
        }
    }

    fn insert_element(&mut self, value: Value) -> bool {
        match self {
            Collection::Set(items) => {
                if !items.contains(&value) {
                    items.push(value);
                }
                true
            }
            Collection::Array(items)
            | Collection::List(items)
            | Collection::Bag(items)
            | Collection::Sequence(items) => {
                items.push(value);
                true
            }
            Collection::Dictionary(_) => false,
        }
    }

    fn insert_pair(&mut self, key: Value, value: Value) -> bool {
        match self {
            Collection::Dictionary(entries) => {
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((key, value)),
                }
                true
            }
            _ => false,
        }
    }
}
