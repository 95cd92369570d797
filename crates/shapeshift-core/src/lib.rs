//! Shapeshift Core - Object-graph mapping engine
//!
//! This crate maps values of one type onto values of another, member by
//! member, converting primitives and enums and reshaping collections on the
//! way. Mapping procedures are compiled once per type pair from shape
//! descriptors and cached for the life of the engine.
//!
//! # Main Components
//!
//! - **Shapes**: [`ShapeCatalog`] describes types structurally; [`ShapeRegistry`] is the default catalog
//! - **Values**: [`Value`], shared [`ObjectRef`] handles and [`Collection`]s
//! - **Plans**: default name-matched member correspondence plus overrides via [`PlanCustomizer`]
//! - **Conversions**: built-in primitive, enum and string rules plus custom converters
//! - **Compiled mappers**: depth-bounded closure trees cached per type pair and selection graph
//! - **Diagnostics**: [`MappingObserver`] callbacks and the [`AuditTrail`] recorder
//!
//! # Example
//!
//! ```
//! use shapeshift_core::{Mapper, ObjectRef, ShapeRegistry, TypeRef, Value};
//! use std::sync::Arc;
//!
//! let shapes = Arc::new(ShapeRegistry::new());
//! let user = shapes
//!     .declare_object("User")
//!     .member("id", TypeRef::I64)
//!     .member("email", TypeRef::STRING)
//!     .finish()?;
//!
//! let mapper = Mapper::new(shapes);
//! let original = ObjectRef::with_fields(user.clone(), [("id", Value::I64(7)), ("email", Value::from("a@b.c"))]);
//! let copy = mapper.copy(&Value::Object(original.clone()), &user, None)?;
//!
//! let copy = copy.as_object().unwrap();
//! assert!(!copy.ptr_eq(&original));
//! assert_eq!(copy.field("email"), Value::from("a@b.c"));
//! # Ok::<(), shapeshift_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod compile;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod mapper;
pub mod plan;
pub mod selection;
pub mod shape;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, ErrorKind, Result};
pub use types::{CollectionKind, PrimitiveKind, TypeRef};
pub use value::{Collection, EnumValue, ObjectRef, Value};

pub use shape::{ElementTypes, EnumShape, MemberInfo, Shape, ShapeCatalog, ShapeKind, ShapeRegistry};
pub use selection::{SelectionGraph, SelectionGraphBuilder};

pub use plan::{
    CustomMapping, CustomizationSource, MappingDefinition, MappingPlan, MemberMapEntry,
    PlanCustomizer, SourceAccessor, StaticCustomizations,
};

pub use cache::{CacheKey, CacheStats};
pub use compile::{CompiledMapper, Variant};
pub use config::{MapperConfig, RecursionScope, DEFAULT_MAX_INLINE_DEPTH};
pub use diagnostics::{AuditTrail, DiagnosticEvent, LogObserver, MappingObserver};
pub use mapper::{Mapper, MapperBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = MapperConfig::default();
        assert_eq!(config.max_inline_depth, DEFAULT_MAX_INLINE_DEPTH);
        assert_eq!(config.recursion_scope, RecursionScope::Call);
        assert!(!config.diagnostics);
    }
}
