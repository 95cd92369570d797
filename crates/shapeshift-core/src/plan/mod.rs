//! Mapping plans: which target member is populated from what
//!
//! A plan belongs to one (source type, target type) pair. It starts out as
//! the default name-matched correspondence and is refined by overrides until
//! the first compiled mapper for the pair consumes it; from then on it is
//! sealed and further registration is a setup error.
//!
//! # Module Organization
//!
//! - [`builder`] - Default correspondence and override merging
//! - [`registry`] - Per-pair override storage and the sealing lifecycle
//! - [`customizer`] - Registration API handed to mapping definitions
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod customizer;
pub mod registry;

pub use customizer::{CustomMapping, CustomizationSource, MappingDefinition, PlanCustomizer, StaticCustomizations};
pub use registry::PlanRegistry;

use crate::types::TypeRef;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Closure computing a member value from the whole source value
pub type ValueFn = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// How the value for a target member is read from the source
#[derive(Clone)]
pub enum SourceAccessor {
    /// Read a member of the source object
    Member(String),
    /// Compute from the whole source object
    Computed { label: String, compute: ValueFn },
}

impl SourceAccessor {
    /// Expression label used in diagnostics
    pub fn label(&self) -> &str {
        match self {
            SourceAccessor::Member(name) => name,
            SourceAccessor::Computed { label, .. } => label,
        }
    }
}

impl fmt::Debug for SourceAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceAccessor::Member(name) => f.debug_tuple("Member").field(name).finish(),
            SourceAccessor::Computed { label, .. } => {
                f.debug_struct("Computed").field("label", label).finish_non_exhaustive()
            }
        }
    }
}

/// One target member and the accessor pair that populates it
#[derive(Debug, Clone)]
pub struct MemberMapEntry {
    pub target_member: String,
    pub source: SourceAccessor,
    /// Value type produced by the source accessor
    pub source_type: TypeRef,
    /// Declared type of the target member
    pub target_type: TypeRef,
}

impl MemberMapEntry {
    /// Member-to-member entry
    pub fn member(
        target_member: impl Into<String>,
        source_member: impl Into<String>,
        source_type: TypeRef,
        target_type: TypeRef,
    ) -> Self {
        Self {
            target_member: target_member.into(),
            source: SourceAccessor::Member(source_member.into()),
            source_type,
            target_type,
        }
    }

    /// Entry computed from the whole source value
    pub fn computed(
        target_member: impl Into<String>,
        label: impl Into<String>,
        compute: ValueFn,
        source_type: TypeRef,
        target_type: TypeRef,
    ) -> Self {
        Self {
            target_member: target_member.into(),
            source: SourceAccessor::Computed {
                label: label.into(),
                compute,
            },
            source_type,
            target_type,
        }
    }

    pub fn source_label(&self) -> &str {
        self.source.label()
    }

    /// Whether the entry reads a source member with the target member's name
    pub fn is_name_matched(&self) -> bool {
        matches!(&self.source, SourceAccessor::Member(name) if *name == self.target_member)
    }
}

/// The member correspondence for one type pair
#[derive(Debug, Clone)]
pub struct MappingPlan {
    source: TypeRef,
    target: TypeRef,
    entries: Vec<MemberMapEntry>,
}

impl MappingPlan {
    pub fn empty(source: TypeRef, target: TypeRef) -> Self {
        Self {
            source,
            target,
            entries: Vec::new(),
        }
    }

    pub fn source_type(&self) -> &TypeRef {
        &self.source
    }

    pub fn target_type(&self) -> &TypeRef {
        &self.target
    }

    /// Entries in target member declaration order
    pub fn entries(&self) -> &[MemberMapEntry] {
        &self.entries
    }

    pub fn entry(&self, target_member: &str) -> Option<&MemberMapEntry> {
        self.entries
            .iter()
            .find(|entry| entry.target_member == target_member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, entry: MemberMapEntry) {
        self.entries.push(entry);
    }
}
