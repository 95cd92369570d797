//! Compiled mappers
//!
//! A compiled mapper is a tree of closures ([`Step`]s) built once per cache
//! key from shapes, the sealed mapping plans and the conversion rules. Each
//! step maps one source value to an optional target value; `None` means
//! "skip, leave the target as it is".
//!
//! # Module Organization
//!
//! - [`emitter`] - Shape-driven construction of steps and depth-bounded inlining
//! - [`object`] - Object branch with recursion guard handling
//! - [`collection`] - Enumerable branch for every pair of collection kinds
//! - [`guard`] - Per-call identity map for cyclic graphs
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

pub mod collection;
pub mod emitter;
pub mod guard;
pub mod object;

pub use guard::RecursionGuard;

use crate::diagnostics::MappingObserver;
use crate::error::{Error, Result};
use crate::mapper::MapperInner;
use crate::selection::SelectionGraph;
use crate::types::TypeRef;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One compiled mapping procedure
///
/// Receives the source value and the value currently held by the target
/// location, and returns the value to store there, or `None` to leave the
/// location untouched.
pub(crate) type Step =
    Arc<dyn Fn(&Value, Option<Value>, &mut Scope<'_>) -> Result<Option<Value>> + Send + Sync>;

pub(crate) fn step<F>(f: F) -> Step
where
    F: Fn(&Value, Option<Value>, &mut Scope<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Per-call execution state
pub(crate) struct Scope<'a> {
    pub engine: &'a MapperInner,
    pub guard: RecursionGuard,
    pub observer: Option<&'a dyn MappingObserver>,
}

impl<'a> Scope<'a> {
    pub fn new(engine: &'a MapperInner, observer: Option<&'a dyn MappingObserver>) -> Self {
        Self {
            engine,
            guard: RecursionGuard::new(engine.config.recursion_scope),
            observer,
        }
    }
}

/// Which code path a compiled mapper was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Standard,
    /// Reports assignments and allocations to the call's observer
    Diagnostics,
}

/// Static expression labels for a position in the compiled tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Labels {
    pub source: Arc<str>,
    pub target: Arc<str>,
}

impl Labels {
    pub fn root(source: &TypeRef, target: &TypeRef) -> Self {
        Self {
            source: source.to_string().into(),
            target: target.to_string().into(),
        }
    }

    pub fn member(&self, source_expression: &str, target_member: &str) -> Self {
        Self {
            source: format!("{}.{}", self.source, source_expression).into(),
            target: format!("{}.{}", self.target, target_member).into(),
        }
    }

    fn suffixed(&self, suffix: &str) -> Self {
        Self {
            source: format!("{}{suffix}", self.source).into(),
            target: format!("{}{suffix}", self.target).into(),
        }
    }

    pub fn element(&self) -> Self {
        self.suffixed("[]")
    }

    pub fn key(&self) -> Self {
        self.suffixed("[key]")
    }

    pub fn value(&self) -> Self {
        self.suffixed("[value]")
    }

    /// Wrap a failure with these labels and the types involved
    pub fn wrap(&self, error: Error, source: &TypeRef, target: &TypeRef) -> Error {
        Error::Runtime {
            source_label: self.source.to_string(),
            target_label: self.target.to_string(),
            source_type: source.to_string(),
            target_type: target.to_string(),
            source: Box::new(error),
        }
    }
}

/// Executable mapper for one cache key
pub struct CompiledMapper {
    source: TypeRef,
    target: TypeRef,
    graph: Option<SelectionGraph>,
    variant: Variant,
    step: Step,
}

impl CompiledMapper {
    pub(crate) fn new(
        source: TypeRef,
        target: TypeRef,
        graph: Option<SelectionGraph>,
        variant: Variant,
        step: Step,
    ) -> Self {
        Self {
            source,
            target,
            graph,
            variant,
            step,
        }
    }

    pub fn source_type(&self) -> &TypeRef {
        &self.source
    }

    pub fn target_type(&self) -> &TypeRef {
        &self.target
    }

    pub fn graph(&self) -> Option<&SelectionGraph> {
        self.graph.as_ref()
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub(crate) fn run(
        &self,
        source: &Value,
        existing: Option<Value>,
        scope: &mut Scope<'_>,
    ) -> Result<Option<Value>> {
        (self.step)(source, existing, scope)
    }
}

impl fmt::Debug for CompiledMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMapper")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("scoped", &self.graph.is_some())
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}
