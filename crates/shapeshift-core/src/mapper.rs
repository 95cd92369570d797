//! Mapper facade
//!
//! [`Mapper`] is the entry point: it owns the shape catalog, the conversion
//! rules, the mapping plans and the compiled mapper cache, and exposes the
//! mapping and registration calls.
//!
//! ```
//! use shapeshift_core::{Mapper, ShapeRegistry, TypeRef, Value, ObjectRef};
//! use std::sync::Arc;
//!
//! let shapes = Arc::new(ShapeRegistry::new());
//! let person = shapes
//!     .declare_object("Person")
//!     .member("name", TypeRef::STRING)
//!     .member("age", TypeRef::I32)
//!     .finish()?;
//! let dto = shapes
//!     .declare_object("PersonDto")
//!     .member("name", TypeRef::STRING)
//!     .member("age", TypeRef::STRING)
//!     .finish()?;
//!
//! let mapper = Mapper::new(shapes);
//! let source = ObjectRef::with_fields(person, [("name", Value::from("Ada")), ("age", Value::I32(36))]);
//! let mapped = mapper.map(&Value::Object(source), &dto)?;
//! assert_eq!(mapped.as_object().unwrap().field("age"), Value::from("36"));
//! # Ok::<(), shapeshift_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::cache::{CacheKey, CacheStats, CompiledMapperCache};
use crate::compile::emitter::Emitter;
use crate::compile::{CompiledMapper, Scope, Variant};
use crate::config::MapperConfig;
use crate::convert::ConversionEngine;
use crate::diagnostics::MappingObserver;
use crate::error::{Error, Result};
use crate::plan::{CustomizationSource, MappingDefinition, MappingPlan, PlanCustomizer, PlanRegistry};
use crate::selection::SelectionGraph;
use crate::shape::{Shape, ShapeCatalog};
use crate::types::TypeRef;
use crate::value::{ObjectRef, Value};
use std::fmt;
use std::sync::Arc;

/// Shared engine state
pub(crate) struct MapperInner {
    pub config: MapperConfig,
    pub catalog: Arc<dyn ShapeCatalog>,
    pub conversions: ConversionEngine,
    pub plans: PlanRegistry,
    pub cache: CompiledMapperCache,
    pub discovery: Option<Arc<dyn CustomizationSource>>,
}

impl MapperInner {
    pub fn describe(&self, ty: &TypeRef) -> Result<Arc<Shape>> {
        self.catalog.describe(ty)
    }

    /// Apply discovered definitions for a pair, once
    fn discover(&self, source: &Arc<Shape>, target: &Arc<Shape>) -> Result<()> {
        let pair = (source.ty().clone(), target.ty().clone());
        if !self.plans.mark_discovered(&pair) {
            return Ok(());
        }
        let Some(discovery) = &self.discovery else {
            return Ok(());
        };
        let definitions = discovery.definitions_for(source.ty(), target.ty());
        if definitions.is_empty() {
            return Ok(());
        }
        log::debug!(
            "applying {} discovered definition(s) for {} -> {}",
            definitions.len(),
            pair.0,
            pair.1
        );
        let mut customizer = PlanCustomizer::new(&self.plans, source.clone(), target.clone())?;
        for definition in definitions {
            if definition.source_type() != pair.0 || definition.target_type() != pair.1 {
                log::warn!(
                    "discovery returned a definition for {} -> {} while resolving {} -> {}, ignoring it",
                    definition.source_type(),
                    definition.target_type(),
                    pair.0,
                    pair.1
                );
                continue;
            }
            definition.configure(&mut customizer)?;
        }
        Ok(())
    }

    /// Sealed plan for a pair, running discovery first
    pub fn plan_for(&self, source: &Arc<Shape>, target: &Arc<Shape>) -> Result<Arc<MappingPlan>> {
        self.discover(source, target)?;
        Ok(self.plans.seal(source, target))
    }

    /// Cached compiled mapper for a key, building it if needed
    pub fn compiled(&self, key: &CacheKey) -> Result<Arc<CompiledMapper>> {
        self.cache.get_or_build(key, || {
            let span = tracing::debug_span!(
                "build_mapper",
                source = %key.source,
                target = %key.target,
                scoped = key.graph.is_some()
            );
            let _entered = span.enter();
            log::debug!("building compiled mapper {} -> {} ({:?})", key.source, key.target, key.variant);
            Emitter::new(self, key.variant).compile(key)
        })
    }
}

/// The object-graph mapping engine
///
/// Cheap to clone; clones share plans, converters and compiled mappers.
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

impl Mapper {
    /// Mapper over a shape catalog with the default configuration
    pub fn new(catalog: Arc<dyn ShapeCatalog>) -> Self {
        Self::builder(catalog).build_unchecked()
    }

    pub fn builder(catalog: Arc<dyn ShapeCatalog>) -> MapperBuilder {
        MapperBuilder::new(catalog)
    }

    pub fn config(&self) -> &MapperConfig {
        &self.inner.config
    }

    pub fn catalog(&self) -> &Arc<dyn ShapeCatalog> {
        &self.inner.catalog
    }

    /// Map to a new `target` value, inferring the source type from the value
    ///
    /// Collections carry no element type; use [`Mapper::map_typed`] for them.
    pub fn map(&self, source: &Value, target: &TypeRef) -> Result<Value> {
        if source.is_null() {
            return Ok(self.inner.describe(target)?.default_value());
        }
        let source_type = source.type_ref().ok_or_else(|| {
            Error::setup(
                "cannot infer the element type of a collection, use map_typed",
                &TypeRef::named("?"),
                target,
            )
        })?;
        self.map_typed(source, &source_type, target, None)
    }

    /// Map to a new `target` value, optionally restricted to a selection graph
    pub fn map_typed(
        &self,
        source: &Value,
        source_type: &TypeRef,
        target: &TypeRef,
        graph: Option<&SelectionGraph>,
    ) -> Result<Value> {
        self.execute(source, source_type, target, None, graph, None)
    }

    /// Map into an existing target object
    pub fn map_into(
        &self,
        source: &Value,
        source_type: &TypeRef,
        target: &ObjectRef,
        graph: Option<&SelectionGraph>,
    ) -> Result<()> {
        let target_type = target.type_ref().clone();
        self.execute(
            source,
            source_type,
            &target_type,
            Some(Value::Object(target.clone())),
            graph,
            None,
        )?;
        Ok(())
    }

    /// Deep copy of a value of type `ty`
    pub fn copy(&self, source: &Value, ty: &TypeRef, graph: Option<&SelectionGraph>) -> Result<Value> {
        self.map_typed(source, ty, ty, graph)
    }

    /// [`Mapper::map_typed`] reporting assignments and allocations to `observer`
    pub fn map_observed(
        &self,
        source: &Value,
        source_type: &TypeRef,
        target: &TypeRef,
        graph: Option<&SelectionGraph>,
        observer: &dyn MappingObserver,
    ) -> Result<Value> {
        self.execute(source, source_type, target, None, graph, Some(observer))
    }

    /// [`Mapper::map_into`] reporting assignments and allocations to `observer`
    pub fn map_into_observed(
        &self,
        source: &Value,
        source_type: &TypeRef,
        target: &ObjectRef,
        graph: Option<&SelectionGraph>,
        observer: &dyn MappingObserver,
    ) -> Result<()> {
        let target_type = target.type_ref().clone();
        self.execute(
            source,
            source_type,
            &target_type,
            Some(Value::Object(target.clone())),
            graph,
            Some(observer),
        )?;
        Ok(())
    }

    fn execute(
        &self,
        source: &Value,
        source_type: &TypeRef,
        target_type: &TypeRef,
        existing: Option<Value>,
        graph: Option<&SelectionGraph>,
        observer: Option<&dyn MappingObserver>,
    ) -> Result<Value> {
        if let Some(actual) = source.type_ref() {
            if actual != *source_type.underlying() {
                return Err(Error::mismatch(source_type, actual.to_string()));
            }
        }
        let variant = if observer.is_some() {
            Variant::Diagnostics
        } else {
            Variant::Standard
        };
        let key = CacheKey::new(source_type.clone(), target_type.clone(), graph.cloned(), variant);
        let compiled = self.inner.compiled(&key)?;

        let fallback = existing.clone();
        let mut scope = Scope::new(&self.inner, observer);
        match compiled.run(source, existing, &mut scope)? {
            Some(mapped) => Ok(mapped),
            None => match fallback {
                Some(existing) => Ok(existing),
                None => Ok(self.inner.describe(target_type)?.default_value()),
            },
        }
    }

    /// Build the compiled mapper for a pair ahead of the first call
    pub fn precompile(&self, source: &TypeRef, target: &TypeRef, graph: Option<&SelectionGraph>) -> Result<()> {
        let key = CacheKey::new(source.clone(), target.clone(), graph.cloned(), Variant::Standard);
        self.inner.compiled(&key)?;
        Ok(())
    }

    /// Install plan overrides for the definition's type pair
    ///
    /// Must run before the pair's first compiled mapper is built.
    pub fn register_custom_mapping<D>(&self, definition: &D) -> Result<()>
    where
        D: MappingDefinition + ?Sized,
    {
        let source = self.inner.describe(&definition.source_type())?;
        let target = self.inner.describe(&definition.target_type())?;
        let mut customizer = PlanCustomizer::new(&self.inner.plans, source.clone(), target.clone())?;
        self.inner.discover(&source, &target)?;
        definition.configure(&mut customizer)
    }

    fn ensure_customizable(&self, source: &TypeRef, target: &TypeRef) -> Result<()> {
        let source_shape = self.inner.describe(source)?;
        let target_shape = self.inner.describe(target)?;
        PlanCustomizer::new(&self.inner.plans, source_shape, target_shape)?;
        Ok(())
    }

    /// Remove the override for one target member of a pair
    ///
    /// Only the forward plan is touched; a two-way mirror stays in place until
    /// [`Mapper::unregister_two_way_mapping`] removes both sides.
    pub fn unregister_custom_mapping(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        target_member: &str,
    ) -> Result<bool> {
        self.ensure_customizable(source, target)?;
        self.inner
            .plans
            .unregister(&(source.clone(), target.clone()), target_member)
    }

    /// Remove a two-way override and its mirror on the reverse plan
    ///
    /// Fails without touching either plan if one of them is already compiled.
    pub fn unregister_two_way_mapping(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        target_member: &str,
        source_member: &str,
    ) -> Result<bool> {
        self.ensure_customizable(source, target)?;
        self.inner.plans.unregister_pair(
            &(source.clone(), target.clone()),
            target_member,
            &(target.clone(), source.clone()),
            source_member,
        )
    }

    /// Remove a reverse override registered through a definition for `source -> target`
    pub fn unregister_reverse_mapping(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        source_member: &str,
    ) -> Result<bool> {
        self.ensure_customizable(source, target)?;
        self.inner
            .plans
            .unregister(&(target.clone(), source.clone()), source_member)
    }

    /// Install a custom conversion for a type pair
    pub fn register_converter<F>(&self, source: TypeRef, target: TypeRef, convert: F) -> Result<()>
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.inner.conversions.register(source, target, Arc::new(convert))
    }

    pub fn unregister_converter(&self, source: &TypeRef, target: &TypeRef) -> Result<bool> {
        self.inner.conversions.unregister(source, target)
    }

    /// The plan for a pair as it stands, without sealing it
    pub fn plan(&self, source: &TypeRef, target: &TypeRef) -> Result<Arc<MappingPlan>> {
        let source = self.inner.describe(source)?;
        let target = self.inner.describe(target)?;
        Ok(self.inner.plans.current(&source, &target))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache.stats())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Mapper`]
pub struct MapperBuilder {
    catalog: Arc<dyn ShapeCatalog>,
    config: MapperConfig,
    discovery: Option<Arc<dyn CustomizationSource>>,
}

impl MapperBuilder {
    pub fn new(catalog: Arc<dyn ShapeCatalog>) -> Self {
        Self {
            catalog,
            config: MapperConfig::default(),
            discovery: None,
        }
    }

    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_inline_depth(mut self, depth: usize) -> Self {
        self.config.max_inline_depth = depth;
        self
    }

    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.config.diagnostics = enabled;
        self
    }

    /// Source of mapping definitions consulted at first use of each pair
    pub fn discovery(mut self, source: Arc<dyn CustomizationSource>) -> Self {
        self.discovery = Some(source);
        self
    }

    /// Validate the configuration and build the mapper
    pub fn build(self) -> Result<Mapper> {
        self.config.validate()?;
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> Mapper {
        Mapper {
            inner: Arc::new(MapperInner {
                config: self.config,
                catalog: self.catalog,
                conversions: ConversionEngine::new(),
                plans: PlanRegistry::new(),
                cache: CompiledMapperCache::new(),
                discovery: self.discovery,
            }),
        }
    }
}
