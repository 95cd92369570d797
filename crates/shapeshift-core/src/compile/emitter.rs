//! Shape-driven step construction
//!
//! The emitter walks the source and target shapes together. Primitive and
//! enum pairs become conversion leaves; object and enumerable pairs recurse.
//! Nested object and enumerable branches deeper than the configured inline
//! depth are not expanded in place: a delegate step resolves the compiled
//! mapper for that pair through the cache the first time it runs.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::{collection, object, step, CompiledMapper, Labels, Step, Variant};
use crate::cache::CacheKey;
use crate::convert::Converter;
use crate::error::{Error, Result};
use crate::mapper::MapperInner;
use crate::selection::SelectionGraph;
use crate::shape::Shape;
use crate::types::TypeRef;
use crate::value::Value;
use std::sync::{Arc, OnceLock, Weak};

pub(crate) struct Emitter<'e> {
    engine: &'e MapperInner,
    variant: Variant,
}

impl<'e> Emitter<'e> {
    pub fn new(engine: &'e MapperInner, variant: Variant) -> Self {
        Self { engine, variant }
    }

    pub fn engine(&self) -> &'e MapperInner {
        self.engine
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Build the compiled mapper for a cache key
    pub fn compile(&self, key: &CacheKey) -> Result<CompiledMapper> {
        let labels = Labels::root(&key.source, &key.target);
        let root = self.emit(&key.source, &key.target, key.graph.as_ref(), 0, &labels)?;
        Ok(CompiledMapper::new(
            key.source.clone(),
            key.target.clone(),
            key.graph.clone(),
            key.variant,
            root,
        ))
    }

    /// Step mapping a `source`-typed value to a `target`-typed value
    pub fn emit(
        &self,
        source: &TypeRef,
        target: &TypeRef,
        graph: Option<&SelectionGraph>,
        depth: usize,
        labels: &Labels,
    ) -> Result<Step> {
        let target_shape = self.engine.describe(target)?;
        if let Some(custom) = self.engine.conversions.custom(source, target) {
            return Ok(self.leaf(custom, &target_shape, source, labels));
        }

        let source_shape = self.engine.describe(source)?;
        if source_shape.is_value_like() && target_shape.is_value_like() {
            let convert = self
                .engine
                .conversions
                .converter_for(&source_shape, &target_shape)?;
            return Ok(self.leaf(convert, &target_shape, source, labels));
        }

        let both_objects = source_shape.is_object() && target_shape.is_object();
        let both_enumerable = source_shape.is_enumerable() && target_shape.is_enumerable();
        if !both_objects && !both_enumerable {
            return Err(Error::build(
                format!(
                    "cannot map {} shape to {} shape",
                    source_shape.kind().label(),
                    target_shape.kind().label()
                ),
                source,
                target,
            ));
        }

        if depth > self.engine.config.max_inline_depth {
            return Ok(self.delegate(source, target, graph));
        }
        if both_objects {
            object::emit(self, &source_shape, &target_shape, graph, depth, labels)
        } else {
            collection::emit(self, &source_shape, &target_shape, graph, depth, labels)
        }
    }

    /// Conversion leaf; `Null` never reaches the converter
    fn leaf(&self, convert: Converter, target_shape: &Shape, source: &TypeRef, labels: &Labels) -> Step {
        let accepts_null = target_shape.accepts_null();
        let wrap = self.engine.config.diagnostics.then(|| {
            (labels.clone(), source.clone(), target_shape.ty().clone())
        });
        step(move |value, _existing, _scope| {
            if value.is_null() {
                return Ok(accepts_null.then_some(Value::Null));
            }
            match convert(value) {
                Ok(converted) => Ok(Some(converted)),
                Err(err) => Err(match &wrap {
                    Some((labels, source, target)) => labels.wrap(err, source, target),
                    None => err,
                }),
            }
        })
    }

    /// Call into the separately compiled mapper for a nested pair
    fn delegate(&self, source: &TypeRef, target: &TypeRef, graph: Option<&SelectionGraph>) -> Step {
        log::debug!(
            "nesting limit {} reached, delegating {} -> {}",
            self.engine.config.max_inline_depth,
            source,
            target
        );
        let key = CacheKey::new(source.clone(), target.clone(), graph.cloned(), self.variant);
        let resolved: OnceLock<Weak<CompiledMapper>> = OnceLock::new();
        step(move |value, existing, scope| {
            if value.is_null() {
                return Ok(None);
            }
            let mapper = match resolved.get().and_then(Weak::upgrade) {
                Some(mapper) => mapper,
                None => {
                    let mapper = scope.engine.compiled(&key)?;
                    let _ = resolved.set(Arc::downgrade(&mapper));
                    mapper
                }
            };
            mapper.run(value, existing, scope)
        })
    }
}
