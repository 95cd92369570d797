//! Enumerable branch
//!
//! The iteration strategy depends on both collection kinds: array to array
//! uses the source length directly, other sources feeding an array report a
//! count or are enumerated once to find one, and every other target is
//! filled by streaming append. A pre-existing target collection keeps its
//! own kind.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::emitter::Emitter;
use super::{step, Labels, Scope, Step};
use crate::error::{Error, Result};
use crate::selection::SelectionGraph;
use crate::shape::{ElementTypes, Shape, ShapeKind};
use crate::types::{CollectionKind, TypeRef};
use crate::value::{Collection, Value};
use std::sync::Arc;

pub(crate) fn emit(
    emitter: &Emitter<'_>,
    source: &Arc<Shape>,
    target: &Arc<Shape>,
    graph: Option<&SelectionGraph>,
    depth: usize,
    labels: &Labels,
) -> Result<Step> {
    let target_kind = match target.kind() {
        ShapeKind::Enumerable { collection, .. } => *collection,
        _ => return Err(Error::build("target is not enumerable", source.ty(), target.ty())),
    };
    let (Some(source_elements), Some(target_elements)) = (source.kind().elements(), target.kind().elements())
    else {
        return Err(Error::build("source is not enumerable", source.ty(), target.ty()));
    };

    match (source_elements, target_elements) {
        (ElementTypes::Single(from), ElementTypes::Single(to)) => {
            let element = emitter.emit(from, to, graph, depth + 1, &labels.element())?;
            let fallback = emitter.engine().describe(to)?.default_value();
            Ok(elements(source.ty().clone(), target_kind, element, fallback))
        }
        (ElementTypes::KeyValue(from_key, from_value), ElementTypes::KeyValue(to_key, to_value)) => {
            let key = emitter.emit(from_key, to_key, None, depth + 1, &labels.key())?;
            let value = emitter.emit(from_value, to_value, graph, depth + 1, &labels.value())?;
            let fallback = emitter.engine().describe(to_value)?.default_value();
            Ok(entries(source.ty().clone(), key, value, fallback))
        }
        _ => Err(Error::build(
            "cannot map between single-element and key/value collections",
            source.ty(),
            target.ty(),
        )),
    }
}

fn map_element(element: &Step, item: &Value, fallback: &Value, scope: &mut Scope<'_>) -> Result<Value> {
    Ok(element(item, None, scope)?.unwrap_or_else(|| fallback.clone()))
}

/// Fill a fixed-length array; slots whose element is skipped keep the default
fn fill_array(
    length: usize,
    items: &[Value],
    element: &Step,
    fallback: &Value,
    scope: &mut Scope<'_>,
) -> Result<Collection> {
    let mut slots = vec![fallback.clone(); length];
    for (slot, item) in slots.iter_mut().zip(items) {
        if let Some(mapped) = element(item, None, scope)? {
            *slot = mapped;
        }
    }
    Ok(Collection::Array(slots))
}

fn elements(source_type: TypeRef, declared: CollectionKind, element: Step, fallback: Value) -> Step {
    step(move |value, existing, scope| {
        let collection = match value {
            Value::Null => return Ok(None),
            Value::Collection(collection) => collection,
            other => return Err(Error::mismatch(&source_type, other.kind_name())),
        };
        let items = collection
            .elements()
            .ok_or_else(|| Error::mismatch(&source_type, CollectionKind::Dictionary.name()))?;

        let kind = match &existing {
            Some(Value::Collection(current)) if current.kind() != CollectionKind::Dictionary => {
                current.kind()
            }
            _ => declared,
        };

        let mapped = match (collection.kind(), kind) {
            (CollectionKind::Array, CollectionKind::Array) => {
                fill_array(items.len(), items, &element, &fallback, scope)?
            }
            (_, CollectionKind::Array) => {
                let length = collection
                    .count()
                    .unwrap_or_else(|| items.iter().count());
                fill_array(length, items, &element, &fallback, scope)?
            }
            (_, kind) => {
                let mut out = Collection::with_capacity(kind, items.len());
                for item in items {
                    out.push(map_element(&element, item, &fallback, scope)?)?;
                }
                out
            }
        };
        Ok(Some(Value::Collection(mapped)))
    })
}

fn entries(source_type: TypeRef, key: Step, value: Step, fallback: Value) -> Step {
    step(move |source, _existing, scope| {
        let collection = match source {
            Value::Null => return Ok(None),
            Value::Collection(collection) => collection,
            other => return Err(Error::mismatch(&source_type, other.kind_name())),
        };
        let pairs = collection
            .entries()
            .ok_or_else(|| Error::mismatch(&source_type, collection.kind().name()))?;

        let mut out = Collection::with_capacity(CollectionKind::Dictionary, pairs.len());
        for (from_key, from_value) in pairs {
            let Some(mapped_key) = key(from_key, None, scope)? else {
                log::trace!("skipping dictionary entry with null key");
                continue;
            };
            let mapped_value = map_element(&value, from_value, &fallback, scope)?;
            out.insert(mapped_key, mapped_value)?;
        }
        Ok(Some(Value::Collection(out)))
    })
}
