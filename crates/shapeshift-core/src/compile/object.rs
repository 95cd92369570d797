//! Object branch: member-wise mapping with cycle handling
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::emitter::Emitter;
use super::{step, Labels, Scope, Step, Variant};
use crate::error::{Error, Result};
use crate::plan::SourceAccessor;
use crate::selection::SelectionGraph;
use crate::shape::Shape;
use crate::types::TypeRef;
use crate::value::{ObjectRef, Value};
use std::sync::Arc;

/// Compiled assignment of one target member
struct MemberStep {
    target_member: String,
    accessor: SourceAccessor,
    source_type: TypeRef,
    target_type: TypeRef,
    step: Step,
    /// Report the assignment to the observer
    observe: bool,
    /// Wrap computed-accessor failures with labels
    wrap: bool,
    labels: Labels,
}

impl MemberStep {
    fn read(&self, source: &Value, object: &ObjectRef) -> Result<Value> {
        match &self.accessor {
            SourceAccessor::Member(name) => Ok(object.field(name)),
            SourceAccessor::Computed { compute, .. } => compute(source).map_err(|err| {
                let failure = Error::Conversion {
                    value: source.to_string(),
                    from: self.source_type.to_string(),
                    to: self.target_type.to_string(),
                    message: format!("{err:#}"),
                };
                if self.wrap {
                    self.labels.wrap(failure, &self.source_type, &self.target_type)
                } else {
                    failure
                }
            }),
        }
    }

    fn apply(
        &self,
        source: &Value,
        object: &ObjectRef,
        target: &ObjectRef,
        scope: &mut Scope<'_>,
    ) -> Result<()> {
        let value = self.read(source, object)?;
        let previous = target.get(&self.target_member);
        let existing = previous.clone().filter(|current| !current.is_null());
        let Some(mapped) = (self.step)(&value, existing, scope)? else {
            return Ok(());
        };

        if self.observe {
            if let Some(observer) = scope.observer {
                let old = previous.unwrap_or(Value::Null);
                let (old_text, new_text) = (old.to_string(), mapped.to_string());
                if old == mapped {
                    observer.value_unchanged(&self.labels.source, &old_text, &self.labels.target, &new_text);
                } else {
                    observer.value_changed(&self.labels.source, &old_text, &self.labels.target, &new_text);
                }
            }
        }
        target.set(self.target_member.clone(), mapped);
        Ok(())
    }
}

/// Child selection for a member, or `None` if the member is not selected
///
/// A member named in the graph's value set is mapped in full; a member with a
/// child graph is restricted to it.
fn select<'g>(
    graph: Option<&'g SelectionGraph>,
    member: &str,
    value_like: bool,
) -> Option<Option<&'g SelectionGraph>> {
    let Some(graph) = graph else {
        return Some(None);
    };
    match graph.child(member) {
        Some(_) if value_like => Some(None),
        Some(child) => Some(Some(child)),
        None if graph.selects_value(member) => Some(None),
        None => None,
    }
}

pub(crate) fn emit(
    emitter: &Emitter<'_>,
    source: &Arc<Shape>,
    target: &Arc<Shape>,
    graph: Option<&SelectionGraph>,
    depth: usize,
    labels: &Labels,
) -> Result<Step> {
    let engine = emitter.engine();
    let plan = engine.plan_for(source, target)?;
    let diagnostics = emitter.variant() == Variant::Diagnostics;

    let mut members = Vec::with_capacity(plan.len());
    for entry in plan.entries() {
        let member_shape = engine.describe(&entry.target_type)?;
        let value_like = member_shape.is_value_like();
        let Some(child) = select(graph, &entry.target_member, value_like) else {
            continue;
        };
        let member_labels = labels.member(entry.source_label(), &entry.target_member);
        let member_step = emitter.emit(
            &entry.source_type,
            &entry.target_type,
            child,
            depth + 1,
            &member_labels,
        )?;
        members.push(MemberStep {
            target_member: entry.target_member.clone(),
            accessor: entry.source.clone(),
            source_type: entry.source_type.clone(),
            target_type: entry.target_type.clone(),
            step: member_step,
            observe: diagnostics && value_like,
            wrap: engine.config.diagnostics,
            labels: member_labels,
        });
    }

    let source_type = source.ty().clone();
    let target_type = target.ty().clone();
    let target_shape = target.clone();
    let labels = labels.clone();
    Ok(step(move |value, existing, scope| {
        let object = match value {
            Value::Null => return Ok(None),
            Value::Object(object) => object,
            other => return Err(Error::mismatch(&source_type, other.kind_name())),
        };
        if let Some(mapped) = scope.guard.lookup(object, &target_type) {
            return Ok(Some(Value::Object(mapped)));
        }

        let instance = match existing {
            Some(Value::Object(current)) if *current.type_ref() == target_type => current,
            _ => match target_shape.instantiate() {
                Some(created) => {
                    if diagnostics {
                        if let Some(observer) = scope.observer {
                            observer.object_created(&labels.source, &labels.target, &target_type.to_string());
                        }
                    }
                    created
                }
                None => {
                    log::trace!("{} has no default constructor, skipping {}", target_type, labels.target);
                    return Ok(None);
                }
            },
        };

        scope.guard.enter(object, &target_type, &instance);
        let outcome = members
            .iter()
            .try_for_each(|member| member.apply(value, object, &instance, scope));
        scope.guard.leave(object, &target_type);
        outcome?;
        Ok(Some(Value::Object(instance)))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_without_graph_maps_everything() {
        assert_eq!(select(None, "a", true), Some(None));
        assert_eq!(select(None, "a", false), Some(None));
    }

    #[test]
    fn test_select_with_graph() {
        let child = SelectionGraph::of(["name"]);
        let graph = SelectionGraph::builder()
            .member("id")
            .member("owner")
            .child("customer", child.clone())
            .build();
        assert_eq!(select(Some(&graph), "id", true), Some(None));
        assert_eq!(select(Some(&graph), "total", true), None);
        assert_eq!(select(Some(&graph), "customer", false), Some(Some(&child)));
        assert_eq!(select(Some(&graph), "owner", false), Some(None));
        assert_eq!(select(Some(&graph), "lines", false), None);
    }
}
