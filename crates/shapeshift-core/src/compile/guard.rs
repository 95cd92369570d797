//! Per-call identity map breaking cycles in object graphs
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::config::RecursionScope;
use crate::types::TypeRef;
use crate::value::ObjectRef;
use std::collections::HashMap;

/// Maps (source object identity, target type) to the target created for it
///
/// A fresh guard is created for every top-level mapping call and is only
/// touched by that call's stack. Source handles are kept alive for the
/// lifetime of their entry so identities cannot be reused mid-call.
#[derive(Debug)]
pub struct RecursionGuard {
    scope: RecursionScope,
    entries: HashMap<(usize, TypeRef), (ObjectRef, ObjectRef)>,
}

impl RecursionGuard {
    pub fn new(scope: RecursionScope) -> Self {
        Self {
            scope,
            entries: HashMap::new(),
        }
    }

    /// Target already created for this source object and target type
    pub fn lookup(&self, source: &ObjectRef, target_type: &TypeRef) -> Option<ObjectRef> {
        self.entries
            .get(&(source.id(), target_type.clone()))
            .map(|(_, target)| target.clone())
    }

    /// Record the target for a source object before its members are mapped
    pub fn enter(&mut self, source: &ObjectRef, target_type: &TypeRef, target: &ObjectRef) {
        self.entries.insert(
            (source.id(), target_type.clone()),
            (source.clone(), target.clone()),
        );
    }

    /// Called when the object subtree finishes
    pub fn leave(&mut self, source: &ObjectRef, target_type: &TypeRef) {
        if self.scope == RecursionScope::Subtree {
            self.entries.remove(&(source.id(), target_type.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_scope_keeps_entries() {
        let mut guard = RecursionGuard::new(RecursionScope::Call);
        let source = ObjectRef::new(TypeRef::named("Node"));
        let target = ObjectRef::new(TypeRef::named("NodeDto"));
        let ty = TypeRef::named("NodeDto");

        assert!(guard.lookup(&source, &ty).is_none());
        guard.enter(&source, &ty, &target);
        assert!(guard.lookup(&source, &ty).unwrap().ptr_eq(&target));
        assert!(guard.lookup(&source, &TypeRef::named("Other")).is_none());
        guard.leave(&source, &ty);
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_subtree_scope_removes_entries() {
        let mut guard = RecursionGuard::new(RecursionScope::Subtree);
        let source = ObjectRef::new(TypeRef::named("Node"));
        let ty = TypeRef::named("Node");
        guard.enter(&source, &ty, &ObjectRef::new(ty.clone()));
        guard.leave(&source, &ty);
        assert!(guard.is_empty());
    }
}
