//! Derivation of mapping plans from two shapes and their overrides
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::{MappingPlan, MemberMapEntry};
use crate::shape::Shape;
use std::collections::BTreeSet;

/// Overrides registered for one type pair
///
/// Holds at most one entry per target member; a later registration replaces
/// the earlier one. `history` records registrations in order for
/// diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: Vec<MemberMapEntry>,
    ignored: BTreeSet<String>,
    history: Vec<String>,
}

impl Overrides {
    /// Insert or replace the entry for its target member; returns true on replace
    pub fn upsert(&mut self, entry: MemberMapEntry) -> bool {
        self.ignored.remove(&entry.target_member);
        self.history.push(format!(
            "{} <- {}",
            entry.target_member,
            entry.source_label()
        ));
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.target_member == entry.target_member)
        {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                self.entries.push(entry);
                false
            }
        }
    }

    /// Drop the override for a target member; returns true if one existed
    pub fn remove(&mut self, target_member: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.target_member != target_member);
        let removed = self.entries.len() != before;
        if removed {
            self.history.push(format!("{target_member} <- (removed)"));
        }
        removed
    }

    /// Exclude a target member from the default correspondence
    pub fn ignore(&mut self, target_member: &str) {
        self.remove(target_member);
        self.ignored.insert(target_member.to_string());
        self.history.push(format!("{target_member} <- (ignored)"));
    }

    pub fn entry(&self, target_member: &str) -> Option<&MemberMapEntry> {
        self.entries
            .iter()
            .find(|entry| entry.target_member == target_member)
    }

    pub fn is_ignored(&self, target_member: &str) -> bool {
        self.ignored.contains(target_member)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.ignored.is_empty()
    }
}

/// Default name-matched entries for two object shapes
///
/// Every readable source member whose name matches a writable target member
/// (case-sensitive, ordinal) yields an identity entry.
pub fn default_entries(source: &Shape, target: &Shape) -> Vec<MemberMapEntry> {
    if !source.is_object() || !target.is_object() {
        return Vec::new();
    }
    target
        .members()
        .iter()
        .filter(|member| member.writable)
        .filter_map(|target_member| {
            source
                .member(&target_member.name)
                .filter(|source_member| source_member.readable)
                .map(|source_member| {
                    MemberMapEntry::member(
                        target_member.name.clone(),
                        source_member.name.clone(),
                        source_member.ty.clone(),
                        target_member.ty.clone(),
                    )
                })
        })
        .collect()
}

/// Merge the default correspondence with overrides into a plan
///
/// Pairs where either side is a primitive, enum or enumerable shape map
/// value-wise or element-wise and get an empty plan.
pub fn derive_plan(source: &Shape, target: &Shape, overrides: &Overrides) -> MappingPlan {
    let mut plan = MappingPlan::empty(source.ty().clone(), target.ty().clone());
    if !source.is_object() || !target.is_object() {
        return plan;
    }

    let defaults = default_entries(source, target);
    for member in target.members() {
        if let Some(entry) = overrides.entry(&member.name) {
            plan.push(entry.clone());
        } else if !overrides.is_ignored(&member.name) {
            if let Some(entry) = defaults
                .iter()
                .find(|entry| entry.target_member == member.name)
            {
                plan.push(entry.clone());
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::MemberInfo;
    use crate::types::TypeRef;
    use crate::value::Value;
    use std::sync::Arc;

    fn person() -> Shape {
        Shape::object(
            TypeRef::named("Person"),
            vec![
                MemberInfo::new("id", TypeRef::I32),
                MemberInfo::new("name", TypeRef::STRING),
                MemberInfo::new("secret", TypeRef::STRING).write_only(),
                MemberInfo::new("age", TypeRef::I32),
            ],
            true,
        )
    }

    fn person_dto() -> Shape {
        Shape::object(
            TypeRef::named("PersonDto"),
            vec![
                MemberInfo::new("id", TypeRef::I64),
                MemberInfo::new("name", TypeRef::STRING),
                MemberInfo::new("secret", TypeRef::STRING),
                MemberInfo::new("age", TypeRef::STRING).read_only(),
                MemberInfo::new("Name", TypeRef::STRING),
            ],
            true,
        )
    }

    #[test]
    fn test_default_entries_match_by_exact_name() {
        let entries = default_entries(&person(), &person_dto());
        let names: Vec<_> = entries.iter().map(|e| e.target_member.as_str()).collect();
        // write-only sources and read-only targets are skipped; matching is case-sensitive
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(entries[0].source_type, TypeRef::I32);
        assert_eq!(entries[0].target_type, TypeRef::I64);
        assert!(entries[0].is_name_matched());
    }

    #[test]
    fn test_value_shapes_get_empty_plan() {
        let plan = derive_plan(
            &Shape::primitive(crate::types::PrimitiveKind::I32),
            &person_dto(),
            &Overrides::default(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_override_replaces_default() {
        let mut overrides = Overrides::default();
        let compute: crate::plan::ValueFn = Arc::new(|_: &Value| Ok(Value::from("override")));
        overrides.upsert(MemberMapEntry::computed(
            "name",
            "constant",
            compute,
            TypeRef::STRING,
            TypeRef::STRING,
        ));
        let plan = derive_plan(&person(), &person_dto(), &overrides);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.entry("name").unwrap().source_label(), "constant");
    }

    #[test]
    fn test_last_registration_wins() {
        let mut overrides = Overrides::default();
        assert!(!overrides.upsert(MemberMapEntry::member("Name", "name", TypeRef::STRING, TypeRef::STRING)));
        assert!(overrides.upsert(MemberMapEntry::member("Name", "id", TypeRef::I32, TypeRef::STRING)));
        assert_eq!(overrides.entry("Name").unwrap().source_label(), "id");
        assert_eq!(overrides.history().len(), 2);
    }

    #[test]
    fn test_ignore_drops_default_entry() {
        let mut overrides = Overrides::default();
        overrides.ignore("id");
        let plan = derive_plan(&person(), &person_dto(), &overrides);
        assert!(plan.entry("id").is_none());
        assert!(plan.entry("name").is_some());
    }
}
