//! Selection graphs for partial mappings
//!
//! A selection graph restricts a mapping call to a subset of members. At each
//! level, value-typed members are selected by name and nested object or
//! enumerable members by a child graph. Graphs are immutable, compare
//! structurally, and take part in compiled mapper cache keys.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Default, PartialEq, Eq, Hash)]
struct GraphNode {
    members: BTreeSet<String>,
    children: BTreeMap<String, SelectionGraph>,
}

/// Immutable tree of selected members
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SelectionGraph {
    node: Arc<GraphNode>,
}

impl SelectionGraph {
    pub fn builder() -> SelectionGraphBuilder {
        SelectionGraphBuilder::default()
    }

    /// Graph selecting only the given value-typed members
    pub fn of<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().members(members).build()
    }

    /// Whether a value-typed member is selected
    pub fn selects_value(&self, member: &str) -> bool {
        self.node.members.contains(member)
    }

    /// Child graph for a nested member, if it is selected
    pub fn child(&self, member: &str) -> Option<&SelectionGraph> {
        self.node.children.get(member)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.node.members.iter().map(String::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &SelectionGraph)> {
        self.node.children.iter().map(|(name, graph)| (name.as_str(), graph))
    }

    pub fn is_empty(&self) -> bool {
        self.node.members.is_empty() && self.node.children.is_empty()
    }

    /// Number of nodes in the tree, this one included
    pub fn node_count(&self) -> usize {
        1 + self
            .node
            .children
            .values()
            .map(SelectionGraph::node_count)
            .sum::<usize>()
    }
}

/// Builder for [`SelectionGraph`]
#[derive(Debug, Default)]
pub struct SelectionGraphBuilder {
    members: BTreeSet<String>,
    children: BTreeMap<String, SelectionGraph>,
}

impl SelectionGraphBuilder {
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.insert(name.into());
        self
    }

    pub fn members<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.extend(names.into_iter().map(Into::into));
        self
    }

    /// Select a nested member, restricting it to `graph`
    pub fn child(mut self, name: impl Into<String>, graph: SelectionGraph) -> Self {
        self.children.insert(name.into(), graph);
        self
    }

    pub fn build(self) -> SelectionGraph {
        SelectionGraph {
            node: Arc::new(GraphNode {
                members: self.members,
                children: self.children,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(graph: &SelectionGraph) -> u64 {
        let mut hasher = DefaultHasher::new();
        graph.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_selection_lookup() {
        let graph = SelectionGraph::builder()
            .member("id")
            .child("customer", SelectionGraph::of(["name"]))
            .build();
        assert!(graph.selects_value("id"));
        assert!(!graph.selects_value("customer"));
        assert!(graph.child("customer").unwrap().selects_value("name"));
        assert!(graph.child("lines").is_none());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_structural_equality() {
        let a = SelectionGraph::builder()
            .members(["b", "a"])
            .child("x", SelectionGraph::of(["y"]))
            .build();
        let b = SelectionGraph::builder()
            .child("x", SelectionGraph::of(["y"]))
            .member("a")
            .member("b")
            .build();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, SelectionGraph::of(["a"]));
    }
}
