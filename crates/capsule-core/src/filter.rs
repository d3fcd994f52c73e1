//! Node set selection by name and group.

use crate::types::NodeSet;

/// A single selection criterion. Each filter matches a node set when any
/// of its values matches exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSetFilter {
    Names(Vec<String>),
    GroupNames(Vec<String>),
}

impl NodeSetFilter {
    pub fn matches(&self, ns: &NodeSet) -> bool {
        match self {
            NodeSetFilter::Names(names) => names.contains(&ns.name),
            NodeSetFilter::GroupNames(groups) => groups.contains(&ns.group_name),
        }
    }
}

/// Keep the node sets matched by every filter, preserving input order.
pub fn filter_node_sets(node_sets: &[NodeSet], filters: &[NodeSetFilter]) -> Vec<NodeSet> {
    node_sets
        .iter()
        .filter(|ns| filters.iter().all(|f| f.matches(ns)))
        .cloned()
        .collect()
}
