// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of a topology definition.
//!
//! Checks run in a fixed order and accumulate every error they find, so a broken
//! topology reports all of its problems at once:
//!
//! 1. **Uniqueness**: node names are unique
//! 2. **References**: the root and every listed child exist
//! 3. **Cycles**: DFS with a recursion stack, reporting the cycle path
//! 4. **Reachability**: every node can be reached from the root
//! 5. **Context keys**: no two stages write the same key
//! 6. **Consumers**: every consumed key is written earlier in the traversal
//!
//! Steps 3 to 6 need a structurally valid graph and are skipped when the
//! uniqueness or reference checks fail.

use crate::errors::ValidationError;
use crate::topology::context::ContextKey;
use crate::topology::node::TopologyNode;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Validate a set of nodes rooted at `root`.
pub fn validate_topology<C>(root: &str, nodes: &[TopologyNode<C>]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicates) = validate_unique_names(nodes) {
        errors.extend(duplicates);
    }
    if let Err(unresolved) = validate_references(root, nodes) {
        errors.extend(unresolved);
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let index: HashMap<&str, &TopologyNode<C>> =
        nodes.iter().map(|node| (node.name.as_str(), node)).collect();

    if let Err(cycles) = validate_acyclic(nodes, &index) {
        return Err(cycles);
    }
    if let Err(unreachable) = validate_reachable(root, nodes, &index) {
        errors.extend(unreachable);
    }
    if let Err(duplicates) = validate_unique_context_keys(nodes) {
        errors.extend(duplicates);
    }
    if errors.is_empty() {
        if let Err(unresolved) = validate_consumers(root, nodes, &index) {
            errors.extend(unresolved);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_names<C>(nodes: &[TopologyNode<C>]) -> Result<(), Vec<ValidationError>> {
    let mut seen = HashSet::new();
    let errors: Vec<ValidationError> = nodes
        .iter()
        .filter(|node| !seen.insert(node.name.as_str()))
        .map(|node| ValidationError::DuplicateNode {
            node: node.name.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_references<C>(root: &str, nodes: &[TopologyNode<C>]) -> Result<(), Vec<ValidationError>> {
    let names: HashSet<&str> = nodes.iter().map(|node| node.name.as_str()).collect();
    let mut errors = Vec::new();

    if !names.contains(root) {
        errors.push(ValidationError::MissingRoot {
            root: root.to_string(),
        });
    }

    for node in nodes {
        for child in &node.children {
            if !names.contains(child.as_str()) {
                errors.push(ValidationError::UnresolvedChild {
                    node: node.name.clone(),
                    missing_child: child.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// DFS over the children relation. A child already on the recursion stack closes
/// a cycle; the path from its first occurrence is reported.
fn validate_acyclic<C>(
    nodes: &[TopologyNode<C>],
    index: &HashMap<&str, &TopologyNode<C>>,
) -> Result<(), Vec<ValidationError>> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in nodes {
        if !visited.contains(node.name.as_str()) {
            if let Some(cycle) = dfs_cycle_detection(
                node.name.as_str(),
                index,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return Err(vec![ValidationError::CyclicDependency { cycle }]);
            }
        }
    }

    Ok(())
}

fn dfs_cycle_detection<'a, C>(
    node: &'a str,
    index: &HashMap<&'a str, &'a TopologyNode<C>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(&current) = index.get(node) {
        for child in &current.children {
            let child = child.as_str();
            if rec_stack.contains(child) {
                let start = path.iter().position(|&n| n == child).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(child.to_string());
                return Some(cycle);
            }
            if !visited.contains(child) {
                if let Some(cycle) = dfs_cycle_detection(child, index, visited, rec_stack, path) {
                    return Some(cycle);
                }
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

fn validate_reachable<C>(
    root: &str,
    nodes: &[TopologyNode<C>],
    index: &HashMap<&str, &TopologyNode<C>>,
) -> Result<(), Vec<ValidationError>> {
    let mut reached = HashSet::new();
    let mut stack = vec![root];
    while let Some(name) = stack.pop() {
        if !reached.insert(name) {
            continue;
        }
        if let Some(&node) = index.get(name) {
            stack.extend(node.children.iter().map(String::as_str));
        }
    }

    let errors: Vec<ValidationError> = nodes
        .iter()
        .filter(|node| !reached.contains(node.name.as_str()))
        .map(|node| ValidationError::UnreachableNode {
            node: node.name.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_context_keys<C>(nodes: &[TopologyNode<C>]) -> Result<(), Vec<ValidationError>> {
    let mut owners: HashMap<ContextKey, String> = HashMap::new();
    let mut errors = Vec::new();

    for node in nodes {
        for stage in &node.stages {
            let Some(key) = stage.context else {
                continue;
            };
            let owner = format!("{}.{}", node.name, stage.processor);
            match owners.get(&key) {
                Some(first) => errors.push(ValidationError::DuplicateContextKey {
                    key,
                    first: first.clone(),
                    second: owner,
                }),
                None => {
                    owners.insert(key, owner);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Keys guaranteed to be populated when a node starts, for every path from the
/// root. A node inherits its parent's keys, the keys of the parent's stages and
/// the keys earlier siblings leave set once they are done. With several parents
/// only the keys common to all of them count.
fn validate_consumers<C>(
    root: &str,
    nodes: &[TopologyNode<C>],
    index: &HashMap<&str, &TopologyNode<C>>,
) -> Result<(), Vec<ValidationError>> {
    let mut available: HashMap<&str, BTreeSet<ContextKey>> = HashMap::new();
    available.insert(root, BTreeSet::new());

    for name in topological_order(root, index) {
        let Some(&node) = index.get(name) else {
            continue;
        };
        let mut inherited = available.get(name).cloned().unwrap_or_default();
        inherited.extend(node.context_keys());

        for child in &node.children {
            let child = child.as_str();
            let offered = inherited.clone();
            available
                .entry(child)
                .and_modify(|keys| *keys = keys.intersection(&offered).copied().collect())
                .or_insert(offered);

            if let Some(sibling) = index.get(child) {
                inherited.extend(sibling.retained_keys());
            }
        }
    }

    let mut errors = Vec::new();
    for node in nodes {
        let mut keys = available.get(node.name.as_str()).cloned().unwrap_or_default();
        for stage in &node.stages {
            for key in &stage.consumer {
                if !keys.contains(key) {
                    errors.push(ValidationError::UnresolvedConsumer {
                        node: node.name.clone(),
                        processor: stage.processor.to_string(),
                        key: *key,
                    });
                }
            }
            keys.extend(stage.context);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parents before children; assumes an acyclic graph.
fn topological_order<'a, C>(root: &'a str, index: &HashMap<&'a str, &'a TopologyNode<C>>) -> Vec<&'a str> {
    fn visit<'a, C>(
        name: &'a str,
        index: &HashMap<&'a str, &'a TopologyNode<C>>,
        done: &mut HashSet<&'a str>,
        order: &mut Vec<&'a str>,
    ) {
        if !done.insert(name) {
            return;
        }
        if let Some(&node) = index.get(name) {
            for child in &node.children {
                visit(child.as_str(), index, done, order);
            }
        }
        order.push(name);
    }

    let mut done = HashSet::new();
    let mut order = Vec::new();
    visit(root, index, &mut done, &mut order);
    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityType;
    use crate::topology::node::{Produce, StageOutput, StageSpec};
    use crate::topology::IngestionScope;

    struct Noop;

    fn nothing<'a>(_c: &'a Noop, _s: &IngestionScope) -> Produce<'a, String> {
        Box::new(std::iter::empty())
    }

    fn no_records<'a>(_c: &'a Noop, _i: &'a String, _s: &IngestionScope) -> StageOutput<'a> {
        Box::new(std::iter::empty())
    }

    fn node(name: &str, children: &[&str], stages: Vec<StageSpec>) -> TopologyNode<Noop> {
        let mut builder = TopologyNode::<Noop>::builder::<String>(name, nothing);
        for child in children {
            builder = builder.child(*child);
        }
        for stage in stages {
            builder = builder.stage(stage, no_records);
        }
        builder.build()
    }

    fn writes(processor: &'static str, key: ContextKey) -> StageSpec {
        StageSpec::new(processor, EntityType::Table).context(key)
    }

    #[test]
    fn test_valid_chain() {
        let nodes = vec![
            node("root", &["db"], vec![writes("yield_service", ContextKey::DatabaseService)]),
            node(
                "db",
                &[],
                vec![writes("yield_database", ContextKey::Database)
                    .consumes(&[ContextKey::DatabaseService])],
            ),
        ];
        assert!(validate_topology("root", &nodes).is_ok());
    }

    #[test]
    fn test_duplicate_and_unresolved_are_accumulated() {
        let nodes = vec![
            node("root", &["ghost"], vec![]),
            node("root", &[], vec![]),
        ];
        let errors = validate_topology("missing", &nodes).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateNode {
            node: "root".to_string()
        }));
        assert!(errors.contains(&ValidationError::MissingRoot {
            root: "missing".to_string()
        }));
        assert!(errors.contains(&ValidationError::UnresolvedChild {
            node: "root".to_string(),
            missing_child: "ghost".to_string()
        }));
    }

    #[test]
    fn test_cycle_reports_path() {
        let nodes = vec![
            node("root", &["a"], vec![]),
            node("a", &["b"], vec![]),
            node("b", &["a"], vec![]),
        ];
        let errors = validate_topology("root", &nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicDependency {
                cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()]
            }]
        );
    }

    #[test]
    fn test_unreachable_node() {
        let nodes = vec![node("root", &[], vec![]), node("orphan", &[], vec![])];
        let errors = validate_topology("root", &nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnreachableNode {
                node: "orphan".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_context_key_rejected() {
        let nodes = vec![
            node("root", &["db"], vec![writes("first", ContextKey::Database)]),
            node("db", &[], vec![writes("second", ContextKey::Database)]),
        ];
        let errors = validate_topology("root", &nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateContextKey {
                key: ContextKey::Database,
                first: "root.first".to_string(),
                second: "db.second".to_string(),
            }]
        );
    }

    #[test]
    fn test_consumer_must_be_written_earlier() {
        let nodes = vec![
            node("root", &["a", "b"], vec![]),
            node("a", &[], vec![writes("yield_a", ContextKey::Chart)]),
            node(
                "b",
                &[],
                vec![StageSpec::new("yield_b", EntityType::Dashboard)
                    .consumes(&[ContextKey::Chart, ContextKey::Topic])],
            ),
        ];
        let errors = validate_topology("root", &nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvedConsumer {
                node: "b".to_string(),
                processor: "yield_b".to_string(),
                key: ContextKey::Topic,
            }]
        );
    }

    #[test]
    fn test_clearing_sibling_does_not_provide_keys() {
        let cleared = TopologyNode::<Noop>::builder::<String>("a", nothing)
            .stage(writes("yield_a", ContextKey::Chart), no_records)
            .clear_cache()
            .build();
        let nodes = vec![
            node("root", &["a", "b"], vec![]),
            cleared,
            node(
                "b",
                &[],
                vec![StageSpec::new("yield_b", EntityType::Dashboard).consumes(&[ContextKey::Chart])],
            ),
        ];
        assert!(validate_topology("root", &nodes).is_err());
    }

    #[test]
    fn test_sibling_clearing_a_stage_key_does_not_provide_it() {
        let nodes = vec![
            node("root", &["chart", "dashboard"], vec![]),
            node(
                "chart",
                &[],
                vec![
                    writes("yield_chart", ContextKey::Chart).clear_context(),
                    writes("yield_data_model", ContextKey::DataModel),
                ],
            ),
            node(
                "dashboard",
                &[],
                vec![StageSpec::new("yield_dashboard", EntityType::Dashboard)
                    .consumes(&[ContextKey::DataModel, ContextKey::Chart])],
            ),
        ];

        let errors = validate_topology("root", &nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvedConsumer {
                node: "dashboard".to_string(),
                processor: "yield_dashboard".to_string(),
                key: ContextKey::Chart,
            }]
        );
    }
}
