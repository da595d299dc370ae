//! Type dependency resolution
//!
//! Builds a directed graph over the composite types being created in one run
//! (edge A -> B when A's attributes reference B), detects cycles, and
//! computes a creation order. Cycles are reported, not fatal: implicated
//! types are appended at the end of the order so the caller can still attempt
//! per-type creation and flag failures for retry.
//!
//! Determinism: ties among zero-in-degree nodes break by stable input order,
//! so the same input always yields the same creation order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::composite_type::CompositeType;

/// An ordered list of qualified type names forming a cycle. The first and
/// last entries are the same type, so a two-type cycle has length 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularDependency {
    pub chain: Vec<String>,
}

impl std::fmt::Display for CircularDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.chain.join(" -> "))
    }
}

/// The dependency graph plus its analysis results.
#[derive(Debug)]
pub struct DependencyAnalysis {
    /// Creation order: dependencies first, cyclic types appended at the end.
    pub ordered: Vec<String>,
    /// Detected cycles, at most one per DFS root.
    pub cycles: Vec<CircularDependency>,
    /// qualified name -> referenced in-scope types, in input order
    pub graph: HashMap<String, Vec<String>>,
}

impl DependencyAnalysis {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Resolves the creation order for a set of composite types.
///
/// Edges only point at types that are themselves part of this run; references
/// to already-existing types are not dependencies.
pub fn resolve_creation_order(types: &[CompositeType]) -> DependencyAnalysis {
    // Input order drives every tie-break below
    let names: Vec<String> = types.iter().map(|t| t.qualified_name()).collect();
    let in_scope: HashSet<&str> = names.iter().map(String::as_str).collect();

    let mut graph: HashMap<String, Vec<String>> = HashMap::new();
    for (ty, name) in types.iter().zip(&names) {
        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for referenced in ty.referenced_types() {
            if referenced != name && in_scope.contains(referenced) && seen.insert(referenced) {
                edges.push(referenced.to_string());
            }
        }
        graph.insert(name.clone(), edges);
    }

    let cycles = detect_cycles(&names, &graph);
    let ordered = topological_order(&names, &graph);

    DependencyAnalysis {
        ordered,
        cycles,
        graph,
    }
}

/// Depth-first cycle detection with an explicit recursion stack. Records at
/// most one cycle per DFS root; the chain is reconstructed through the parent
/// map so its first and last entries match.
fn detect_cycles(names: &[String], graph: &HashMap<String, Vec<String>>) -> Vec<CircularDependency> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut cycles = Vec::new();

    for root in names {
        if visited.contains(root.as_str()) {
            continue;
        }

        let mut on_stack: HashSet<&str> = HashSet::new();
        let mut parent: HashMap<&str, &str> = HashMap::new();
        // (node, next-edge-index) frames instead of recursion
        let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
        on_stack.insert(root.as_str());
        visited.insert(root.as_str());
        let mut found: Option<CircularDependency> = None;

        while let Some((node, edge_idx)) = stack.pop() {
            let edges = graph.get(node).map(Vec::as_slice).unwrap_or_default();
            if edge_idx >= edges.len() {
                on_stack.remove(node);
                continue;
            }
            stack.push((node, edge_idx + 1));

            let next = edges[edge_idx].as_str();
            if on_stack.contains(next) {
                if found.is_none() {
                    found = Some(reconstruct_cycle(node, next, &parent));
                }
            } else if !visited.contains(next) {
                visited.insert(next);
                on_stack.insert(next);
                parent.insert(next, node);
                stack.push((next, 0));
            }
        }

        if let Some(cycle) = found {
            cycles.push(cycle);
        }
    }

    cycles
}

/// Walks the parent chain from `from` back to `to`, producing
/// `[to, ..., from, to]`.
fn reconstruct_cycle(
    from: &str,
    to: &str,
    parent: &HashMap<&str, &str>,
) -> CircularDependency {
    let mut chain = vec![from.to_string()];
    let mut current = from;
    while current != to {
        match parent.get(current) {
            Some(&prev) => {
                chain.push(prev.to_string());
                current = prev;
            }
            None => break,
        }
    }
    chain.reverse();
    chain.push(to.to_string());
    CircularDependency { chain }
}

/// Kahn's algorithm over the reverse graph: a type becomes creatable once
/// everything it references is ordered. Types never freed (cyclic) are
/// appended at the end in input order.
fn topological_order(names: &[String], graph: &HashMap<String, Vec<String>>) -> Vec<String> {
    // dependents[b] = types that reference b
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = names.iter().map(|n| (n.as_str(), 0)).collect();

    for name in names {
        let edges = graph.get(name).map(Vec::as_slice).unwrap_or_default();
        for referenced in edges {
            dependents
                .entry(referenced.as_str())
                .or_default()
                .push(name.as_str());
        }
        *in_degree.entry(name.as_str()).or_insert(0) += edges.len();
    }

    let mut queue: VecDeque<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| in_degree[n] == 0)
        .collect();

    let mut ordered: Vec<String> = Vec::with_capacity(names.len());
    let mut placed: HashSet<&str> = HashSet::new();

    while let Some(node) = queue.pop_front() {
        ordered.push(node.to_string());
        placed.insert(node);
        if let Some(deps) = dependents.get(node) {
            for &dependent in deps {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    // Best-effort: cyclic leftovers still get a creation attempt
    for name in names {
        if !placed.contains(name.as_str()) {
            ordered.push(name.clone());
        }
    }

    ordered
}
