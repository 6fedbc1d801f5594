//! Dependency graph over a collection of entries
//!
//! The graph is a read-only view derived from the entries: adjacency from
//! each entry to its dependencies, plus the reverse (dependents) view the
//! teardown driver needs. It is built exactly once per run and never
//! mutated afterwards; a new run rebuilds it from source.

use crate::entry::Entry;
use crate::error::GraphError;
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// A validated, acyclic dependency graph.
///
/// [`Graph::build`] is the only constructor and guarantees that every
/// `depends_on` reference resolves, that entry names are unique, and that
/// the induced relation is acyclic. Downstream code (the planner, the run
/// drivers) relies on those invariants without re-checking them.
#[derive(Debug)]
pub struct Graph {
    entries: BTreeMap<String, Entry>,
    dependents: BTreeMap<String, Vec<String>>,
}

impl Graph {
    /// Build the graph, rejecting duplicate names, dangling references,
    /// and cycles.
    ///
    /// Cycles are reported with the actual offending path
    /// (`a -> b -> c -> a`) so the manifest author can see which edges to
    /// break.
    pub fn build(entries: Vec<Entry>) -> Result<Self, GraphError> {
        let mut map: BTreeMap<String, Entry> = BTreeMap::new();
        for entry in entries {
            if map.contains_key(entry.name()) {
                return Err(GraphError::DuplicateEntry(entry.name().to_string()));
            }
            map.insert(entry.name().to_string(), entry);
        }

        let mut dependents: BTreeMap<String, Vec<String>> =
            map.keys().map(|name| (name.clone(), Vec::new())).collect();

        for entry in map.values() {
            for dep in entry.depends_on() {
                match dependents.get_mut(dep) {
                    Some(list) => list.push(entry.name().to_string()),
                    None => {
                        return Err(GraphError::DanglingDependency {
                            entry: entry.name().to_string(),
                            missing: dep.clone(),
                        });
                    }
                }
            }
        }

        let graph = Self {
            entries: map,
            dependents,
        };

        if let Some(path) = graph.find_cycle() {
            return Err(GraphError::CyclicDependency { path });
        }

        Ok(graph)
    }

    /// Number of entries in the graph
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the graph holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// All entries, ordered by name
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Entry names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Names this entry depends on (empty slice for unknown names)
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.entries.get(name).map_or(&[], Entry::depends_on)
    }

    /// Names that depend on this entry (empty slice for unknown names)
    pub fn dependents(&self, name: &str) -> &[String] {
        self.dependents.get(name).map_or(&[], Vec::as_slice)
    }

    /// Depth-first search with three-color marking: absent from `marks` is
    /// unvisited, `InProgress` is on the current traversal stack, `Done`
    /// is fully explored. The first back-edge found determines the
    /// reported cycle, walked back via the traversal path.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
        let mut path: Vec<String> = Vec::new();

        for name in self.entries.keys() {
            if !marks.contains_key(name.as_str())
                && let Some(cycle) = self.visit(name, &mut marks, &mut path)
            {
                return Some(cycle);
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut BTreeMap<&'a str, Mark>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::InProgress);
        path.push(node.to_string());

        for dep in self.dependencies(node) {
            match marks.get(dep.as_str()) {
                Some(Mark::InProgress) => {
                    // Back edge: the cycle is the path from the first
                    // occurrence of `dep`, closed back onto itself.
                    let start = path.iter().position(|n| n == dep).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(cycle) = self.visit(dep, marks, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        marks.insert(node, Mark::Done);
        None
    }
}
