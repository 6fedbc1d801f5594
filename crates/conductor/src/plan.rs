//! Wave planner
//!
//! Turns a dependency graph into an ordered sequence of waves: each wave
//! is a set of entries whose dependencies are all satisfied by earlier
//! waves, so everything inside one wave may be driven concurrently while
//! the waves themselves are strictly sequenced.

use crate::graph::Graph;
use serde::Serialize;

/// An ordered sequence of deployment waves.
///
/// Built with Kahn's algorithm: repeatedly collect every entry whose
/// remaining in-degree is zero into the next wave, remove them, and
/// decrement their dependents. Within a wave entries are ordered by name,
/// which makes the plan reproducible across runs. Teardown order is the
/// same plan [reversed](Plan::reverse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    waves: Vec<Vec<String>>,
}

impl Plan {
    /// Compute the creation-order plan for a graph.
    ///
    /// Infallible: [`Graph::build`](crate::Graph::build) guarantees the
    /// graph is acyclic, so every round schedules at least one entry.
    pub fn of(graph: &Graph) -> Self {
        let mut remaining: std::collections::BTreeMap<&str, usize> = graph
            .entries()
            .map(|e| (e.name(), e.depends_on().len()))
            .collect();

        let mut waves = Vec::new();
        while !remaining.is_empty() {
            // BTreeMap iteration keeps the wave sorted by name.
            let wave: Vec<String> = remaining
                .iter()
                .filter(|(_, in_degree)| **in_degree == 0)
                .map(|(name, _)| (*name).to_string())
                .collect();

            if wave.is_empty() {
                debug_assert!(false, "acyclic graph must always free an entry");
                break;
            }

            for name in &wave {
                remaining.remove(name.as_str());
            }
            for name in &wave {
                for dependent in graph.dependents(name) {
                    if let Some(in_degree) = remaining.get_mut(dependent.as_str()) {
                        *in_degree -= 1;
                    }
                }
            }

            waves.push(wave);
        }

        Self { waves }
    }

    /// The teardown ordering: waves reversed, and each wave's internal
    /// order reversed, so nothing is removed before everything that
    /// depends on it.
    pub fn reverse(mut self) -> Self {
        self.waves.reverse();
        for wave in &mut self.waves {
            wave.reverse();
        }
        self
    }

    /// The waves, in execution order
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// Entry names flattened into a single total order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.waves.iter().flatten().map(String::as_str)
    }

    /// Total number of entries across all waves
    pub fn len(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// True when the plan schedules nothing
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }
}
