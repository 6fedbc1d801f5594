//! Pre-flight error types
//!
//! Everything here is fatal before any backend call is made: a run either
//! passes validation and graph construction cleanly or nothing is
//! submitted. Per-entry runtime failures are not errors in this sense;
//! they are captured in each entry's [`Record`](crate::types::Record) and
//! the run completes with a report.

use thiserror::Error;

/// Errors detected while constructing a single [`Entry`](crate::Entry)
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Entry name is empty or whitespace
    #[error("entry name must not be empty")]
    EmptyName,

    /// Backend stack name is empty or whitespace
    #[error("entry {entry}: stack name must not be empty")]
    EmptyStackName {
        /// Name of the offending entry
        entry: String,
    },

    /// Entry lists itself in `depends_on`
    #[error("entry {entry} depends on itself")]
    SelfDependency {
        /// Name of the offending entry
        entry: String,
    },
}

/// Errors detected while building the dependency graph from a collection
/// of entries
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two entries share a name
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// An entry depends on a name absent from the collection
    #[error("entry {entry} depends on unknown entry {missing}")]
    DanglingDependency {
        /// Entry holding the dangling reference
        entry: String,
        /// The name that could not be resolved
        missing: String,
    },

    /// The dependency relation contains a cycle
    #[error("cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency {
        /// The cycle, first node repeated at the end
        path: Vec<String>,
    },
}
