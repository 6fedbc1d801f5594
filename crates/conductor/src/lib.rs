//! # Conductor
//!
//! A dependency-ordered deployment engine.
//!
//! This crate turns an unordered collection of named deployable entries
//! with `depends_on` relationships into a validated graph, a wave-grouped
//! deployment plan, and a driven run: each entry's create-or-update (or
//! delete) request is submitted to a provisioning backend and polled to a
//! terminal state before its dependents unblock.
//!
//! ## Core Concepts
//!
//! - **Entry**: one named deployable unit (stack name, template and
//!   parameter locators, capability flags, dependency names)
//! - **Graph**: the validated, acyclic dependency view over the entries
//! - **Plan**: waves of entries whose dependencies are satisfied by
//!   earlier waves; reversed for teardown
//! - **Executor**: drives each entry `Pending -> Submitted -> terminal`,
//!   with downstream failure contagion and bounded polling
//!
//! ## Example
//!
//! ```ignore
//! use conductor::{deploy, Cancel, Entry, Graph, Options, Plan, Silent};
//!
//! let entries = vec![
//!     Entry::new("network", "prod-network", "network.yml", None, vec![], vec![])?,
//!     Entry::new("compute", "prod-compute", "compute.yml", None, vec![],
//!                vec!["network".to_string()])?,
//! ];
//!
//! let graph = Graph::build(entries)?;
//! let plan = Plan::of(&graph);
//!
//! // `backend` is anything implementing conductor::Backend
//! let report = deploy(&graph, &plan, &backend, &Silent,
//!                     &Options::default(), &Cancel::new())?;
//! assert!(report.is_success());
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`Backend`]: submits requests and answers status polls
//! - [`Reporter`]: receives state transitions for display
//!
//! This keeps the engine free of any particular cloud client or terminal
//! UI; the run functions work unchanged against mocks in tests.

pub mod backend;
pub mod context;
pub mod entry;
pub mod error;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod types;

// Re-export main types at crate root
pub use backend::{Action, Backend, Op, Poll};
pub use context::{Cancel, Reporter, Silent};
pub use entry::Entry;
pub use error::{GraphError, ValidationError};
pub use executor::{deploy, teardown};
pub use graph::Graph;
pub use plan::Plan;
pub use types::{Options, Record, Report, Status};
