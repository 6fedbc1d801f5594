//! Provisioning backend trait
//!
//! The engine consumes the cloud API through this narrow seam: submit a
//! request, then poll the resulting operation until it reaches a terminal
//! state. Template and parameter locators pass through opaquely; whatever
//! resolves them lives behind the trait.

use crate::entry::Entry;
use anyhow::Result;
use std::path::PathBuf;

/// What a submission asks the backend to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create the stack, or update it if it already exists
    Deploy,
    /// Delete the stack
    Delete,
}

impl Action {
    /// Verb for logs and progress lines
    pub fn verb(self) -> &'static str {
        match self {
            Self::Deploy => "deploying",
            Self::Delete => "deleting",
        }
    }
}

/// One request to the backend, carrying everything it needs from the entry
#[derive(Debug, Clone)]
pub struct Op {
    pub action: Action,
    pub stack_name: String,
    pub template: PathBuf,
    pub parameters: Option<PathBuf>,
    pub capabilities: Vec<String>,
}

impl Op {
    /// Build the request for an entry
    pub fn new(entry: &Entry, action: Action) -> Self {
        Self {
            action,
            stack_name: entry.stack_name().to_string(),
            template: entry.template().to_path_buf(),
            parameters: entry.parameters().map(Into::into),
            capabilities: entry.capabilities().to_vec(),
        }
    }
}

/// Result of one status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// Operation still running; poll again after the configured interval
    InProgress,
    /// Operation reached terminal success
    Succeeded,
    /// Operation reached terminal failure, with the backend's reason
    Failed(String),
}

/// The cloud provisioning API, reduced to what the engine needs.
///
/// `submit` returns an opaque operation handle; `status` interprets that
/// handle. A synchronous `Err` from `submit` marks the entry `Failed`
/// without any polling; an `Err` from `status` is treated as a terminal
/// failure for that entry rather than retried.
pub trait Backend: Send + Sync {
    /// Issue the request. For [`Action::Deploy`] this is create-or-update;
    /// for [`Action::Delete`] a delete.
    fn submit(&self, op: &Op) -> Result<String>;

    /// Check on a previously submitted operation.
    fn status(&self, op: &Op, handle: &str) -> Result<Poll>;
}
