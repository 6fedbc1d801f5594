//! Core types for deployment runs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Lifecycle state of one entry within a run.
///
/// `Pending -> Submitted -> (Succeeded | Failed)`, with `Skipped` taken
/// instead of `Submitted` when a blocker already ended in
/// `Failed`/`Skipped`. Terminal states are never revisited within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Not yet gated or submitted
    Pending,
    /// Request accepted by the backend, awaiting a terminal status
    Submitted,
    /// Backend reported terminal success
    Succeeded,
    /// Backend rejected or failed the operation, or polling timed out
    Failed,
    /// Never submitted: a blocker failed, was skipped, or the run was cancelled
    Skipped,
}

impl Status {
    /// True once no further transition can occur
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// True when this status forces dependents to `Skipped`
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Failed | Self::Skipped)
    }

    /// Lowercase label for display and logs
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Per-entry runtime state, owned by the worker driving that entry.
///
/// Records are created when the run first touches an entry and discarded
/// with the [`Report`]; the backend remains the durable source of truth
/// for what actually exists.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Entry name
    pub name: String,
    /// Current lifecycle state
    pub status: Status,
    /// Backend operation identifier, once submitted
    pub handle: Option<String>,
    /// Captured error detail for `Failed`, or the skip reason for `Skipped`
    pub error: Option<String>,
}

impl Record {
    pub(crate) fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Pending,
            handle: None,
            error: None,
        }
    }

    pub(crate) fn skipped(name: &str, reason: String) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Skipped,
            handle: None,
            error: Some(reason),
        }
    }
}

/// Tuning knobs for a run
#[derive(Debug, Clone)]
pub struct Options {
    /// Worker threads per wave; entries within a wave are driven concurrently
    pub jobs: usize,
    /// Delay between backend status polls
    pub poll_interval: Duration,
    /// Per-entry allowance from submission to a terminal status; once
    /// exceeded the entry is forced to `Failed`
    pub timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            jobs: 4,
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(1800),
        }
    }
}

/// Outcome of a run: every entry with its terminal status, in plan order
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Per-entry records in plan order
    pub records: Vec<Record>,
    /// When the run started
    pub started: DateTime<Utc>,
    /// When the last record became terminal
    pub finished: DateTime<Utc>,
}

impl Report {
    /// Number of records with the given status
    pub fn count(&self, status: Status) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// True when every entry succeeded
    pub fn is_success(&self) -> bool {
        self.records.iter().all(|r| r.status == Status::Succeeded)
    }

    /// Records that did not succeed
    pub fn problems(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(|r| r.status != Status::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_and_blocking() {
        assert!(Status::Succeeded.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(Status::Skipped.is_terminal());
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Submitted.is_terminal());

        assert!(Status::Failed.is_blocking());
        assert!(Status::Skipped.is_blocking());
        assert!(!Status::Succeeded.is_blocking());
    }

    #[test]
    fn test_report_counts() {
        let now = Utc::now();
        let report = Report {
            records: vec![
                Record {
                    name: "a".into(),
                    status: Status::Succeeded,
                    handle: None,
                    error: None,
                },
                Record {
                    name: "b".into(),
                    status: Status::Failed,
                    handle: None,
                    error: Some("boom".into()),
                },
                Record::skipped("c", "dependency b failed".into()),
            ],
            started: now,
            finished: now,
        };
        assert_eq!(report.count(Status::Succeeded), 1);
        assert_eq!(report.count(Status::Failed), 1);
        assert_eq!(report.count(Status::Skipped), 1);
        assert!(!report.is_success());
        assert_eq!(report.problems().count(), 2);
    }
}
