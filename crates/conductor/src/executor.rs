//! Run driver - walks a plan wave by wave and drives each entry's
//! lifecycle against the backend
//!
//! Entries within a wave are independent by construction and are driven
//! concurrently on a worker pool; waves are strictly sequenced, so a
//! later wave never submits until every record of the current wave is
//! terminal. Failure is contagious downstream only: a failed or skipped
//! blocker forces its dependents to `Skipped`, unrelated branches keep
//! going, and the run always completes with a full per-entry report.

use crate::backend::{Action, Backend, Op, Poll};
use crate::context::{Cancel, Reporter};
use crate::entry::Entry;
use crate::graph::Graph;
use crate::plan::Plan;
use crate::types::{Options, Record, Report, Status};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Drive create-or-update requests in plan order.
pub fn deploy(
    graph: &Graph,
    plan: &Plan,
    backend: &dyn Backend,
    reporter: &dyn Reporter,
    options: &Options,
    cancel: &Cancel,
) -> Result<Report> {
    run(graph, plan, backend, reporter, options, cancel, Action::Deploy)
}

/// Drive delete requests; `plan` must be the reversed creation plan.
pub fn teardown(
    graph: &Graph,
    plan: &Plan,
    backend: &dyn Backend,
    reporter: &dyn Reporter,
    options: &Options,
    cancel: &Cancel,
) -> Result<Report> {
    run(graph, plan, backend, reporter, options, cancel, Action::Delete)
}

/// Per-wave view handed to workers: everything immutable, shared freely.
/// Each worker owns its entry's [`Record`] exclusively; the only
/// cross-entry state is the `terminal` map of earlier waves' outcomes.
struct WaveCtx<'a> {
    action: Action,
    graph: &'a Graph,
    backend: &'a dyn Backend,
    reporter: &'a dyn Reporter,
    options: &'a Options,
    cancel: &'a Cancel,
    terminal: &'a HashMap<String, Status>,
}

fn run(
    graph: &Graph,
    plan: &Plan,
    backend: &dyn Backend,
    reporter: &dyn Reporter,
    options: &Options,
    cancel: &Cancel,
    action: Action,
) -> Result<Report> {
    let started = Utc::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .build()
        .context("Failed to create wave worker pool")?;

    let total_waves = plan.waves().len();
    let mut terminal: HashMap<String, Status> = HashMap::with_capacity(plan.len());
    let mut records: Vec<Record> = Vec::with_capacity(plan.len());

    for (index, wave) in plan.waves().iter().enumerate() {
        reporter.wave_started(index, total_waves, wave);

        let entries: Vec<&Entry> = wave.iter().filter_map(|name| graph.get(name)).collect();
        let ctx = WaveCtx {
            action,
            graph,
            backend,
            reporter,
            options,
            cancel,
            terminal: &terminal,
        };

        let results: Arc<Mutex<Vec<Record>>> =
            Arc::new(Mutex::new(Vec::with_capacity(entries.len())));

        pool.install(|| {
            entries.par_iter().for_each(|entry| {
                let record = drive(&ctx, entry);
                ctx.reporter.entry_finished(&record);
                push_record(&results, record);
            });
        });

        let mut wave_records = into_records(results)?;
        // Records land in completion order; report in wave order.
        wave_records.sort_by_key(|r| wave.iter().position(|n| *n == r.name));

        for record in &wave_records {
            terminal.insert(record.name.clone(), record.status);
        }
        records.extend(wave_records);
    }

    Ok(Report {
        records,
        started,
        finished: Utc::now(),
    })
}

/// Drive one entry from `Pending` to a terminal state.
fn drive(ctx: &WaveCtx, entry: &Entry) -> Record {
    let name = entry.name();

    // Contagion gate. Blockers are dependencies when deploying and
    // dependents when tearing down: a failed delete aborts the rest of
    // its own dependency chain while independent branches continue.
    let blockers = match ctx.action {
        Action::Deploy => ctx.graph.dependencies(name),
        Action::Delete => ctx.graph.dependents(name),
    };
    if let Some(blocker) = blockers
        .iter()
        .find(|b| ctx.terminal.get(*b).copied().is_some_and(Status::is_blocking))
    {
        let reason = match ctx.action {
            Action::Deploy => format!("dependency {blocker} did not succeed"),
            Action::Delete => format!("dependent {blocker} was not removed"),
        };
        debug!("{name}: skipped ({reason})");
        return Record::skipped(name, reason);
    }

    if ctx.cancel.is_cancelled() {
        debug!("{name}: skipped (run cancelled)");
        return Record::skipped(name, "run cancelled before submission".to_string());
    }

    let mut record = Record::pending(name);
    let op = Op::new(entry, ctx.action);

    let handle = match ctx.backend.submit(&op) {
        Ok(handle) => handle,
        Err(err) => {
            warn!("{name}: submission rejected: {err:#}");
            record.status = Status::Failed;
            record.error = Some(format!("submission rejected: {err:#}"));
            return record;
        }
    };

    debug!("{name}: {} ({handle})", ctx.action.verb());
    record.status = Status::Submitted;
    record.handle = Some(handle.clone());
    ctx.reporter.entry_submitted(name, ctx.action);

    let deadline = Instant::now() + ctx.options.timeout;
    loop {
        match ctx.backend.status(&op, &handle) {
            Ok(Poll::Succeeded) => {
                record.status = Status::Succeeded;
                break;
            }
            Ok(Poll::Failed(reason)) => {
                warn!("{name}: failed: {reason}");
                record.status = Status::Failed;
                record.error = Some(reason);
                break;
            }
            Ok(Poll::InProgress) => {
                if Instant::now() >= deadline {
                    record.status = Status::Failed;
                    record.error = Some(format!(
                        "timed out after {}s waiting for a terminal status",
                        ctx.options.timeout.as_secs()
                    ));
                    break;
                }
                std::thread::sleep(ctx.options.poll_interval);
            }
            Err(err) => {
                record.status = Status::Failed;
                record.error = Some(format!("status check failed: {err:#}"));
                break;
            }
        }
    }

    record
}

fn push_record(results: &Arc<Mutex<Vec<Record>>>, record: Record) {
    match results.lock() {
        Ok(mut locked) => locked.push(record),
        Err(poisoned) => poisoned.into_inner().push(record),
    }
}

fn into_records(results: Arc<Mutex<Vec<Record>>>) -> Result<Vec<Record>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect wave records: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Silent;
    use std::collections::HashSet;
    use std::time::Duration;

    fn entry(name: &str, deps: &[&str]) -> Entry {
        Entry::new(
            name,
            format!("{name}-stack"),
            "template.yml",
            None,
            Vec::new(),
            deps.iter().map(|d| (*d).to_string()).collect(),
        )
        .unwrap()
    }

    fn options() -> Options {
        Options {
            jobs: 2,
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(1),
        }
    }

    /// Backend scripted per stack name: reject at submission, fail at
    /// poll, or hang in progress until the driver times out.
    #[derive(Default)]
    struct ScriptedBackend {
        reject: HashSet<String>,
        fail: HashSet<String>,
        hang: HashSet<String>,
        cancel_on_submit: Option<Cancel>,
        submitted: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn submitted(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    impl Backend for ScriptedBackend {
        fn submit(&self, op: &Op) -> Result<String> {
            if let Some(cancel) = &self.cancel_on_submit {
                cancel.cancel();
            }
            if self.reject.contains(&op.stack_name) {
                anyhow::bail!("scripted rejection");
            }
            self.submitted.lock().unwrap().push(op.stack_name.clone());
            Ok(format!("op-{}", op.stack_name))
        }

        fn status(&self, op: &Op, _handle: &str) -> Result<Poll> {
            if self.hang.contains(&op.stack_name) {
                return Ok(Poll::InProgress);
            }
            if self.fail.contains(&op.stack_name) {
                return Ok(Poll::Failed("scripted failure".to_string()));
            }
            Ok(Poll::Succeeded)
        }
    }

    fn run_deploy(entries: Vec<Entry>, backend: &ScriptedBackend) -> Report {
        let graph = Graph::build(entries).unwrap();
        let plan = Plan::of(&graph);
        deploy(&graph, &plan, backend, &Silent, &options(), &Cancel::new()).unwrap()
    }

    fn status_of<'a>(report: &'a Report, name: &str) -> &'a Record {
        report.records.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_all_succeed_in_plan_order() {
        let backend = ScriptedBackend::default();
        let report = run_deploy(
            vec![
                entry("base", &[]),
                entry("left", &["base"]),
                entry("right", &["base"]),
                entry("top", &["left", "right"]),
            ],
            &backend,
        );

        assert!(report.is_success());
        let names: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["base", "left", "right", "top"]);
        assert!(report.records.iter().all(|r| r.handle.is_some()));
    }

    #[test]
    fn test_failure_is_contagious_downstream_only() {
        let backend = ScriptedBackend {
            fail: ["network-stack".to_string()].into(),
            ..Default::default()
        };
        let report = run_deploy(
            vec![
                entry("network", &[]),
                entry("iam", &[]),
                entry("compute", &["network", "iam"]),
            ],
            &backend,
        );

        assert_eq!(status_of(&report, "iam").status, Status::Succeeded);
        assert_eq!(status_of(&report, "network").status, Status::Failed);

        let compute = status_of(&report, "compute");
        assert_eq!(compute.status, Status::Skipped);
        assert!(compute.error.as_deref().unwrap().contains("network"));
        assert!(compute.handle.is_none(), "skipped entries are never submitted");
    }

    #[test]
    fn test_submission_rejection_contained_to_subtree() {
        let backend = ScriptedBackend {
            reject: ["a-stack".to_string()].into(),
            ..Default::default()
        };
        let report = run_deploy(
            vec![entry("a", &[]), entry("b", &["a"]), entry("c", &[])],
            &backend,
        );

        let a = status_of(&report, "a");
        assert_eq!(a.status, Status::Failed);
        assert!(a.error.as_deref().unwrap().contains("rejection"));
        assert_eq!(status_of(&report, "b").status, Status::Skipped);
        assert_eq!(status_of(&report, "c").status, Status::Succeeded);
    }

    #[test]
    fn test_stuck_backend_times_out() {
        let backend = ScriptedBackend {
            hang: ["slow-stack".to_string()].into(),
            ..Default::default()
        };
        let graph = Graph::build(vec![entry("slow", &[])]).unwrap();
        let plan = Plan::of(&graph);
        let opts = Options {
            jobs: 1,
            poll_interval: Duration::from_millis(2),
            timeout: Duration::from_millis(20),
        };
        let report = deploy(&graph, &plan, &backend, &Silent, &opts, &Cancel::new()).unwrap();

        let slow = status_of(&report, "slow");
        assert_eq!(slow.status, Status::Failed);
        assert!(slow.error.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_cancellation_stops_new_submissions() {
        // The first submission flips the flag; the dependent wave must
        // then be skipped without reaching the backend.
        let cancel_seen = Cancel::new();
        let backend = ScriptedBackend {
            cancel_on_submit: Some(cancel_seen.clone()),
            ..Default::default()
        };
        let graph = Graph::build(vec![entry("a", &[]), entry("b", &["a"])]).unwrap();
        let plan = Plan::of(&graph);
        let report =
            deploy(&graph, &plan, &backend, &Silent, &options(), &cancel_seen).unwrap();

        assert_eq!(status_of(&report, "a").status, Status::Succeeded);
        let b = status_of(&report, "b");
        assert_eq!(b.status, Status::Skipped);
        assert!(b.error.as_deref().unwrap().contains("cancelled"));
        assert_eq!(backend.submitted(), vec!["a-stack".to_string()]);
    }

    #[test]
    fn test_precancelled_run_submits_nothing() {
        let backend = ScriptedBackend::default();
        let cancel = Cancel::new();
        cancel.cancel();

        let graph = Graph::build(vec![entry("a", &[]), entry("b", &["a"])]).unwrap();
        let plan = Plan::of(&graph);
        let report = deploy(&graph, &plan, &backend, &Silent, &options(), &cancel).unwrap();

        assert_eq!(report.count(Status::Skipped), 2);
        assert!(backend.submitted().is_empty());
    }

    #[test]
    fn test_teardown_failed_delete_aborts_own_chain() {
        // c -> b -> a chain plus an independent d. Teardown starts at c;
        // its failed delete must strand b and a while d proceeds.
        let backend = ScriptedBackend {
            fail: ["c-stack".to_string()].into(),
            ..Default::default()
        };
        let graph = Graph::build(vec![
            entry("a", &[]),
            entry("b", &["a"]),
            entry("c", &["b"]),
            entry("d", &[]),
        ])
        .unwrap();
        let plan = Plan::of(&graph).reverse();
        let report =
            teardown(&graph, &plan, &backend, &Silent, &options(), &Cancel::new()).unwrap();

        assert_eq!(status_of(&report, "c").status, Status::Failed);
        let b = status_of(&report, "b");
        assert_eq!(b.status, Status::Skipped);
        assert!(b.error.as_deref().unwrap().contains("dependent c"));
        assert_eq!(status_of(&report, "a").status, Status::Skipped);
        assert_eq!(status_of(&report, "d").status, Status::Succeeded);
    }

    #[test]
    fn test_waves_are_sequenced() {
        let backend = ScriptedBackend::default();
        run_deploy(
            vec![
                entry("a", &[]),
                entry("b", &[]),
                entry("c", &["a", "b"]),
                entry("d", &["c"]),
            ],
            &backend,
        );

        let submitted = backend.submitted();
        let position = |stack: &str| submitted.iter().position(|s| s == stack).unwrap();
        assert!(position("c-stack") > position("a-stack"));
        assert!(position("c-stack") > position("b-stack"));
        assert!(position("d-stack") > position("c-stack"));
    }

    #[test]
    fn test_empty_plan_reports_success() {
        let backend = ScriptedBackend::default();
        let report = run_deploy(Vec::new(), &backend);
        assert!(report.is_success());
        assert!(report.records.is_empty());
    }
}
