//! Command implementations

pub mod deploy;
pub mod plan;
pub mod teardown;
pub mod validate;

use crate::cli::RunArgs;
use crate::config::Manifest;
use anyhow::Result;
use conductor::{Graph, Options};
use std::path::Path;
use std::time::Duration;

/// Load the manifest and build the validated graph; every pre-flight
/// error (unreadable file, malformed entry, duplicate, dangling
/// reference, cycle) surfaces here before anything touches AWS.
pub fn load_graph(path: &Path) -> Result<(Manifest, Graph)> {
    let manifest = Manifest::load(path)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let entries = manifest.entries(base)?;
    let graph = Graph::build(entries)?;
    Ok((manifest, graph))
}

/// Translate CLI flags into engine options
pub fn run_options(args: &RunArgs) -> Options {
    Options {
        jobs: args.jobs.max(1),
        poll_interval: Duration::from_secs(args.poll_interval),
        timeout: Duration::from_secs(args.timeout),
    }
}

/// Confirm with user
pub fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
