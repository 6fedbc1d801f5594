//! `cascade deploy` - create or update every stack in dependency order

use crate::Context;
use crate::aws::AwsCli;
use crate::cli::RunArgs;
use crate::keys;
use crate::progress::ConsoleReporter;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use conductor::{Cancel, Plan, Report, Silent};
use std::path::Path;

pub fn run(ctx: &Context, args: &RunArgs) -> Result<()> {
    let (manifest, graph) = super::load_graph(&args.manifest)?;
    if graph.is_empty() {
        println!("  {} Manifest defines no stacks", "ℹ".blue());
        return Ok(());
    }

    let plan = Plan::of(&graph);
    if !ctx.quiet {
        ui::print_plan(&plan, "Deployment order");
    }

    if !args.yes && !super::confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let aws = AwsCli::new(args.region.clone(), args.profile.clone());
    keys::ensure_key_pairs(&aws, &manifest.ssh_key_names(), Path::new(keys::KEY_DIR))?;

    let options = super::run_options(args);
    let cancel = Cancel::new();

    let report: Report = if ctx.quiet {
        conductor::deploy(&graph, &plan, &aws, &Silent, &options, &cancel)?
    } else {
        let reporter = ConsoleReporter::new(plan.len() as u64);
        let report = conductor::deploy(&graph, &plan, &aws, &reporter, &options, &cancel)?;
        reporter.finish();
        report
    };

    ui::print_report(&report);

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} stacks did not reach their target state",
            report.problems().count(),
            report.records.len()
        );
    }
    Ok(())
}
