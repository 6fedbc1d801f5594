//! `cascade teardown` - delete every stack in reverse dependency order

use crate::Context;
use crate::aws::AwsCli;
use crate::cli::RunArgs;
use crate::progress::ConsoleReporter;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use conductor::{Cancel, Plan, Report, Silent};

pub fn run(ctx: &Context, args: &RunArgs) -> Result<()> {
    let (_, graph) = super::load_graph(&args.manifest)?;
    if graph.is_empty() {
        println!("  {} Manifest defines no stacks", "ℹ".blue());
        return Ok(());
    }

    let plan = Plan::of(&graph).reverse();
    if !ctx.quiet {
        ui::print_plan(&plan, "Teardown order");
        println!(
            "  {} This deletes {} stacks and their resources",
            "⚠".yellow(),
            plan.len()
        );
    }

    if !args.yes && !super::confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let aws = AwsCli::new(args.region.clone(), args.profile.clone());
    let options = super::run_options(args);
    let cancel = Cancel::new();

    let report: Report = if ctx.quiet {
        conductor::teardown(&graph, &plan, &aws, &Silent, &options, &cancel)?
    } else {
        let reporter = ConsoleReporter::new(plan.len() as u64);
        let report = conductor::teardown(&graph, &plan, &aws, &reporter, &options, &cancel)?;
        reporter.finish();
        report
    };

    ui::print_report(&report);

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} stacks were not removed",
            report.problems().count(),
            report.records.len()
        );
    }
    Ok(())
}
