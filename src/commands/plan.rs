//! `cascade plan` - show both orderings without touching the backend

use crate::Context;
use crate::cli::ManifestArgs;
use crate::ui;
use anyhow::Result;
use conductor::Plan;

pub fn run(ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let (_, graph) = super::load_graph(&args.manifest)?;
    let plan = Plan::of(&graph);

    ui::print_plan(&plan, "Deployment order");
    ui::print_plan(&plan.reverse(), "Teardown order");

    if ctx.verbose > 0 {
        println!();
        for entry in graph.entries() {
            println!(
                "  {} -> {} ({})",
                entry.name(),
                entry.stack_name(),
                entry.template().display()
            );
        }
    }
    Ok(())
}
