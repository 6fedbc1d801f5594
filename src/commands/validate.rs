//! `cascade validate` - pre-flight checks only

use crate::Context;
use crate::cli::ManifestArgs;
use anyhow::Result;
use colored::Colorize;
use conductor::Plan;

pub fn run(_ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let (_, graph) = super::load_graph(&args.manifest)?;
    let plan = Plan::of(&graph);

    println!(
        "  {} {} stacks across {} waves - manifest is valid",
        "✓".green(),
        graph.len(),
        plan.waves().len()
    );
    Ok(())
}
