//! Terminal rendering for plans and run reports

use colored::Colorize;
use conductor::{Plan, Report, Status};

/// Display a plan's waves in execution order
pub fn print_plan(plan: &Plan, title: &str) {
    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        title.bold()
    );
    println!("│");

    for (index, wave) in plan.waves().iter().enumerate() {
        let parallel_note = if wave.len() > 1 {
            format!("({} in parallel)", wave.len()).dimmed().to_string()
        } else {
            String::new()
        };
        println!("│ {} {}", format!("Wave {}", index + 1).bold(), parallel_note);
        for name in wave {
            println!("│   • {name}");
        }
        println!("│");
    }

    println!(
        "├─────────────────────────────────────────────────────┤"
    );
    println!(
        "│ {} stacks across {} waves",
        plan.len().to_string().bold(),
        plan.waves().len()
    );
    println!(
        "└─────────────────────────────────────────────────────┘"
    );
}

/// Enumerate every entry with its terminal status and error detail
pub fn print_report(report: &Report) {
    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────────┐",
        "Run Report".bold()
    );
    println!("│");

    for record in &report.records {
        let symbol = match record.status {
            Status::Succeeded => "✓".green(),
            Status::Failed => "✗".red(),
            Status::Skipped => "⊘".yellow(),
            Status::Pending | Status::Submitted => "…".dimmed(),
        };
        println!(
            "│ {} {:<24} {}",
            symbol,
            record.name,
            record.status.label().dimmed()
        );
        if let Some(error) = &record.error {
            println!("│     {}", error.dimmed());
        }
    }

    println!("│");
    println!(
        "├─────────────────────────────────────────────────────────┤"
    );
    println!(
        "│ {} succeeded, {} failed, {} skipped",
        report.count(Status::Succeeded).to_string().green(),
        report.count(Status::Failed).to_string().red(),
        report.count(Status::Skipped).to_string().yellow()
    );
    println!(
        "└─────────────────────────────────────────────────────────┘"
    );

    if report.is_success() {
        println!();
        println!("  {} All stacks reached their target state", "✓".green().bold());
    }
}
