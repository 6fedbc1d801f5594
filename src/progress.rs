//! Live progress display for deployment runs
//!
//! Implements the engine's `Reporter` seam on top of an indicatif bar.
//! Workers in a wave report concurrently, so everything goes through the
//! bar's own synchronization (`println` keeps finished lines above it).

use colored::Colorize;
use conductor::{Action, Record, Reporter, Status};
use indicatif::{ProgressBar, ProgressStyle};

pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(total_entries: u64) -> Self {
        let bar = ProgressBar::new(total_entries);
        bar.set_style(
            ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Reporter for ConsoleReporter {
    fn wave_started(&self, index: usize, total: usize, names: &[String]) {
        self.bar.println(format!(
            "  {} Wave {}/{}: {}",
            "→".cyan(),
            index + 1,
            total,
            names.join(", ")
        ));
    }

    fn entry_submitted(&self, name: &str, action: Action) {
        self.bar.set_message(format!("{} {name}", action.verb()));
    }

    fn entry_finished(&self, record: &Record) {
        let symbol = match record.status {
            Status::Succeeded => "✓".green(),
            Status::Failed => "✗".red(),
            Status::Skipped => "⊘".yellow(),
            Status::Pending | Status::Submitted => "…".dimmed(),
        };
        self.bar.println(format!(
            "    {symbol} {} {}",
            record.name,
            record.status.label().dimmed()
        ));
        self.bar.inc(1);
    }
}
