//! Console reporter - step banners and the final summary

use chtholly_build::{BuildReport, CommandSpec, SequenceObserver, StepKind, StepRecord};
use colored::*;

/// Prints a banner as each step starts and flags failures as they happen
pub struct ConsoleReporter {
    /// Echo spawned commands
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl SequenceObserver for ConsoleReporter {
    fn step_started(&mut self, step: StepKind, command: Option<&CommandSpec>) {
        println!("{} {}", "==>".cyan().bold(), step.title().bold());
        if self.verbose {
            if let Some(command) = command {
                println!("    {}", format!("$ {}", command).dimmed());
            }
        }
    }

    fn step_finished(&mut self, record: &StepRecord) {
        if record.is_fatal() {
            eprintln!("{} {}: {}", "error:".red().bold(), record.step, record.describe());
        } else if record.is_advisory_failure() {
            eprintln!(
                "{} {}: {}",
                "warning:".yellow().bold(),
                record.step,
                record.describe()
            );
        }
    }
}

/// Summary block listing every executed step and the verdict
pub fn render_summary(report: &BuildReport) -> String {
    let rule = "=".repeat(60);
    let mut lines = vec![rule.clone()];

    let headline = report.headline();
    lines.push(if report.success() {
        headline.green().bold().to_string()
    } else {
        headline.red().bold().to_string()
    });
    lines.push(rule.clone());

    for record in &report.steps {
        let status = if record.is_fatal() {
            record.describe().red().to_string()
        } else if record.is_advisory_failure() {
            record.describe().yellow().to_string()
        } else {
            record.describe()
        };
        lines.push(format!("  {:<18} {}", record.step.name(), status));
    }

    let advisories: Vec<&StepRecord> = report.advisories().collect();
    if !advisories.is_empty() {
        lines.push(String::new());
        lines.push("  Advisories:".to_string());
        for record in advisories {
            lines.push(format!("    {}: {}", record.step, record.describe()));
        }
    }

    if !report.success() {
        lines.push(format!("  Exit code: {}", report.exit_code()));
    }

    lines.push(rule);
    lines.join("\n")
}

pub fn print_summary(report: &BuildReport) {
    println!();
    println!("{}", render_summary(report));
}

/// Quiet mode: replay the failing step's captured output, then the verdict
pub fn print_failure(report: &BuildReport) {
    let Some(record) = report.fatal_failure() else {
        return;
    };

    if !record.output.is_empty() {
        eprint!("{}", record.output);
    }
    eprintln!("{} {}", "error:".red().bold(), report.headline());
}
