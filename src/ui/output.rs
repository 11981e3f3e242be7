use crate::query::Verdict;
use crate::storage::LoadOutcome;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// Feedback line for a graded query
pub fn verdict(verdict: &Verdict) {
    match verdict {
        Verdict::Correct => {
            println!("{} {}", Icons::CHECK, verdict.message().style(theme().correct.clone()))
        }
        Verdict::Incorrect => {
            println!("{} {}", Icons::CROSS, verdict.message().style(theme().incorrect.clone()))
        }
        Verdict::Failed(_) => error(&verdict.message()),
    }
}

/// Summary of a dataset initialization
pub fn load_outcome(dataset: &str, outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::AlreadyPresent => {
            status(Icons::DATABASE, dataset, &muted("already loaded"));
        }
        LoadOutcome::Loaded(report) => {
            success(&format!(
                "{}: {}/{} statements executed",
                dataset, report.executed, report.statements
            ));
            for failure in &report.failures {
                warn(&format!("statement {} skipped: {}", failure.index + 1, failure.message));
                summary_row("sql", &failure.sql);
            }
            if let Some(rest) = &report.trailing {
                warn(&format!("unterminated text at end of script ignored: {}", rest));
            }
        }
        LoadOutcome::Aborted { reason } => {
            error(&format!("{}: {}", dataset, reason));
        }
    }
}
