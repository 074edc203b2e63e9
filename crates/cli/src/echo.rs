use blinkpress_core::{ItemOutcome, RunReport};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Blinkpress".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Turn reader pages into documents\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print elapsed time for a run
pub fn print_timing(label: &str, duration: std::time::Duration) {
    eprintln!(
        "  {} {:>8.2}s",
        format!("{}:", label).dimmed(),
        duration.as_secs_f64()
    );
}

/// Print one line per book followed by the "N of M" summary
pub fn print_report(report: &RunReport) {
    for (item, outcome) in &report.results {
        match outcome {
            ItemOutcome::Completed(document) => {
                let size = std::fs::metadata(&document.path)
                    .map(|m| format_size(m.len() as usize))
                    .unwrap_or_else(|_| "?".to_string());
                print_success(&format!(
                    "{} {} ({} sections, {})",
                    item,
                    document.path.display().bright_white(),
                    document.section_count,
                    size
                ));
            }
            ItemOutcome::Failed(err) if outcome.is_cancelled() => print_warning(&format!("{}: {}", item, err)),
            ItemOutcome::Failed(err) => print_error(&format!("{}: {}", item, err)),
        }
    }

    let summary = format!("{} of {} books completed", report.succeeded(), report.total());
    if report.is_success() {
        print_success(&summary);
    } else {
        print_error(&summary);
    }
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
