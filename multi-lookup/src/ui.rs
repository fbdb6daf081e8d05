//! Terminal display for the multi-lookup CLI.
//!
//! Everything human-facing goes to stderr so stdout carries only the JSON
//! report when `--json` is given.

use console::{pad_str, style, Alignment, Term};
use multi_lookup_lib::RunReport;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille-dot spinner with an elapsed-time counter, drawn on stderr.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let started = Instant::now();
            let mut frame = 0usize;
            while flag.load(Ordering::Relaxed) {
                let _ = term.clear_line();
                let _ = term.write_str(&format!(
                    "{} {} {}",
                    style(SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]).cyan(),
                    message,
                    style(format!("({:.1}s)", started.elapsed().as_secs_f64())).dim()
                ));
                frame += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Print the run report as pretty JSON on stdout.
pub fn print_json_report(report: &RunReport) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Print a styled run summary on stderr.
pub fn print_summary(report: &RunReport, output: &Path) {
    let term = Term::stderr();
    let row = |label: &str, value: String| {
        let _ = term.write_line(&format!(
            "  {}  {}",
            style(pad_str(label, 18, Alignment::Left, None)).dim(),
            value
        ));
    };

    let _ = term.write_line(&format!(
        "{} {}",
        style("multi-lookup").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    ));

    row(
        "Input files",
        format!(
            "{} ({} skipped)",
            report.input_files,
            report.failed_inputs.len()
        ),
    );
    row("Hostnames", report.enqueued.to_string());
    row("Resolved", style(report.resolved).green().bold().to_string());
    row("Not found", style(report.unresolved).yellow().to_string());
    row("Errors", colored_count(report.errors));
    row(
        "Written",
        format!("{} to {}", report.written, output.display()),
    );
    if report.write_failures > 0 {
        row("Write failures", colored_count(report.write_failures));
    }
    row(
        "Resolvers",
        format!(
            "{} (queue peak {})",
            report.resolver_threads, report.queue_high_water
        ),
    );
    row("Elapsed", format_elapsed(report.elapsed_ms));

    for path in &report.failed_inputs {
        let _ = term.write_line(&format!(
            "  {} {}",
            style("skipped").red(),
            style(path).dim()
        ));
    }
}

fn colored_count(n: u64) -> String {
    if n == 0 {
        style(n).dim().to_string()
    } else {
        style(n).red().bold().to_string()
    }
}

/// `850ms`, `2.4s`, `1m 05s`
fn format_elapsed(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}
