//! End-of-run summary

use colored::*;
use std::fmt::Write;
use std::time::Duration;

use crate::instrument::{RequestStats, RequestSummary};
use crate::swarm::SwarmOutcome;

/// Renders the request table, distinct errors and totals
pub fn render(stats: &RequestStats, outcome: &SwarmOutcome, elapsed: Duration) -> String {
    let mut out = String::new();
    let summaries = stats.summaries();

    let _ = writeln!(out, "{}", "Request statistics".bold());
    let _ = writeln!(out, "{}", "─".repeat(96).dimmed());
    let _ = writeln!(
        out,
        "{:<28} {:>8} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "Name", "# reqs", "# fails", "Avg (ms)", "Min (ms)", "Max (ms)", "Med (ms)"
    );
    let _ = writeln!(out, "{}", "─".repeat(96).dimmed());

    if summaries.is_empty() {
        let _ = writeln!(out, "{}", "No requests recorded.".yellow());
    }
    for summary in &summaries {
        let _ = writeln!(out, "{}", summary_row(summary));
    }
    let _ = writeln!(out, "{}", "─".repeat(96).dimmed());

    let errors = stats.errors();
    if !errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Errors".bold());
        for (name, message, count) in errors {
            let _ = writeln!(out, "  {:>5}x {} {}", count, name.cyan(), message.red());
        }
    }

    let ratio = stats.fail_ratio() * 100.0;
    let ratio = if stats.total_failures() == 0 {
        format!("{:.1}%", ratio).green()
    } else {
        format!("{:.1}%", ratio).red()
    };

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} {} iteration(s), {} aborted, {} request(s), fail ratio {} in {:.1}s",
        "Total:".bold(),
        outcome.iterations,
        outcome.aborted,
        stats.total_requests(),
        ratio,
        elapsed.as_secs_f64()
    );

    out
}

fn summary_row(summary: &RequestSummary) -> String {
    let fails = if summary.num_failures == 0 {
        summary.num_failures.to_string().normal()
    } else {
        summary.num_failures.to_string().red()
    };

    format!(
        "{:<28} {:>8} {:>8} {:>10.0} {:>10} {:>10} {:>10}",
        summary.name,
        summary.num_requests,
        fails,
        summary.avg_ms,
        summary.min_ms,
        summary.max_ms,
        summary.median_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_requests_and_errors() {
        colored::control::set_override(false);

        let stats = RequestStats::new();
        stats.record_success("create_run", Duration::from_millis(120));
        stats.record_failure(
            "poll_run_await_completion",
            Duration::from_secs(400),
            "run 7 did not complete after 40 attempt(s)",
        );

        let outcome = SwarmOutcome {
            iterations: 1,
            aborted: 0,
        };
        let report = render(&stats, &outcome, Duration::from_secs(401));

        assert!(report.contains("create_run"));
        assert!(report.contains("poll_run_await_completion"));
        assert!(report.contains("1x poll_run_await_completion run 7 did not complete"));
        assert!(report.contains("fail ratio 50.0%"));
    }

    #[test]
    fn test_render_empty() {
        colored::control::set_override(false);

        let report = render(
            &RequestStats::new(),
            &SwarmOutcome::default(),
            Duration::ZERO,
        );
        assert!(report.contains("No requests recorded."));
        assert!(!report.contains("Errors"));
    }
}
