use std::path::Path;

use recon_core::compare::{ContentResult, RowCountResult};
use recon_core::RunOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Default,
    Quiet,
    Verbose,
}

pub fn format_run_output(outcome: &RunOutcome, mode: OutputMode) -> String {
    let mut lines = Vec::new();

    if mode != OutputMode::Quiet {
        lines.push(format!("validation: {}", &outcome.validation_name));
        lines.push(format!(
            "process datetime: {}",
            outcome.process_datetime.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(format_row_count_line(&outcome.row_count));
        lines.push(format_content_line(outcome.content.as_ref()));
        if mode == OutputMode::Verbose {
            lines.push(format!("  summary log: {}", &outcome.summary_log_path));
            lines.push(format!("  report file: {}", outcome.report_file.display()));
        } else {
            lines.push(format!("report: {}", short_path(&outcome.report_file)));
        }
    }

    lines.push(format!(
        "Overall: {} (elapsed_ms={})",
        format_status(outcome.is_passed()),
        outcome.elapsed_ms
    ));

    lines.join("\n")
}

fn format_row_count_line(result: &RowCountResult) -> String {
    format!(
        "  {} row count source={} target={} diff={} ({:.2}%) threshold={}%",
        format_check(result.is_passed),
        result.count_source,
        result.count_target,
        result.count_diff,
        result.percentage_diff,
        result.threshold
    )
}

fn format_content_line(result: Option<&ContentResult>) -> String {
    let Some(result) = result else {
        return "  SKIPPED content".to_string();
    };
    let show = |count: Option<u64>| count.map_or_else(|| "-".to_string(), |n| n.to_string());
    format!(
        "  {} content schema_match={} source_only={} target_only={}",
        format_check(result.is_passed),
        result.schema_match,
        show(result.rows_only_in_source),
        show(result.rows_only_in_target)
    )
}

fn format_check(passed: bool) -> &'static str {
    if passed {
        "PASSED"
    } else {
        "FAILED"
    }
}

fn format_status(passed: bool) -> &'static str {
    if passed {
        "passed"
    } else {
        "failed"
    }
}

fn short_path(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
