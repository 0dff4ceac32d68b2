use serde::Serialize;

use crate::engine::Dataset;
use crate::{ComparisonError, ReconResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowCountResult {
    pub count_source: u64,
    pub count_target: u64,
    pub count_diff: u64,
    pub percentage_diff: f64,
    pub threshold: u8,
    pub is_passed: bool,
}

/// Difference as a percentage of the source count. An empty source compares as
/// 0% against an empty target and as 100% against anything else.
pub fn percentage_diff(count_source: u64, count_target: u64) -> f64 {
    let count_diff = count_source.abs_diff(count_target);
    if count_source == 0 {
        return if count_target == 0 { 0.0 } else { 100.0 };
    }
    count_diff as f64 / count_source as f64 * 100.0
}

pub fn compare_counts(
    count_source: u64,
    count_target: u64,
    threshold: u8,
) -> Result<RowCountResult, ComparisonError> {
    if threshold > 100 {
        return Err(ComparisonError(format!(
            "threshold must be between 0 and 100, got {threshold}"
        )));
    }
    let percentage_diff = percentage_diff(count_source, count_target);
    Ok(RowCountResult {
        count_source,
        count_target,
        count_diff: count_source.abs_diff(count_target),
        percentage_diff,
        threshold,
        is_passed: percentage_diff <= f64::from(threshold),
    })
}

/// Counts both datasets and checks the difference against `threshold` percent.
pub fn validate_row_count(
    source: &dyn Dataset,
    target: &dyn Dataset,
    threshold: u8,
) -> ReconResult<RowCountResult> {
    let count_source = source.count()?;
    let count_target = target.count()?;
    let result = compare_counts(count_source, count_target, threshold)?;

    tracing::info!(
        count_source = result.count_source,
        count_target = result.count_target,
        count_diff = result.count_diff,
        percentage_diff = result.percentage_diff,
        threshold = result.threshold,
        is_passed = result.is_passed,
        "row count validation results:\n\
         source count:         {}\n\
         target count:         {}\n\
         count diff:           {}\n\
         percentage diff:      {:.4}\n\
         threshold:            {}\n\
         validation passed:    {}",
        result.count_source,
        result.count_target,
        result.count_diff,
        result.percentage_diff,
        result.threshold,
        result.is_passed,
    );
    Ok(result)
}
