use serde::Serialize;

use crate::engine::{ColumnSchema, Dataset};
use crate::ReconResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentResult {
    pub schema_match: bool,
    /// `None` when the schemas differ and no diff was computed.
    pub rows_only_in_source: Option<u64>,
    pub rows_only_in_target: Option<u64>,
    pub is_passed: bool,
}

impl ContentResult {
    fn schema_mismatch() -> Self {
        Self {
            schema_match: false,
            rows_only_in_source: None,
            rows_only_in_target: None,
            is_passed: false,
        }
    }
}

/// Compares the distinct rows of both datasets. Differing column sequences end
/// the check as failed without computing a diff; that is a result, not an error.
pub fn validate_content(source: &dyn Dataset, target: &dyn Dataset) -> ReconResult<ContentResult> {
    if source.columns() != target.columns() {
        let result = ContentResult::schema_mismatch();
        log_result(&result);
        tracing::info!(schema = %render_schema(&source.schema()), "source schema");
        tracing::info!(schema = %render_schema(&target.schema()), "target schema");
        return Ok(result);
    }

    let source_rows = source.distinct_fingerprints()?;
    let target_rows = target.distinct_fingerprints()?;
    let only_in_source = source_rows.difference(&target_rows).count() as u64;
    let only_in_target = target_rows.difference(&source_rows).count() as u64;
    let result = ContentResult {
        schema_match: true,
        rows_only_in_source: Some(only_in_source),
        rows_only_in_target: Some(only_in_target),
        is_passed: only_in_source == 0 && only_in_target == 0,
    };
    log_result(&result);
    Ok(result)
}

fn log_result(result: &ContentResult) {
    let show = |count: Option<u64>| count.map_or_else(|| "N/A".to_string(), |n| n.to_string());
    tracing::info!(
        schema_match = result.schema_match,
        is_passed = result.is_passed,
        "content validation results:\n\
         schema match:         {}\n\
         source not in target: {}\n\
         target not in source: {}\n\
         validation passed:    {}",
        result.schema_match,
        show(result.rows_only_in_source),
        show(result.rows_only_in_target),
        result.is_passed,
    );
}

fn render_schema(schema: &[ColumnSchema]) -> String {
    let fields: Vec<String> = schema
        .iter()
        .map(|column| format!("{}: {}", column.name, column.data_type))
        .collect();
    format!("[{}]", fields.join(", "))
}
