use std::path::PathBuf;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::compare::{validate_content, validate_row_count, ContentResult, RowCountResult};
use crate::config::{self, RunArguments, ValidationRun};
use crate::engine::{engine_for, DataEngine};
use crate::read::read_dataset;
use crate::report::{run_echo, CsvReportSink, ReportSink, SummaryRecord};
use crate::ReconResult;

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub validation_name: String,
    pub process_datetime: NaiveDateTime,
    pub summary_log_path: String,
    pub report_file: PathBuf,
    pub row_count: RowCountResult,
    pub content: Option<ContentResult>,
    pub elapsed_ms: u64,
}

impl RunOutcome {
    /// Row count passed and, when it ran, the content check passed too.
    pub fn is_passed(&self) -> bool {
        self.row_count.is_passed && self.content.as_ref().map_or(true, |content| content.is_passed)
    }
}

/// Loads, resolves and executes the validation described by `args` against the
/// engine selected by its compute master.
pub fn run_validation(args: RunArguments) -> ReconResult<RunOutcome> {
    let config = config::load_config(args)?;
    let run = config::resolve(config, Local::now().naive_local())?;
    let engine = engine_for(run.args().compute_master)?;
    execute(&run, engine.as_ref(), &CsvReportSink)
}

/// Reads both sides, checks row counts, appends the summary record, then
/// optionally compares content. Steps run strictly in that order.
pub fn execute(
    run: &ValidationRun,
    engine: &dyn DataEngine,
    sink: &dyn ReportSink,
) -> ReconResult<RunOutcome> {
    let started = Instant::now();
    let setting = run.setting();
    tracing::info!(
        validation = %setting.validation_name,
        validation_type = setting.validation_type.as_str(),
        granularity = setting.granularity.as_str(),
        source = %setting.source_name,
        destination = %setting.destination_name,
        process_datetime = %run.process_datetime(),
        "start validation"
    );
    if run.args().verbose {
        let echo = serde_json::to_string_pretty(&run_echo(run))?;
        tracing::info!("resolved configuration:\n{echo}");
    }
    tracing::info!(engine = engine.name(), master = run.args().compute_master.as_str(), "engine initialized");

    let source = read_dataset(engine, run.source(), "source")?;
    let target = read_dataset(engine, run.target(), "target")?;
    tracing::info!("datasources fetched");

    let row_count = validate_row_count(source.as_ref(), target.as_ref(), setting.validation_threshold)?;
    let record = SummaryRecord::new(run, &row_count, Local::now().naive_local());
    if run.args().verbose {
        tracing::info!("summary record: {}", serde_json::to_string(&record)?);
    }
    let report_file = sink.append(run.summary_log_path(), &record)?;

    let content = if setting.validate_content {
        Some(validate_content(source.as_ref(), target.as_ref())?)
    } else {
        None
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(elapsed_ms, "execution duration: {:.4}s", elapsed_ms as f64 / 1000.0);
    Ok(RunOutcome {
        validation_name: setting.validation_name.clone(),
        process_datetime: run.process_datetime(),
        summary_log_path: run.summary_log_path().to_string(),
        report_file,
        row_count,
        content,
        elapsed_ms,
    })
}
