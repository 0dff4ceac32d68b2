mod echo;

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use polars::prelude::{Column, CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use serde::Serialize;

pub use echo::run_echo;

use crate::compare::RowCountResult;
use crate::config::{ValidationRun, OVERRIDE_DATETIME_FORMAT};
use crate::location::local_path;
use crate::{DataSourceError, ReconResult, ReportError};

/// One line of the summary log. Part files carry no header row, so readers
/// rely on the order of `COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRecord {
    pub timestamp: String,
    pub datetime: String,
    pub granularity: String,
    #[serde(rename = "type")]
    pub validation_type: String,
    pub source_name: String,
    pub destination_name: String,
    pub source_count: u64,
    pub destination_count: u64,
}

impl SummaryRecord {
    pub const COLUMNS: [&'static str; 8] = [
        "timestamp",
        "datetime",
        "granularity",
        "type",
        "source_name",
        "destination_name",
        "source_count",
        "destination_count",
    ];

    pub fn new(run: &ValidationRun, row_count: &RowCountResult, written_at: NaiveDateTime) -> Self {
        let setting = run.setting();
        Self {
            timestamp: written_at.format(OVERRIDE_DATETIME_FORMAT).to_string(),
            datetime: run
                .process_datetime()
                .format(OVERRIDE_DATETIME_FORMAT)
                .to_string(),
            granularity: setting.granularity.as_str().to_string(),
            validation_type: setting.validation_type.as_str().to_string(),
            source_name: setting.source_name.clone(),
            destination_name: setting.destination_name.clone(),
            source_count: row_count.count_source,
            destination_count: row_count.count_target,
        }
    }

    fn to_frame(&self) -> Result<DataFrame, ReportError> {
        let text = |name: &str, value: &str| -> Column { Series::new(name.into(), [value]).into() };
        let count = |name: &str, value: u64| -> Column { Series::new(name.into(), [value]).into() };
        Ok(DataFrame::new(vec![
            text("timestamp", &self.timestamp),
            text("datetime", &self.datetime),
            text("granularity", &self.granularity),
            text("type", &self.validation_type),
            text("source_name", &self.source_name),
            text("destination_name", &self.destination_name),
            count("source_count", self.source_count),
            count("destination_count", self.destination_count),
        ])?)
    }
}

pub trait ReportSink {
    /// Appends `record` under `location` and returns the file written.
    fn append(&self, location: &str, record: &SummaryRecord) -> ReconResult<PathBuf>;
}

/// Treats the summary log location as a directory and adds one CSV part file
/// per run. Existing parts are never opened.
#[derive(Debug, Default, Clone)]
pub struct CsvReportSink;

impl CsvReportSink {
    pub fn part_file_name() -> String {
        format!(
            "part-{}-{}.csv",
            Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
            uuid::Uuid::new_v4()
        )
    }

    fn write_part(dir: &Path, record: &SummaryRecord) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir)?;
        let file_name = Self::part_file_name();
        let part_path = dir.join(&file_name);
        // hidden until renamed
        let tmp_path = dir.join(format!(".{file_name}.tmp"));

        let mut df = record.to_frame()?;
        let mut file = File::create(&tmp_path)?;
        CsvWriter::new(&mut file)
            .include_header(false)
            .finish(&mut df)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, &part_path)?;
        Ok(part_path)
    }
}

impl ReportSink for CsvReportSink {
    fn append(&self, location: &str, record: &SummaryRecord) -> ReconResult<PathBuf> {
        let dir = local_path(location).map_err(|scheme| {
            DataSourceError::new(
                "summary_log",
                format!("unsupported scheme {} in {location}", scheme.0),
            )
        })?;
        let part_path = Self::write_part(&dir, record)?;
        tracing::info!(path = %part_path.display(), "results written into summary log");
        Ok(part_path)
    }
}
