use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use recon_core::config::{
    config_from_tree, parse_xml, resolve, ComputeMaster, RunArguments, ValidationRun,
};
use recon_core::engine::{engine_for, MemoryDataset, MemoryEngine};
use recon_core::report::{CsvReportSink, ReportSink, SummaryRecord};
use recon_core::{execute, ReconResult};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 1)
        .and_then(|date| date.and_hms_opt(10, 45, 0))
        .expect("valid timestamp")
}

fn validation_run(summary_dir: &Path, validate_content: bool) -> ValidationRun {
    let xml = format!(
        r#"<config>
  <setting>
    <validation_name>orders</validation_name>
    <validation_threshold>5</validation_threshold>
    <validate_content>{validate_content}</validate_content>
    <defaulttimedelay>3600</defaulttimedelay>
    <source_name>lake</source_name>
    <destination_name>warehouse</destination_name>
    <summary_log>{summary}/%Y-%m</summary_log>
    <granularity>hourly</granularity>
    <validation_type>hdfs-jdbc</validation_type>
  </setting>
  <source>
    <type>file</type>
    <file_config><format>csv</format><path>/data/orders/%Y%m%d%H</path></file_config>
  </source>
  <target>
    <type>database</type>
    <database_config>
      <format>jdbc</format>
      <options><url>jdbc:postgresql://db/sales</url><dbtable>orders</dbtable></options>
    </database_config>
  </target>
</config>"#,
        summary = summary_dir.display(),
    );
    let tree = parse_xml(&xml).expect("xml");
    let args = RunArguments {
        config_path: PathBuf::from("orders.xml"),
        override_datetime: None,
        verbose: true,
        compute_master: ComputeMaster::Local,
    };
    let config = config_from_tree(&tree, args).expect("config");
    resolve(config, now()).expect("resolve")
}

fn rows(ids: &[&str]) -> MemoryDataset {
    ids.iter()
        .fold(MemoryDataset::new(&["id", "status"]), |dataset, id| {
            dataset.row(&[Some(id), Some("paid")])
        })
}

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<(String, SummaryRecord)>>,
}

impl ReportSink for RecordingSink {
    fn append(&self, location: &str, record: &SummaryRecord) -> ReconResult<PathBuf> {
        self.records
            .lock()
            .expect("lock")
            .push((location.to_string(), record.clone()));
        Ok(PathBuf::from(location).join("part-test.csv"))
    }
}

struct FailingSink;

impl ReportSink for FailingSink {
    fn append(&self, _location: &str, _record: &SummaryRecord) -> ReconResult<PathBuf> {
        Err("disk full".into())
    }
}

#[test]
fn passing_run_writes_one_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = validation_run(dir.path(), false);
    let engine = MemoryEngine::default()
        .with_dataset("/data/orders/2024070109", rows(&["1", "2", "3", "4"]))
        .with_dataset("orders", rows(&["1", "2", "3", "4"]));
    let sink = RecordingSink::default();

    let outcome = execute(&run, &engine, &sink).expect("execute");
    assert!(outcome.is_passed());
    assert!(outcome.content.is_none());
    assert_eq!(outcome.row_count.count_source, 4);

    let records = sink.records.lock().expect("lock");
    assert_eq!(records.len(), 1);
    let (location, record) = &records[0];
    assert_eq!(location, &format!("{}/2024-07", dir.path().display()));
    assert_eq!(record.datetime, "2024-07-01 09:00:00");
    assert_eq!(record.granularity, "hourly");
    assert_eq!(record.validation_type, "hdfs-jdbc");
    assert_eq!(record.source_count, 4);
    assert_eq!(record.destination_count, 4);
}

#[test]
fn failing_checks_still_complete_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = validation_run(dir.path(), true);
    let engine = MemoryEngine::default()
        .with_dataset("/data/orders/2024070109", rows(&["1", "2", "3", "4", "5"]))
        .with_dataset("orders", rows(&["1", "2", "3", "9"]));

    let outcome = execute(&run, &engine, &CsvReportSink).expect("execute");
    assert!(!outcome.row_count.is_passed);
    let content = outcome.content.as_ref().expect("content ran");
    assert_eq!(content.rows_only_in_source, Some(2));
    assert_eq!(content.rows_only_in_target, Some(1));
    assert!(!outcome.is_passed());
    assert!(outcome.report_file.starts_with(dir.path().join("2024-07")));
    assert!(outcome.report_file.exists());
}

#[test]
fn report_failure_stops_before_content_check() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = validation_run(dir.path(), true);
    let engine = MemoryEngine::default()
        .with_dataset("/data/orders/2024070109", rows(&["1"]))
        .with_dataset("orders", rows(&["1"]));

    let err = execute(&run, &engine, &FailingSink).expect_err("sink fails");
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn missing_dataset_is_reported_against_its_side() {
    let dir = tempfile::tempdir().expect("tempdir");
    let run = validation_run(dir.path(), false);
    let engine = MemoryEngine::default().with_dataset("/data/orders/2024070109", rows(&["1"]));

    let err = execute(&run, &engine, &RecordingSink::default()).expect_err("target missing");
    assert!(err.to_string().starts_with("data source target failed"), "got: {err}");
}

#[test]
fn yarn_master_is_not_available() {
    let err = engine_for(ComputeMaster::Yarn).err().expect("yarn");
    assert!(err.message.contains("yarn"), "got: {err}");
}
