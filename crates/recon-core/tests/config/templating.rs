use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use recon_core::config::{
    config_from_tree, parse_xml, resolve, ComputeMaster, Datasource, RunArguments, TableOrQuery,
    ValidationConfig,
};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .expect("valid timestamp")
}

fn config(granularity: &str, summary_log: &str, override_datetime: Option<&str>) -> ValidationConfig {
    let xml = format!(
        r#"<config>
  <setting>
    <validation_name>orders</validation_name>
    <validation_threshold>5</validation_threshold>
    <defaulttimedelay>3600</defaulttimedelay>
    <source_name>lake</source_name>
    <destination_name>warehouse</destination_name>
    <summary_log>{summary_log}</summary_log>
    <granularity>{granularity}</granularity>
    <validation_type>hdfs-jdbc</validation_type>
  </setting>
  <source>
    <type>file</type>
    <file_config><format>csv</format><path>/data/orders/%Y/%m/%d/%H</path></file_config>
  </source>
  <target>
    <type>database</type>
    <database_config>
      <format>jdbc</format>
      <options>
        <url>jdbc:postgresql://db/sales</url>
        <query>select * from orders where day = '%Y-%m-%d'</query>
      </options>
    </database_config>
  </target>
</config>"#
    );
    let tree = parse_xml(&xml).expect("xml");
    let args = RunArguments {
        config_path: PathBuf::from("orders.xml"),
        override_datetime: override_datetime.map(str::to_string),
        verbose: false,
        compute_master: ComputeMaster::Local,
    };
    config_from_tree(&tree, args).expect("valid config")
}

#[test]
fn delay_and_truncation_drive_every_template() {
    let run = resolve(
        config("hourly", "/summary/%Y-%m", None),
        at(2024, 7, 1, 10, 45, 0),
    )
    .expect("resolve");
    assert_eq!(run.process_datetime(), at(2024, 7, 1, 9, 0, 0));
    assert_eq!(run.summary_log_path(), "/summary/2024-07");

    let Datasource::File(source) = run.source() else {
        panic!("expected file source");
    };
    assert_eq!(source.path_template, "/data/orders/2024/07/01/09");

    let Datasource::Database(target) = run.target() else {
        panic!("expected database target");
    };
    assert_eq!(
        target.options.relation,
        TableOrQuery::Query("select * from orders where day = '2024-07-01'".to_string())
    );
}

#[test]
fn override_datetime_ignores_the_delay() {
    let run = resolve(
        config("daily", "/summary/%Y%m%d", Some("2024-03-15 14:32:10")),
        at(2030, 1, 1, 0, 0, 0),
    )
    .expect("resolve");
    assert_eq!(run.process_datetime(), at(2024, 3, 15, 0, 0, 0));
    assert_eq!(run.summary_log_path(), "/summary/20240315");
}

#[test]
fn monthly_granularity_floors_to_the_first() {
    let run = resolve(
        config("monthly", "/summary/%Y-%m-%d", Some("2024-07-19 08:00:00")),
        at(2030, 1, 1, 0, 0, 0),
    )
    .expect("resolve");
    assert_eq!(run.summary_log_path(), "/summary/2024-07-01");
}

#[test]
fn malformed_override_is_rejected() {
    let err = resolve(
        config("daily", "/summary", Some("2024-03-15")),
        at(2024, 3, 16, 0, 0, 0),
    )
    .expect_err("bad override");
    assert!(err.mentions("args.datetime"), "got: {err}");
}

#[test]
fn bad_directive_names_the_templated_field() {
    let err = resolve(
        config("daily", "/summary/%Q", None),
        at(2024, 3, 16, 0, 0, 0),
    )
    .expect_err("bad directive");
    assert!(err.mentions("setting.summary_log"), "got: {err}");
}
