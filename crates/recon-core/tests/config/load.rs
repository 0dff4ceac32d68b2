use std::fs;
use std::path::{Path, PathBuf};

use recon_core::config::{
    load_config, ComputeMaster, Datasource, FileFormat, Granularity, OptionValue, RunArguments,
    TableOrQuery, ValidationType,
};

fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write config");
    path
}

fn args(config_path: PathBuf) -> RunArguments {
    RunArguments {
        config_path,
        override_datetime: None,
        verbose: false,
        compute_master: ComputeMaster::Local,
    }
}

const XML_CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config>
  <setting>
    <validation_name>orders_hourly</validation_name>
    <validation_threshold>2</validation_threshold>
    <validate_content>true</validate_content>
    <defaulttimedelay>3600</defaulttimedelay>
    <source_name>datalake</source_name>
    <destination_name>warehouse</destination_name>
    <summary_log>/var/recon/summary/%Y-%m</summary_log>
    <granularity>hourly</granularity>
    <validation_type>hdfs-jdbc</validation_type>
  </setting>
  <source>
    <type>file</type>
    <file_config>
      <format>parquet</format>
      <path>/data/orders/dt=%Y%m%d/hour=%H</path>
      <options>
        <mergeSchema>false</mergeSchema>
      </options>
    </file_config>
  </source>
  <target>
    <type>database</type>
    <database_config>
      <format>jdbc</format>
      <options>
        <url>jdbc:postgresql://warehouse:5432/sales</url>
        <user>recon</user>
        <password>secret</password>
        <query>select * from orders where created_at &gt;= '%Y-%m-%d %H:00:00'</query>
        <fetchsize>1000</fetchsize>
      </options>
    </database_config>
  </target>
</config>
"#;

#[test]
fn xml_config_loads_into_typed_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(dir.path(), "orders.xml", XML_CONFIG);

    let config = load_config(args(path)).expect("load config");
    assert_eq!(config.setting.validation_name, "orders_hourly");
    assert_eq!(config.setting.validation_threshold, 2);
    assert!(config.setting.validate_content);
    assert_eq!(config.setting.default_time_delay_seconds, 3600);
    assert_eq!(config.setting.granularity, Granularity::Hourly);
    assert_eq!(config.setting.validation_type, ValidationType::HdfsJdbc);

    let Datasource::File(source) = &config.source else {
        panic!("expected file source");
    };
    assert_eq!(source.format(), FileFormat::Parquet);
    assert_eq!(
        source.options.values().get("mergeSchema"),
        Some(&OptionValue::Bool(false))
    );

    let Datasource::Database(target) = &config.target else {
        panic!("expected database target");
    };
    assert!(matches!(target.options.relation, TableOrQuery::Query(_)));
    assert_eq!(
        target.options.tuning.get("fetchsize"),
        Some(&OptionValue::Int(1000))
    );
}

#[test]
fn yaml_config_loads_the_same_shape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yaml = r#"
setting:
  validation_name: orders_daily
  validation_threshold: 0
  source_name: lake
  destination_name: lake_copy
  summary_log_path_template: /var/recon/%Y
  granularity: daily
  validation_type: hdfs-hdfs
source:
  type: file
  file_config:
    format: csv
    path: /data/a/%Y%m%d
    options:
      header: true
      sep: "|"
target:
  type: file
  file_config:
    format: csv
    path: /data/b/%Y%m%d
"#;
    let path = write_config(dir.path(), "orders.yml", yaml);
    let config = load_config(args(path)).expect("load config");
    assert_eq!(config.setting.summary_log_path_template, "/var/recon/%Y");
    assert_eq!(config.setting.granularity, Granularity::Daily);
    let Datasource::File(target) = &config.target else {
        panic!("expected file target");
    };
    assert!(target.options.values().is_empty());
}

#[test]
fn every_violation_is_reported_at_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let xml = r#"<config>
  <setting>
    <validation_name>broken</validation_name>
    <validation_threshold>high</validation_threshold>
    <source_name>a</source_name>
    <destination_name>b</destination_name>
    <summary_log>/logs</summary_log>
    <granularity>weekly</granularity>
    <validation_type>hdfs-hdfs</validation_type>
  </setting>
  <source>
    <type>file</type>
    <file_config><format>avro</format><path>/a</path></file_config>
  </source>
  <target>
    <type>database</type>
    <file_config><format>csv</format><path>/b</path></file_config>
    <database_config><format>jdbc</format><options><url>x</url><dbtable>t</dbtable></options></database_config>
  </target>
</config>"#;
    let path = write_config(dir.path(), "broken.xml", xml);
    let err = load_config(args(path)).expect_err("invalid config");
    assert!(err.violations.len() >= 4, "got: {err}");
    for field in [
        "setting.validation_threshold",
        "setting.granularity",
        "source.file_config.format",
        "target",
    ] {
        assert!(err.mentions(field), "missing {field} in {err}");
    }
}

#[test]
fn unreadable_or_malformed_files_are_config_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_config(args(dir.path().join("missing.xml"))).expect_err("missing file");
    assert!(err.to_string().contains("cannot read"), "got: {err}");

    let path = write_config(dir.path(), "bad.xml", "<config><setting></config>");
    let err = load_config(args(path)).expect_err("malformed");
    assert!(err.to_string().contains("malformed XML"), "got: {err}");
}
