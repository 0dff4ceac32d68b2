use std::fs;
use std::path::Path;

use recon_core::config::{ComputeMaster, RunArguments};
use recon_core::run_validation;
use rusqlite::Connection;

fn write_config(dir: &Path, summary: &Path, source: &Path, db: &Path) -> std::path::PathBuf {
    let xml = format!(
        r#"<config>
  <setting>
    <validation_name>orders_daily</validation_name>
    <validation_threshold>0</validation_threshold>
    <validate_content>yes</validate_content>
    <source_name>landing</source_name>
    <destination_name>sales_db</destination_name>
    <summary_log>{summary}/%Y/%m</summary_log>
    <granularity>daily</granularity>
    <validation_type>hdfs-jdbc</validation_type>
  </setting>
  <source>
    <type>file</type>
    <file_config>
      <format>csv</format>
      <path>{source}/dt=%Y-%m-%d</path>
      <options><header>true</header><sep>;</sep></options>
    </file_config>
  </source>
  <target>
    <type>database</type>
    <database_config>
      <format>jdbc</format>
      <options>
        <url>jdbc:sqlite:{db}</url>
        <query>select id, region from orders where day = '%Y-%m-%d'</query>
      </options>
    </database_config>
  </target>
</config>"#,
        summary = summary.display(),
        source = source.display(),
        db = db.display(),
    );
    let path = dir.join("orders.xml");
    fs::write(&path, xml).expect("write config");
    path
}

#[test]
fn csv_partition_matches_sqlite_query() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source_root = dir.path().join("landing");
    let partition = source_root.join("dt=2024-03-15");
    fs::create_dir_all(&partition).expect("create partition");
    fs::write(partition.join("part-0.csv"), "id;region\n1;north\n2;south\n").expect("write");
    fs::write(partition.join("part-1.csv"), "id;region\n3;north\n").expect("write");

    let db = dir.path().join("sales.db");
    let conn = Connection::open(&db).expect("open sqlite");
    conn.execute_batch(
        "CREATE TABLE orders (id TEXT, region TEXT, day TEXT);
         INSERT INTO orders VALUES
           ('1', 'north', '2024-03-15'),
           ('2', 'south', '2024-03-15'),
           ('3', 'north', '2024-03-15'),
           ('4', 'east', '2024-03-16');",
    )
    .expect("seed");
    drop(conn);

    let summary = dir.path().join("summary");
    let config_path = write_config(dir.path(), &summary, &source_root, &db);
    let outcome = run_validation(RunArguments {
        config_path,
        override_datetime: Some("2024-03-15 14:32:10".to_string()),
        verbose: false,
        compute_master: ComputeMaster::Local,
    })
    .expect("run");

    assert!(outcome.row_count.is_passed);
    assert_eq!(outcome.row_count.count_source, 3);
    assert_eq!(outcome.row_count.count_target, 3);
    assert!(outcome.content.as_ref().is_some_and(|content| content.is_passed));
    assert_eq!(
        outcome.summary_log_path,
        format!("{}/2024/03", summary.display())
    );

    let part = fs::read_to_string(&outcome.report_file).expect("read part");
    let lines: Vec<&str> = part.lines().collect();
    assert_eq!(lines.len(), 1, "got: {part}");
    assert!(
        lines[0].ends_with(",2024-03-15 00:00:00,daily,hdfs-jdbc,landing,sales_db,3,3"),
        "got: {part}"
    );
}

#[test]
fn invalid_config_fails_before_any_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.xml");
    fs::write(&path, "<config><setting/></config>").expect("write");
    let err = run_validation(RunArguments {
        config_path: path,
        override_datetime: None,
        verbose: false,
        compute_master: ComputeMaster::Local,
    })
    .expect_err("invalid");
    assert!(err.to_string().starts_with("invalid config"), "got: {err}");
}
