use std::fs;
use std::path::Path;

use polars::prelude::*;
use recon_core::compare::validate_content;
use recon_core::config::FileFormat;
use recon_core::engine::{DataEngine, LocalEngine, ReadOptions};

fn options(pairs: &[(&str, &str)]) -> ReadOptions {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn write_parquet(dir: &Path, name: &str, mut df: DataFrame) {
    let file = fs::File::create(dir.join(name)).expect("create parquet");
    ParquetWriter::new(file)
        .finish(&mut df)
        .expect("write parquet");
}

#[test]
fn csv_directory_is_read_as_one_dataset() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("part-0.csv"), "id,name\n1,alice\n2,bob\n").expect("write");
    fs::write(dir.path().join("part-1.csv"), "id,name\n3,carol\n").expect("write");
    fs::write(dir.path().join("_SUCCESS"), "").expect("write");

    let dataset = LocalEngine
        .read_file(
            FileFormat::Csv,
            &dir.path().display().to_string(),
            &options(&[("header", "true")]),
        )
        .expect("read csv dir");
    assert_eq!(dataset.count().expect("count"), 3);
    assert_eq!(dataset.columns(), vec!["id", "name"]);
}

#[test]
fn parquet_glob_reads_matching_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_parquet(
        dir.path(),
        "orders-a.parquet",
        df!("id" => &[1i64, 2], "amount" => &[10.5f64, 3.0]).expect("df a"),
    );
    write_parquet(
        dir.path(),
        "orders-b.parquet",
        df!("id" => &[3i64], "amount" => &[7.25f64]).expect("df b"),
    );
    write_parquet(
        dir.path(),
        "refunds.parquet",
        df!("id" => &[9i64], "amount" => &[1.0f64]).expect("df c"),
    );

    let pattern = format!("{}/orders-*.parquet", dir.path().display());
    let dataset = LocalEngine
        .read_file(FileFormat::Parquet, &pattern, &ReadOptions::new())
        .expect("read glob");
    assert_eq!(dataset.count().expect("count"), 3);
    let schema = dataset.schema();
    assert_eq!(schema[0].data_type, "i64");
    assert_eq!(schema[1].data_type, "f64");
}

#[test]
fn file_url_locations_are_local() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.csv");
    fs::write(&path, "1;a\n2;b\n").expect("write");
    let url = format!("file://{}", path.display());
    let dataset = LocalEngine
        .read_file(FileFormat::Csv, &url, &options(&[("sep", ";")]))
        .expect("read file url");
    assert_eq!(dataset.columns(), vec!["_c0", "_c1"]);
    assert_eq!(dataset.count().expect("count"), 2);
}

#[test]
fn csv_and_parquet_copies_compare_equal_as_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("orders.csv");
    fs::write(&csv_path, "id,name\n1,alice\n2,\n").expect("write");
    write_parquet(
        dir.path(),
        "orders.parquet",
        df!("id" => &["1", "2"], "name" => &[Some("alice"), None]).expect("df"),
    );

    let source = LocalEngine
        .read_file(
            FileFormat::Csv,
            &csv_path.display().to_string(),
            &options(&[("header", "true")]),
        )
        .expect("read csv");
    let target = LocalEngine
        .read_file(
            FileFormat::Parquet,
            &dir.path().join("orders.parquet").display().to_string(),
            &ReadOptions::new(),
        )
        .expect("read parquet");
    let result = validate_content(source.as_ref(), target.as_ref()).expect("content");
    assert!(result.schema_match);
    assert!(result.is_passed, "{result:?}");
}

#[test]
fn missing_location_is_a_data_source_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("2024/07/01");
    let err = LocalEngine
        .read_file(FileFormat::Csv, &missing.display().to_string(), &ReadOptions::new())
        .err()
        .expect("missing path");
    assert!(err.message.contains("does not exist"), "got: {err}");
}
