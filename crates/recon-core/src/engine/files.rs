use std::path::{Path, PathBuf};

use glob::glob;
use polars::prelude::{
    CsvEncoding, CsvParseOptions, CsvReadOptions, DataFrame, NullValues, ParquetReader,
    SerReader,
};

use crate::config::FileFormat;
use crate::engine::{option_flag, ReadOptions};
use crate::location::local_path;
use crate::DataSourceError;

/// CSV keys the local reader acts on. Everything else is accepted and ignored.
const CSV_HONOURED_KEYS: &[&str] = &[
    "sep",
    "header",
    "quote",
    "comment",
    "nullValue",
    "encoding",
    "inferSchema",
];

const INFER_SCHEMA_ROWS: usize = 1000;

/// Expands a location into the files to read: a single file, every data file of a
/// directory, or the matches of a glob pattern.
pub(crate) fn resolve_inputs(location: &str) -> Result<Vec<PathBuf>, DataSourceError> {
    let path = local_path(location).map_err(|scheme| {
        DataSourceError::new(
            location,
            format!("unsupported scheme {} for the local engine", scheme.0),
        )
    })?;
    let raw = path.to_string_lossy();
    if is_glob_pattern(&raw) {
        let files = collect_glob_files(&raw)?;
        if files.is_empty() {
            return Err(DataSourceError::new(location, "no input files matched"));
        }
        return Ok(files);
    }
    if path.is_file() {
        return Ok(vec![path]);
    }
    if !path.is_dir() {
        return Err(DataSourceError::new(location, "path does not exist"));
    }
    let files = list_data_files(&path)?;
    if files.is_empty() {
        return Err(DataSourceError::new(location, "directory holds no data files"));
    }
    Ok(files)
}

fn is_glob_pattern(value: &str) -> bool {
    value.contains('*') || value.contains('?') || value.contains('[')
}

fn collect_glob_files(pattern: &str) -> Result<Vec<PathBuf>, DataSourceError> {
    let entries = glob(pattern)
        .map_err(|err| DataSourceError::new(pattern, format!("invalid glob pattern: {err}")))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| DataSourceError::new(pattern, format!("glob match failed: {err}")))?;
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Every file of `dir` whatever its name (`000000_0`, `part-00000.snappy.parquet`),
/// non-recursive. Files starting with `_` or `.` are markers (`_SUCCESS`, `.crc`)
/// and are skipped.
fn list_data_files(dir: &Path) -> Result<Vec<PathBuf>, DataSourceError> {
    let label = dir.display().to_string();
    let entries = std::fs::read_dir(dir)
        .map_err(|err| DataSourceError::new(&label, format!("cannot list directory: {err}")))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| DataSourceError::new(&label, format!("cannot list directory: {err}")))?
            .path();
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_') || name.starts_with('.'))
}

pub(crate) fn read_frames(
    files: &[PathBuf],
    format: FileFormat,
    options: &ReadOptions,
    label: &str,
) -> Result<DataFrame, DataSourceError> {
    if format == FileFormat::Csv {
        for key in options.keys() {
            if !CSV_HONOURED_KEYS.contains(&key.as_str()) {
                tracing::debug!(option = %key, source = label, "csv option ignored by local engine");
            }
        }
    } else {
        for key in options.keys() {
            tracing::debug!(option = %key, source = label, "parquet option ignored by local engine");
        }
    }

    let mut combined: Option<DataFrame> = None;
    for file in files {
        let df = match format {
            FileFormat::Csv => read_csv_file(file, options)?,
            FileFormat::Parquet => read_parquet_file(file)?,
        };
        combined = Some(match combined {
            None => df,
            Some(mut acc) => {
                if acc.get_column_names() != df.get_column_names() {
                    return Err(DataSourceError::new(
                        file.display().to_string(),
                        format!(
                            "columns {:?} differ from the first file's {:?}",
                            df.get_column_names(),
                            acc.get_column_names()
                        ),
                    ));
                }
                acc.vstack_mut(&df).map_err(|err| {
                    DataSourceError::new(
                        file.display().to_string(),
                        format!("cannot append to earlier files: {err}"),
                    )
                })?;
                acc
            }
        });
    }
    combined.ok_or_else(|| DataSourceError::new(label, "no input files"))
}

pub(crate) fn read_csv_file(path: &Path, options: &ReadOptions) -> Result<DataFrame, DataSourceError> {
    let label = path.display().to_string();
    let header = option_flag(options, "header", false);
    let infer_schema = option_flag(options, "inferSchema", false);
    let parse_options = csv_parse_options(options).map_err(|err| DataSourceError::new(&label, err))?;

    let read_options = CsvReadOptions::default()
        .with_path(Some(path))
        .with_has_header(header)
        .with_infer_schema_length(Some(if infer_schema { INFER_SCHEMA_ROWS } else { 0 }))
        .with_parse_options(parse_options);
    let reader = read_options
        .try_into_reader_with_file_path(None)
        .map_err(|err| DataSourceError::new(&label, format!("failed to open csv: {err}")))?;
    let mut df = reader
        .finish()
        .map_err(|err| DataSourceError::new(&label, format!("csv read failed: {err}")))?;
    if !header {
        let names = (0..df.width()).map(|index| format!("_c{index}"));
        df.set_column_names(names)
            .map_err(|err| DataSourceError::new(&label, err.to_string()))?;
    }
    Ok(df)
}

fn csv_parse_options(options: &ReadOptions) -> Result<CsvParseOptions, String> {
    let separator = single_byte("sep", options.get("sep").map(String::as_str).unwrap_or(","))?;
    let quote = match options.get("quote").map(String::as_str) {
        None => Some(b'"'),
        Some("") => None,
        Some(value) => Some(single_byte("quote", value)?),
    };
    let encoding = match options.get("encoding") {
        None => CsvEncoding::Utf8,
        Some(value) => parse_encoding(value)?,
    };
    let null_values = options
        .get("nullValue")
        .map(|value| NullValues::AllColumnsSingle(value.as_str().into()));
    Ok(CsvParseOptions::default()
        .with_separator(separator)
        .with_quote_char(quote)
        .with_encoding(encoding)
        .with_null_values(null_values)
        .with_comment_prefix(options.get("comment").map(String::as_str)))
}

fn single_byte(key: &str, value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(format!("{key} must be a single byte, got {value:?}")),
    }
}

fn parse_encoding(value: &str) -> Result<CsvEncoding, String> {
    let normalized = value.to_ascii_lowercase().replace(['-', '_'], "");
    match normalized.as_str() {
        "utf8" => Ok(CsvEncoding::Utf8),
        "lossyutf8" => Ok(CsvEncoding::LossyUtf8),
        _ => Err(format!("unsupported encoding: {value}")),
    }
}

pub(crate) fn read_parquet_file(path: &Path) -> Result<DataFrame, DataSourceError> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path)
        .map_err(|err| DataSourceError::new(&label, format!("failed to open parquet: {err}")))?;
    ParquetReader::new(file)
        .finish()
        .map_err(|err| DataSourceError::new(&label, format!("parquet read failed: {err}")))
}
