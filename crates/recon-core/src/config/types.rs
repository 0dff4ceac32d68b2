use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeMaster {
    Local,
    Yarn,
}

impl ComputeMaster {
    pub fn as_str(self) -> &'static str {
        match self {
            ComputeMaster::Local => "local",
            ComputeMaster::Yarn => "yarn",
        }
    }
}

/// Invocation arguments, as received from the command line.
#[derive(Debug, Clone)]
pub struct RunArguments {
    pub config_path: PathBuf,
    pub override_datetime: Option<String>,
    pub verbose: bool,
    pub compute_master: ComputeMaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Monthly,
    Daily,
    Hourly,
}

impl Granularity {
    pub const ALLOWED: &'static [&'static str] = &["monthly", "daily", "hourly"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(Granularity::Monthly),
            "daily" => Some(Granularity::Daily),
            "hourly" => Some(Granularity::Hourly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasourceKind {
    File,
    Database,
}

impl DatasourceKind {
    pub const ALLOWED: &'static [&'static str] = &["file", "database"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(DatasourceKind::File),
            "database" => Some(DatasourceKind::Database),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatasourceKind::File => "file",
            DatasourceKind::Database => "database",
        }
    }
}

/// Which storage family each side of the comparison lives in. `hdfs` stands for
/// any file-system-like location, `jdbc` for a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationType {
    HdfsHdfs,
    HdfsJdbc,
    JdbcHdfs,
    JdbcJdbc,
}

impl ValidationType {
    pub const ALLOWED: &'static [&'static str] = &["hdfs-hdfs", "hdfs-jdbc", "jdbc-hdfs", "jdbc-jdbc"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hdfs-hdfs" => Some(ValidationType::HdfsHdfs),
            "hdfs-jdbc" => Some(ValidationType::HdfsJdbc),
            "jdbc-hdfs" => Some(ValidationType::JdbcHdfs),
            "jdbc-jdbc" => Some(ValidationType::JdbcJdbc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationType::HdfsHdfs => "hdfs-hdfs",
            ValidationType::HdfsJdbc => "hdfs-jdbc",
            ValidationType::JdbcHdfs => "jdbc-hdfs",
            ValidationType::JdbcJdbc => "jdbc-jdbc",
        }
    }

    /// Expected datasource kinds for (source, target).
    pub fn kinds(self) -> (DatasourceKind, DatasourceKind) {
        match self {
            ValidationType::HdfsHdfs => (DatasourceKind::File, DatasourceKind::File),
            ValidationType::HdfsJdbc => (DatasourceKind::File, DatasourceKind::Database),
            ValidationType::JdbcHdfs => (DatasourceKind::Database, DatasourceKind::File),
            ValidationType::JdbcJdbc => (DatasourceKind::Database, DatasourceKind::Database),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Setting {
    pub validation_name: String,
    pub validation_threshold: u8,
    pub validate_content: bool,
    pub default_time_delay_seconds: u64,
    pub source_name: String,
    pub destination_name: String,
    pub summary_log_path_template: String,
    pub granularity: Granularity,
    pub validation_type: ValidationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    pub const ALLOWED: &'static [&'static str] = &["csv", "parquet"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "csv" => Some(FileFormat::Csv),
            "parquet" => Some(FileFormat::Parquet),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
        }
    }

    pub(crate) fn option_specs(self) -> &'static [OptionSpec] {
        match self {
            FileFormat::Csv => CSV_OPTIONS,
            FileFormat::Parquet => PARQUET_OPTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(value) => write!(f, "{value}"),
            OptionValue::Bool(value) => write!(f, "{value}"),
            OptionValue::Int(value) => write!(f, "{value}"),
            OptionValue::Float(value) => write!(f, "{value}"),
        }
    }
}

/// A flat set of engine tuning keys. Keys are validated against the per-format
/// tables below, so only known keys with well-typed values end up here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    values: BTreeMap<String, OptionValue>,
}

impl OptionSet {
    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOptions {
    Csv(OptionSet),
    Parquet(OptionSet),
}

impl FileOptions {
    pub fn empty(format: FileFormat) -> Self {
        match format {
            FileFormat::Csv => FileOptions::Csv(OptionSet::default()),
            FileFormat::Parquet => FileOptions::Parquet(OptionSet::default()),
        }
    }

    pub fn format(&self) -> FileFormat {
        match self {
            FileOptions::Csv(_) => FileFormat::Csv,
            FileOptions::Parquet(_) => FileFormat::Parquet,
        }
    }

    pub fn values(&self) -> &OptionSet {
        match self {
            FileOptions::Csv(values) | FileOptions::Parquet(values) => values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileDatasetConfig {
    pub path_template: String,
    pub options: FileOptions,
}

impl FileDatasetConfig {
    pub fn format(&self) -> FileFormat {
        self.options.format()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOrQuery {
    Table(String),
    Query(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Parallel-read hints. Either all four are present or none is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioning {
    pub column: String,
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub num_partitions: i64,
}

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub url: String,
    pub credentials: Option<Credentials>,
    pub relation: TableOrQuery,
    pub driver: Option<String>,
    pub partitioning: Option<Partitioning>,
    pub tuning: OptionSet,
}

#[derive(Debug, Clone)]
pub struct DatabaseDatasetConfig {
    pub options: DatabaseOptions,
}

impl DatabaseDatasetConfig {
    pub const FORMAT: &'static str = "jdbc";
}

#[derive(Debug, Clone)]
pub enum Datasource {
    File(FileDatasetConfig),
    Database(DatabaseDatasetConfig),
}

impl Datasource {
    pub fn kind(&self) -> DatasourceKind {
        match self {
            Datasource::File(_) => DatasourceKind::File,
            Datasource::Database(_) => DatasourceKind::Database,
        }
    }
}

/// Validated configuration whose templated fields are not rendered yet.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub args: RunArguments,
    pub setting: Setting,
    pub source: Datasource,
    pub target: Datasource,
}

/// A fully resolved run: timestamp derived and every template rendered.
/// Only produced by [`crate::config::resolve`].
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub(crate) args: RunArguments,
    pub(crate) setting: Setting,
    pub(crate) source: Datasource,
    pub(crate) target: Datasource,
    pub(crate) process_datetime: NaiveDateTime,
    pub(crate) summary_log_path: String,
}

impl ValidationRun {
    pub fn args(&self) -> &RunArguments {
        &self.args
    }

    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    pub fn source(&self) -> &Datasource {
        &self.source
    }

    pub fn target(&self) -> &Datasource {
        &self.target
    }

    pub fn process_datetime(&self) -> NaiveDateTime {
        self.process_datetime
    }

    pub fn summary_log_path(&self) -> &str {
        &self.summary_log_path
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum OptionKind {
    Text,
    Bool,
    Int,
    Float,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
}

const fn spec(key: &'static str, kind: OptionKind) -> OptionSpec {
    OptionSpec { key, kind }
}

const REBASE_MODES: &[&str] = &["EXCEPTION", "CORRECTED", "LEGACY"];

pub(crate) const CSV_OPTIONS: &[OptionSpec] = &[
    spec("sep", OptionKind::Text),
    spec("encoding", OptionKind::Text),
    spec("quote", OptionKind::Text),
    spec("escape", OptionKind::Text),
    spec("comment", OptionKind::Text),
    spec("header", OptionKind::Bool),
    spec("inferSchema", OptionKind::Bool),
    spec("preferDate", OptionKind::Bool),
    spec("enforceSchema", OptionKind::Bool),
    spec("ignoreLeadingWhiteSpace", OptionKind::Bool),
    spec("ignoreTrailingWhiteSpace", OptionKind::Bool),
    spec("nullValue", OptionKind::Text),
    spec("nanValue", OptionKind::Text),
    spec("positiveInf", OptionKind::Text),
    spec("negativeInf", OptionKind::Text),
    spec("dateFormat", OptionKind::Text),
    spec("timestampFormat", OptionKind::Text),
    spec("timestampNTZFormat", OptionKind::Text),
    spec("enableDateTimeParsingFallback", OptionKind::Bool),
    spec("maxColumns", OptionKind::Int),
    spec("maxCharsPerColumn", OptionKind::Int),
    spec(
        "mode",
        OptionKind::OneOf(&["PERMISSIVE", "DROPMALFORMED", "FAILFAST"]),
    ),
    spec("columnNameOfCorruptRecord", OptionKind::Text),
    spec("multiLine", OptionKind::Bool),
    spec("charToEscapeQuoteEscaping", OptionKind::Text),
    spec("samplingRatio", OptionKind::Float),
    spec("emptyValue", OptionKind::Text),
    spec("locale", OptionKind::Text),
    spec("lineSep", OptionKind::Text),
    spec(
        "unescapedQuoteHandling",
        OptionKind::OneOf(&[
            "STOP_AT_CLOSING_QUOTE",
            "BACK_TO_DELIMITER",
            "STOP_AT_DELIMITER",
            "SKIP_VALUE",
            "RAISE_ERROR",
        ]),
    ),
];

pub(crate) const PARQUET_OPTIONS: &[OptionSpec] = &[
    spec("datetimeRebaseMode", OptionKind::OneOf(REBASE_MODES)),
    spec("int96RebaseMode", OptionKind::OneOf(REBASE_MODES)),
    spec("mergeSchema", OptionKind::Bool),
    spec("compression", OptionKind::Text),
];

/// Database keys that land in [`DatabaseOptions::tuning`]. The structural keys
/// (url, credentials, dbtable/query, driver, partitioning) are handled separately.
pub(crate) const DATABASE_TUNING_OPTIONS: &[OptionSpec] = &[
    spec("prepareQuery", OptionKind::Text),
    spec("queryTimeout", OptionKind::Int),
    spec("fetchsize", OptionKind::Int),
    spec("sessionInitStatement", OptionKind::Text),
    spec("customSchema", OptionKind::Text),
    spec("pushDownPredicate", OptionKind::Bool),
    spec("pushDownAggregate", OptionKind::Bool),
    spec("pushDownLimit", OptionKind::Bool),
    spec("pushDownTableSample", OptionKind::Bool),
    spec("keytab", OptionKind::Text),
    spec("principal", OptionKind::Text),
    spec("refreshKrb5Config", OptionKind::Bool),
    spec("connectionProvider", OptionKind::Text),
    spec("preferTimestampNTZ", OptionKind::Bool),
];

pub(crate) const DATABASE_STRUCTURAL_KEYS: &[&str] = &[
    "url",
    "user",
    "password",
    "dbtable",
    "query",
    "driver",
    "partitionColumn",
    "lowerBound",
    "upperBound",
    "numPartitions",
];
