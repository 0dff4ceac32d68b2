use crate::config::{DatabaseOptions, Datasource, FileFormat, TableOrQuery};
use crate::engine::{DataEngine, Dataset, ReadOptions};
use crate::DataSourceError;

const REDACTED: &str = "***";

/// What to ask the engine for, with options flattened to their Spark key names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadRequest {
    File {
        format: FileFormat,
        path: String,
        options: ReadOptions,
    },
    Table {
        options: ReadOptions,
    },
}

impl ReadRequest {
    pub fn from_datasource(datasource: &Datasource) -> Self {
        match datasource {
            Datasource::File(file) => ReadRequest::File {
                format: file.format(),
                path: file.path_template.clone(),
                options: file
                    .options
                    .values()
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            },
            Datasource::Database(database) => ReadRequest::Table {
                options: database_options(&database.options),
            },
        }
    }

    pub fn options(&self) -> &ReadOptions {
        match self {
            ReadRequest::File { options, .. } | ReadRequest::Table { options } => options,
        }
    }

    /// The options with the password masked, safe to log or print.
    pub fn redacted_options(&self) -> ReadOptions {
        let mut options = self.options().clone();
        if let Some(password) = options.get_mut("password") {
            *password = REDACTED.to_string();
        }
        options
    }

    /// Short description for logs: the path, or the url and relation.
    pub fn describe(&self) -> String {
        match self {
            ReadRequest::File { format, path, .. } => format!("{} {path}", format.as_str()),
            ReadRequest::Table { options } => {
                let url = options.get("url").map(String::as_str).unwrap_or_default();
                match (options.get("dbtable"), options.get("query")) {
                    (Some(table), _) => format!("jdbc {url} table {table}"),
                    (None, Some(query)) => format!("jdbc {url} query {query}"),
                    (None, None) => format!("jdbc {url}"),
                }
            }
        }
    }
}

fn database_options(options: &DatabaseOptions) -> ReadOptions {
    let mut flat = ReadOptions::new();
    flat.insert("url".to_string(), options.url.clone());
    if let Some(credentials) = &options.credentials {
        if let Some(user) = &credentials.user {
            flat.insert("user".to_string(), user.clone());
        }
        if let Some(password) = &credentials.password {
            flat.insert("password".to_string(), password.clone());
        }
    }
    match &options.relation {
        TableOrQuery::Table(table) => flat.insert("dbtable".to_string(), table.clone()),
        TableOrQuery::Query(query) => flat.insert("query".to_string(), query.clone()),
    };
    if let Some(driver) = &options.driver {
        flat.insert("driver".to_string(), driver.clone());
    }
    if let Some(partitioning) = &options.partitioning {
        flat.insert("partitionColumn".to_string(), partitioning.column.clone());
        flat.insert("lowerBound".to_string(), partitioning.lower_bound.to_string());
        flat.insert("upperBound".to_string(), partitioning.upper_bound.to_string());
        flat.insert(
            "numPartitions".to_string(),
            partitioning.num_partitions.to_string(),
        );
    }
    for (key, value) in options.tuning.iter() {
        flat.insert(key.to_string(), value.to_string());
    }
    flat
}

/// Reads one side of the comparison. Engine failures are reported against `side`.
pub fn read_dataset(
    engine: &dyn DataEngine,
    datasource: &Datasource,
    side: &str,
) -> Result<Box<dyn Dataset>, DataSourceError> {
    let request = ReadRequest::from_datasource(datasource);
    tracing::info!(side, engine = engine.name(), dataset = %request.describe(), "reading dataset");
    let result = match &request {
        ReadRequest::File {
            format,
            path,
            options,
        } => engine.read_file(*format, path, options),
        ReadRequest::Table { options } => engine.read_table(options),
    };
    result.map_err(|err| {
        DataSourceError::new(side, format!("{}: {}", err.source_label, err.message))
    })
}
