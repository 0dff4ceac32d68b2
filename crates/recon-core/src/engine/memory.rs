use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::compare::fingerprint;
use crate::config::FileFormat;
use crate::engine::{ColumnSchema, DataEngine, Dataset, ReadOptions};
use crate::DataSourceError;

/// Rows held in memory as text. Used to exercise comparisons without files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDataset {
    schema: Vec<ColumnSchema>,
    rows: Vec<Vec<Option<String>>>,
}

impl MemoryDataset {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            schema: columns
                .iter()
                .map(|name| ColumnSchema {
                    name: name.to_string(),
                    data_type: "str".to_string(),
                })
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_types(columns: &[(&str, &str)]) -> Self {
        Self {
            schema: columns
                .iter()
                .map(|(name, data_type)| ColumnSchema {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: &[Option<&str>]) -> Self {
        self.rows
            .push(values.iter().map(|value| value.map(str::to_string)).collect());
        self
    }
}

impl Dataset for MemoryDataset {
    fn count(&self) -> Result<u64, DataSourceError> {
        Ok(self.rows.len() as u64)
    }

    fn columns(&self) -> Vec<String> {
        self.schema.iter().map(|column| column.name.clone()).collect()
    }

    fn schema(&self) -> Vec<ColumnSchema> {
        self.schema.clone()
    }

    fn distinct_fingerprints(&self) -> Result<HashSet<String>, DataSourceError> {
        Ok(self
            .rows
            .iter()
            .map(|row| fingerprint(row.iter().map(|value| value.as_deref())))
            .collect())
    }
}

/// One read the engine was asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadCall {
    File {
        format: FileFormat,
        path: String,
        options: ReadOptions,
    },
    Table {
        options: ReadOptions,
    },
}

/// Serves registered datasets by path (files) or by `dbtable`/`query` (tables)
/// and records every read.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    datasets: BTreeMap<String, MemoryDataset>,
    calls: Mutex<Vec<ReadCall>>,
}

impl MemoryEngine {
    pub fn with_dataset(mut self, key: impl Into<String>, dataset: MemoryDataset) -> Self {
        self.datasets.insert(key.into(), dataset);
        self
    }

    pub fn calls(&self) -> Vec<ReadCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: ReadCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn lookup(&self, key: &str) -> Result<Box<dyn Dataset>, DataSourceError> {
        self.datasets
            .get(key)
            .cloned()
            .map(|dataset| Box::new(dataset) as Box<dyn Dataset>)
            .ok_or_else(|| DataSourceError::new(key, "no such dataset"))
    }
}

impl DataEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read_file(
        &self,
        format: FileFormat,
        path: &str,
        options: &ReadOptions,
    ) -> Result<Box<dyn Dataset>, DataSourceError> {
        self.record(ReadCall::File {
            format,
            path: path.to_string(),
            options: options.clone(),
        });
        self.lookup(path)
    }

    fn read_table(&self, options: &ReadOptions) -> Result<Box<dyn Dataset>, DataSourceError> {
        self.record(ReadCall::Table {
            options: options.clone(),
        });
        let key = options
            .get("dbtable")
            .or_else(|| options.get("query"))
            .map(String::as_str)
            .unwrap_or_default();
        self.lookup(key)
    }
}
