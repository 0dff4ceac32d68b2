//! Read capability used by the comparisons. An engine turns a file location or a
//! database relation into a [`Dataset`]; the comparisons only ever see that trait.

mod files;
mod frame;
mod local;
mod memory;
mod tables;

use std::collections::{BTreeMap, HashSet};

pub use frame::FrameDataset;
pub use local::LocalEngine;
pub use memory::{MemoryDataset, MemoryEngine, ReadCall};

use crate::config::{ComputeMaster, FileFormat};
use crate::DataSourceError;

/// Flat engine options keyed by their Spark option names.
pub type ReadOptions = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
}

pub trait Dataset {
    fn count(&self) -> Result<u64, DataSourceError>;

    /// Column names in dataset order.
    fn columns(&self) -> Vec<String>;

    fn schema(&self) -> Vec<ColumnSchema>;

    /// One fingerprint per distinct row, see [`crate::compare::fingerprint`].
    fn distinct_fingerprints(&self) -> Result<HashSet<String>, DataSourceError>;
}

pub trait DataEngine {
    fn name(&self) -> &'static str;

    fn read_file(
        &self,
        format: FileFormat,
        path: &str,
        options: &ReadOptions,
    ) -> Result<Box<dyn Dataset>, DataSourceError>;

    fn read_table(&self, options: &ReadOptions) -> Result<Box<dyn Dataset>, DataSourceError>;
}

/// Picks the engine for the requested compute master. Only the local engine is
/// built in; asking for yarn is an error rather than a silent fallback.
pub fn engine_for(master: ComputeMaster) -> Result<Box<dyn DataEngine>, DataSourceError> {
    match master {
        ComputeMaster::Local => Ok(Box::new(LocalEngine::default())),
        ComputeMaster::Yarn => Err(DataSourceError::new(
            "engine",
            "compute master yarn is not available in this build",
        )),
    }
}

pub(crate) fn option_flag(options: &ReadOptions, key: &str, default: bool) -> bool {
    options
        .get(key)
        .map(|value| value == "true")
        .unwrap_or(default)
}
