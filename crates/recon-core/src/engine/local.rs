use crate::config::FileFormat;
use crate::engine::files::{read_frames, resolve_inputs};
use crate::engine::tables;
use crate::engine::{DataEngine, Dataset, FrameDataset, ReadOptions};
use crate::DataSourceError;

/// Reads files through polars and tables through the postgres or sqlite clients,
/// all in-process.
#[derive(Debug, Default, Clone)]
pub struct LocalEngine;

impl DataEngine for LocalEngine {
    fn name(&self) -> &'static str {
        "local"
    }

    fn read_file(
        &self,
        format: FileFormat,
        path: &str,
        options: &ReadOptions,
    ) -> Result<Box<dyn Dataset>, DataSourceError> {
        let files = resolve_inputs(path)?;
        tracing::debug!(path, files = files.len(), format = format.as_str(), "resolved inputs");
        let df = read_frames(&files, format, options, path)?;
        Ok(Box::new(FrameDataset::new(path, df)))
    }

    fn read_table(&self, options: &ReadOptions) -> Result<Box<dyn Dataset>, DataSourceError> {
        let label = options
            .get("dbtable")
            .cloned()
            .unwrap_or_else(|| "query".to_string());
        let table = tables::read_table(options).map_err(|err| DataSourceError::new(&label, err))?;
        let df = table
            .into_frame()
            .map_err(|err| DataSourceError::new(&label, err))?;
        Ok(Box::new(FrameDataset::new(label, df)))
    }
}
