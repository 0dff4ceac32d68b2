use std::collections::HashSet;

use polars::prelude::{DataFrame, DataType, Series};

use crate::compare::fingerprint;
use crate::engine::{ColumnSchema, Dataset};
use crate::DataSourceError;

/// A dataset fully materialized as a polars frame.
#[derive(Debug, Clone)]
pub struct FrameDataset {
    label: String,
    df: DataFrame,
}

impl FrameDataset {
    pub fn new(label: impl Into<String>, df: DataFrame) -> Self {
        Self {
            label: label.into(),
            df,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    fn string_columns(&self) -> Result<Vec<Series>, DataSourceError> {
        self.df
            .get_columns()
            .iter()
            .map(|column| {
                column
                    .as_materialized_series()
                    .cast(&DataType::String)
                    .map_err(|err| {
                        DataSourceError::new(
                            &self.label,
                            format!("cannot render column {} as text: {err}", column.name()),
                        )
                    })
            })
            .collect()
    }
}

impl Dataset for FrameDataset {
    fn count(&self) -> Result<u64, DataSourceError> {
        Ok(self.df.height() as u64)
    }

    fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn schema(&self) -> Vec<ColumnSchema> {
        self.df
            .get_columns()
            .iter()
            .map(|column| ColumnSchema {
                name: column.name().to_string(),
                data_type: column.dtype().to_string(),
            })
            .collect()
    }

    fn distinct_fingerprints(&self) -> Result<HashSet<String>, DataSourceError> {
        let columns = self.string_columns()?;
        let views = columns
            .iter()
            .map(|series| series.str())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| DataSourceError::new(&self.label, err.to_string()))?;
        let mut fingerprints = HashSet::with_capacity(self.df.height());
        for row in 0..self.df.height() {
            fingerprints.insert(fingerprint(views.iter().map(|values| values.get(row))));
        }
        Ok(fingerprints)
    }
}
