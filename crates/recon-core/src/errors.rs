use std::fmt;

/// One violated configuration constraint, addressed by its dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Malformed, missing or conflicting configuration. Carries every violation found,
/// not only the first one.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub violations: Vec<Violation>,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation::new(field, message)],
        }
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.as_slice() {
            [] => write!(f, "invalid config"),
            [single] => write!(f, "invalid config: {single}"),
            many => {
                write!(f, "invalid config ({} violations):", many.len())?;
                for violation in many {
                    write!(f, "\n  - {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// The engine could not produce a dataset (missing path or table, connectivity,
/// malformed options).
#[derive(Debug)]
pub struct DataSourceError {
    pub source_label: String,
    pub message: String,
}

impl DataSourceError {
    pub fn new(source_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data source {} failed: {}", self.source_label, self.message)
    }
}

impl std::error::Error for DataSourceError {}

#[derive(Debug)]
pub struct ComparisonError(pub String);

impl fmt::Display for ComparisonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comparison failed: {}", self.0)
    }
}

impl std::error::Error for ComparisonError {}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Csv(String),
    Serialize(serde_json::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "report io error: {err}"),
            ReportError::Csv(err) => write!(f, "report csv error: {err}"),
            ReportError::Serialize(err) => write!(f, "report serialize error: {err}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

impl From<polars::prelude::PolarsError> for ReportError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Csv(err.to_string())
    }
}
