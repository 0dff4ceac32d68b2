pub mod compare;
pub mod config;
pub mod engine;
pub mod errors;
mod location;
pub mod read;
pub mod report;
pub mod run;

pub use errors::{ComparisonError, ConfigError, DataSourceError, ReportError, Violation};
pub use run::{execute, run_validation, RunOutcome};

pub type ReconResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
