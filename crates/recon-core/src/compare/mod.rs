mod content;
mod fingerprint;
mod row_count;

pub use content::{validate_content, ContentResult};
pub use fingerprint::fingerprint;
pub use row_count::{compare_counts, percentage_diff, validate_row_count, RowCountResult};
