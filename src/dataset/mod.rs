//! Customer records and the historical dataset they are loaded from.

pub mod loader;
pub mod record;
pub mod summary;

pub use loader::{DatasetFormat, DatasetLoadError, load_records};
pub use record::CustomerRecord;
pub use summary::{ColumnStats, ColumnType, DatasetSummary, summarize};
