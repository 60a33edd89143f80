//! CSV-backed time series: one file per metric group, a fixed header, one row
//! per date (and entity).

mod diff;
mod error;
mod files;
mod schema;
mod store;
mod table;

pub use diff::{
    compute_diff,
    write_diff,
};
pub use error::SeriesError;
pub use files::{
    SeriesFiles,
    WriteSet,
};
pub use schema::{
    Schema,
    DATE_COLUMN,
    DATE_FORMAT,
};
pub use store::{
    append_row,
    deduplicate,
    write_atomic,
};
pub use table::SeriesTable;
