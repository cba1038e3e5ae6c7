//! The remote tabular data source (a spreadsheet).

use async_trait::async_trait;

use crate::error::SourceError;
use crate::row::Row;

/// Read and append access to a spreadsheet-like service.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Read a cell range (e.g. "Eventi!A:M") as row-major values.
    ///
    /// Row 0 is whatever the sheet holds first, usually the header. A range
    /// with no values is an empty vec, not an error.
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, SourceError>;

    /// Append rows at the end of a sheet.
    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<String>>) -> Result<(), SourceError>;
}
