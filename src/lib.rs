//! # gridstream
//!
//! Streaming export of tabular data to delimited text, JSON and XML
//! Spreadsheet 2003 documents.
//!
//! ## Features
//!
//! - **Streaming**: rows are rendered and written one at a time; large
//!   result sets are read through a forward-only cursor
//! - **Three formats**: delimited (CSV-like), JSON array of arrays, single-worksheet SpreadsheetXML
//! - **Typed cells**: integers, numbers, dates, times and booleans keep their
//!   type in JSON and spreadsheet output
//! - **Text clean-up**: markup stripping, entity decoding, newline substitution
//! - **Character encodings**: output in any encoding known to `encoding_rs`,
//!   with unmappable characters substituted per cell
//!
//! ## Quick Start
//!
//! ```rust
//! use gridstream::{ColumnDescriptor, ExportController, ExportFormat, ExportOptions, LogicalType, MemorySource, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let columns = vec![
//!     ColumnDescriptor::new("id", LogicalType::Integer),
//!     ColumnDescriptor::text("name").label("Name"),
//!     ColumnDescriptor::new("joined", LogicalType::Date).label("Joined"),
//! ];
//!
//! let format = ExportFormat::Json;
//! let controller = ExportController::new(columns, ExportOptions::for_format(format))?;
//!
//! let mut source = MemorySource::new(vec![
//!     Record::new().with("id", 1).with("name", "Ann").with("joined", "2020-01-02"),
//! ]);
//!
//! let mut out = Vec::new();
//! let summary = controller.export(format, &mut source, &mut out)?;
//!
//! assert_eq!(summary.rows, 1);
//! assert_eq!(
//!     String::from_utf8(out)?,
//!     "[\n [\"id\",\"Name\",\"Joined\"],\n [1,\"Ann\",\"2020-01-02\"]\n]"
//! );
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod controller;
pub mod emitter;
pub mod error;
pub mod formatter;
pub mod options;
pub mod render;
pub mod source;
pub mod text;
pub mod types;

pub use column::{ColumnDescriptor, Extractor};
pub use controller::{ExportController, ExportSummary};
pub use emitter::{create_emitter, Emitter, EmitterState};
pub use error::{ExportError, Result};
pub use formatter::{BooleanFormat, CellFormatter, NumberFormat, TypeFormat, TypeFormatTable};
pub use options::{ExportFormat, ExportOptions, ExportOptionsBuilder};
pub use render::{RenderOptions, RowRenderer};
pub use source::{Cursor, DataSource, MemorySource, Pagination, RowSource, SortOrder, Strategy};
pub use types::{CellKind, FormattedCell, LogicalType, RawValue, Record};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        // Test that all public types are accessible
        let _ = std::marker::PhantomData::<ExportError>;
        let _ = std::marker::PhantomData::<ExportController>;
        let _ = std::marker::PhantomData::<Box<dyn Emitter>>;
        let _ = std::marker::PhantomData::<Box<dyn DataSource>>;
    }
}
