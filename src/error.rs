//! Error types for gridstream exports

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for all export operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// The row source failed to produce the next record
    #[error("Failed to read row {row} from source: {message}")]
    SourceRead { row: u64, message: String },

    /// An emitter method was called out of its header/rows/footer sequence
    #[error("Emitter cannot {operation} in state {state}")]
    InvalidEmitterState {
        operation: &'static str,
        state: &'static str,
    },

    /// A column type has no formatter entry
    #[error("Unsupported column type: {0}")]
    UnsupportedColumnType(String),

    /// A value could not be represented in the output character encoding
    #[error("Value {value:?} cannot be represented in {encoding}")]
    EncodingConversion { encoding: String, value: String },

    /// The configured output encoding label is not recognised
    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),

    /// Export options failed validation
    #[error("Invalid export option: {0}")]
    InvalidOption(String),

    /// A row did not carry the same number of cells as the header
    #[error("Row has {found} cells but the header declared {expected}")]
    ColumnCountMismatch { expected: usize, found: usize },

    /// Error occurred while writing a body row
    #[error("Failed to write row {row}: {source}")]
    WriteRowError {
        row: u64,
        #[source]
        source: Box<ExportError>,
    },

    /// Delimited output error
    #[error("CSV error: {0}")]
    Csv(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExportError {
    /// Shorthand for a source failure at the given row
    pub fn source_read(row: u64, message: impl Into<String>) -> Self {
        ExportError::SourceRead {
            row,
            message: message.into(),
        }
    }

    /// Whether the error aborts a run (as opposed to the locally recovered kinds)
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ExportError::UnsupportedColumnType(_) | ExportError::EncodingConversion { .. }
        )
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io) = err.into_kind() {
                return ExportError::IoError(io);
            }
            return ExportError::Csv("io error".to_string());
        }
        ExportError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return ExportError::IoError(err.into());
        }
        ExportError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        assert!(!ExportError::UnsupportedColumnType("currency".into()).is_fatal());
        assert!(!ExportError::EncodingConversion {
            encoding: "ISO-8859-2".into(),
            value: "€".into()
        }
        .is_fatal());
        assert!(ExportError::source_read(3, "connection reset").is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = ExportError::InvalidEmitterState {
            operation: "write a row",
            state: "Start",
        };
        assert_eq!(err.to_string(), "Emitter cannot write a row in state Start");

        let err = ExportError::WriteRowError {
            row: 7,
            source: Box::new(ExportError::ColumnCountMismatch {
                expected: 3,
                found: 2,
            }),
        };
        assert!(err.to_string().contains("row 7"));
    }
}
