//! Format emitters
//!
//! Every emitter writes its format incrementally: `write_header` opens the
//! document, each `write_row` appends one row, `write_footer` closes it. No
//! emitter holds more than the row being written.
//!
//! ```text
//! Start --header--> HeaderWritten --row--> RowWritten --row--> RowWritten
//!                         |                    |
//!                         +------footer--------+--> Finished
//! ```

pub mod delimited;
pub mod json;
pub mod spreadsheet;
pub mod transcode;
pub mod xml_writer;

use std::fmt;
use std::io::Write;

use crate::error::{ExportError, Result};
use crate::options::{ExportFormat, ExportOptions};
use crate::types::FormattedCell;

pub use delimited::DelimitedEmitter;
pub use json::JsonEmitter;
pub use spreadsheet::SpreadsheetXmlEmitter;
pub use transcode::{CountingWriter, TranscodingWriter};

/// Position of an emitter in its framing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Start,
    HeaderWritten,
    RowWritten,
    Finished,
}

impl EmitterState {
    pub fn name(&self) -> &'static str {
        match self {
            EmitterState::Start => "Start",
            EmitterState::HeaderWritten => "HeaderWritten",
            EmitterState::RowWritten => "RowWritten",
            EmitterState::Finished => "Finished",
        }
    }
}

impl fmt::Display for EmitterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental writer for one output format
pub trait Emitter {
    /// Open the document and write the column labels
    fn write_header(&mut self, labels: &[String]) -> Result<()>;

    /// Append one body row; must carry one cell per header label
    fn write_row(&mut self, cells: &[FormattedCell]) -> Result<()>;

    /// Close the document and flush the stream
    fn write_footer(&mut self) -> Result<()>;

    /// Push everything written so far to the output stream
    fn flush(&mut self) -> Result<()>;

    fn state(&self) -> EmitterState;

    /// Body rows written so far
    fn rows_written(&self) -> u64;
}

/// Shared state machine and column-count bookkeeping
#[derive(Debug, Clone)]
pub(crate) struct Framing {
    state: EmitterState,
    columns: usize,
    rows: u64,
    flush_interval: u32,
}

impl Framing {
    pub(crate) fn new(flush_interval: u32) -> Self {
        Framing {
            state: EmitterState::Start,
            columns: 0,
            rows: 0,
            flush_interval: flush_interval.max(1),
        }
    }

    pub(crate) fn state(&self) -> EmitterState {
        self.state
    }

    pub(crate) fn rows(&self) -> u64 {
        self.rows
    }

    fn invalid(&self, operation: &'static str) -> ExportError {
        ExportError::InvalidEmitterState {
            operation,
            state: self.state.name(),
        }
    }

    pub(crate) fn check_header(&self) -> Result<()> {
        match self.state {
            EmitterState::Start => Ok(()),
            _ => Err(self.invalid("write the header")),
        }
    }

    pub(crate) fn header_written(&mut self, columns: usize) {
        self.columns = columns;
        self.state = EmitterState::HeaderWritten;
    }

    pub(crate) fn check_row(&self, cells: usize) -> Result<()> {
        match self.state {
            EmitterState::HeaderWritten | EmitterState::RowWritten => {}
            _ => return Err(self.invalid("write a row")),
        }
        if cells != self.columns {
            return Err(ExportError::ColumnCountMismatch {
                expected: self.columns,
                found: cells,
            });
        }
        Ok(())
    }

    /// Record a written row; returns true when the stream is due for a flush
    pub(crate) fn row_written(&mut self) -> bool {
        self.rows += 1;
        self.state = EmitterState::RowWritten;
        self.rows % self.flush_interval as u64 == 0
    }

    pub(crate) fn check_footer(&self) -> Result<()> {
        match self.state {
            EmitterState::HeaderWritten | EmitterState::RowWritten => Ok(()),
            _ => Err(self.invalid("write the footer")),
        }
    }

    pub(crate) fn finished(&mut self) {
        self.state = EmitterState::Finished;
    }
}

/// Create the emitter for a format over an output stream
pub fn create_emitter<'w, W: Write + 'w>(
    format: ExportFormat,
    writer: W,
    options: &ExportOptions,
) -> Result<Box<dyn Emitter + 'w>> {
    Ok(match format {
        ExportFormat::Delimited => Box::new(DelimitedEmitter::new(writer, options)?),
        ExportFormat::Json => Box::new(JsonEmitter::new(writer, options)),
        ExportFormat::SpreadsheetXml => Box::new(SpreadsheetXmlEmitter::new(writer, options)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_sequence() {
        let mut framing = Framing::new(2);
        assert!(framing.check_row(1).is_err());
        assert!(framing.check_footer().is_err());

        framing.check_header().unwrap();
        framing.header_written(2);
        assert!(framing.check_header().is_err());
        assert!(matches!(
            framing.check_row(3),
            Err(ExportError::ColumnCountMismatch { expected: 2, found: 3 })
        ));

        framing.check_row(2).unwrap();
        assert!(!framing.row_written());
        assert!(framing.row_written());
        assert_eq!(framing.state(), EmitterState::RowWritten);

        framing.check_footer().unwrap();
        framing.finished();
        assert!(matches!(
            framing.check_row(2),
            Err(ExportError::InvalidEmitterState { state: "Finished", .. })
        ));
    }

    #[test]
    fn test_every_format_rejects_rows_before_header() {
        for format in [ExportFormat::Delimited, ExportFormat::Json, ExportFormat::SpreadsheetXml] {
            let options = ExportOptions::for_format(format);
            let mut emitter = create_emitter(format, Vec::new(), &options).unwrap();
            let err = emitter.write_row(&[]).unwrap_err();
            assert!(matches!(err, ExportError::InvalidEmitterState { .. }), "{}", format);
            assert_eq!(emitter.state(), EmitterState::Start);
        }
    }
}
