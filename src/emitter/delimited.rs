//! Delimiter-separated text output

use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::{Emitter, EmitterState, Framing};
use crate::error::{ExportError, Result};
use crate::options::ExportOptions;
use crate::types::FormattedCell;

/// Writes one line per row, fields joined by the configured delimiter
///
/// Fields containing the delimiter, the enclosure or a line break are
/// enclosed; an enclosure inside a field is doubled. There is no footer
/// content.
pub struct DelimitedEmitter<W: Write> {
    writer: csv::Writer<W>,
    framing: Framing,
}

impl<W: Write> DelimitedEmitter<W> {
    pub fn new(writer: W, options: &ExportOptions) -> Result<Self> {
        let delimiter = ascii_byte(options.delimiter, "delimiter")?;
        let enclosure = ascii_byte(options.enclosure, "enclosure")?;

        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .quote(enclosure)
            .quote_style(QuoteStyle::Necessary)
            .double_quote(true)
            .terminator(Terminator::Any(b'\n'))
            .flexible(false)
            .from_writer(writer);

        Ok(DelimitedEmitter {
            writer,
            framing: Framing::new(options.flush_interval),
        })
    }

    /// A zero-column line is a bare terminator; `csv` would write `""`.
    fn write_empty_line(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

fn ascii_byte(c: char, what: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ExportError::InvalidOption(format!(
            "{} {:?} is not a single ASCII character",
            what, c
        )))
    }
}

impl<W: Write> Emitter for DelimitedEmitter<W> {
    fn write_header(&mut self, labels: &[String]) -> Result<()> {
        self.framing.check_header()?;
        if labels.is_empty() {
            self.write_empty_line()?;
        } else {
            self.writer.write_record(labels)?;
        }
        self.framing.header_written(labels.len());
        Ok(())
    }

    fn write_row(&mut self, cells: &[FormattedCell]) -> Result<()> {
        self.framing.check_row(cells.len())?;
        if cells.is_empty() {
            self.write_empty_line()?;
        } else {
            self.writer
                .write_record(cells.iter().map(|cell| cell.display.as_bytes()))?;
        }
        if self.framing.row_written() {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        self.framing.check_footer()?;
        self.writer.flush()?;
        self.framing.finished();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn state(&self) -> EmitterState {
        self.framing.state()
    }

    fn rows_written(&self) -> u64 {
        self.framing.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ExportFormat, ExportOptionsBuilder};
    use crate::types::CellKind;

    fn emit(options: &ExportOptions, rows: &[Vec<&str>]) -> String {
        let mut out = Vec::new();
        {
            let mut emitter = DelimitedEmitter::new(&mut out, options).unwrap();
            emitter
                .write_header(&["id".to_string(), "name".to_string()])
                .unwrap();
            for row in rows {
                let cells: Vec<_> = row.iter().map(|v| FormattedCell::text(*v)).collect();
                emitter.write_row(&cells).unwrap();
            }
            emitter.write_footer().unwrap();
            assert_eq!(emitter.state(), EmitterState::Finished);
            assert_eq!(emitter.rows_written(), rows.len() as u64);
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_rows() {
        let options = ExportOptions::for_format(ExportFormat::Delimited);
        let out = emit(&options, &[vec!["1", "Ann"], vec!["2", "Bob"]]);
        assert_eq!(out, "id;name\n1;Ann\n2;Bob\n");
    }

    #[test]
    fn test_quoting() {
        let options = ExportOptions::for_format(ExportFormat::Delimited);
        let out = emit(&options, &[vec!["1", "a;b"], vec!["2", "say \"hi\""], vec!["3", "x\ny"]]);
        assert_eq!(
            out,
            "id;name\n1;\"a;b\"\n2;\"say \"\"hi\"\"\"\n3;\"x\ny\"\n"
        );
    }

    #[test]
    fn test_custom_delimiter_and_enclosure() {
        let options = ExportOptionsBuilder::new(ExportFormat::Delimited)
            .with_delimiter(',')
            .with_enclosure('\'')
            .build()
            .unwrap();
        let out = emit(&options, &[vec!["1", "O'Neil, Pat"]]);
        assert_eq!(out, "id,name\n1,'O''Neil, Pat'\n");
    }

    #[test]
    fn test_writes_display_text_of_typed_cells() {
        let options = ExportOptions::for_format(ExportFormat::Delimited);
        let mut out = Vec::new();
        let mut emitter = DelimitedEmitter::new(&mut out, &options).unwrap();
        emitter.write_header(&["n".to_string()]).unwrap();
        let cell = FormattedCell::typed(
            "1,234.50".to_string(),
            CellKind::Number,
            Some("NumberFormat"),
            "1234.5".to_string(),
        );
        emitter.write_row(&[cell]).unwrap();
        emitter.write_footer().unwrap();
        drop(emitter);
        assert_eq!(String::from_utf8(out).unwrap(), "n\n1,234.50\n");
    }

    #[test]
    fn test_header_only() {
        let options = ExportOptions::for_format(ExportFormat::Delimited);
        assert_eq!(emit(&options, &[]), "id;name\n");
    }

    #[test]
    fn test_zero_columns_write_empty_lines() {
        let options = ExportOptions::for_format(ExportFormat::Delimited);
        let mut out = Vec::new();
        let mut emitter = DelimitedEmitter::new(&mut out, &options).unwrap();
        emitter.write_header(&[]).unwrap();
        emitter.write_row(&[]).unwrap();
        emitter.write_row(&[]).unwrap();
        emitter.write_footer().unwrap();
        assert_eq!(emitter.rows_written(), 2);
        drop(emitter);
        assert_eq!(String::from_utf8(out).unwrap(), "\n\n\n");
    }

    #[test]
    fn test_state_errors() {
        let options = ExportOptions::for_format(ExportFormat::Delimited);
        let mut emitter = DelimitedEmitter::new(Vec::new(), &options).unwrap();
        assert!(emitter.write_footer().is_err());
        emitter.write_header(&["a".to_string()]).unwrap();
        assert!(matches!(
            emitter.write_row(&[]),
            Err(ExportError::ColumnCountMismatch { expected: 1, found: 0 })
        ));
        emitter.write_footer().unwrap();
        assert!(emitter.write_row(&[FormattedCell::text("x")]).is_err());
    }
}
