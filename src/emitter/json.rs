//! JSON array-of-arrays output
//!
//! ```text
//! [
//!  ["id","name","joined"],
//!  [1,"Ann","2020-01-02"]
//! ]
//! ```

use std::io::Write;

use serde_json::{Number, Value};

use super::{Emitter, EmitterState, Framing};
use crate::error::Result;
use crate::options::ExportOptions;
use crate::types::{CellKind, FormattedCell};

/// Streams one JSON array whose first element is the header row
pub struct JsonEmitter<W: Write> {
    writer: W,
    framing: Framing,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W, options: &ExportOptions) -> Self {
        JsonEmitter {
            writer,
            framing: Framing::new(options.flush_interval),
        }
    }
}

/// JSON value of a cell: numbers stay numeric, everything else is a string
fn cell_value(cell: &FormattedCell) -> Value {
    if cell.kind == CellKind::Number {
        if let Some(number) = cell
            .literal
            .as_deref()
            .and_then(|literal| literal.parse::<Number>().ok())
        {
            return Value::Number(number);
        }
    }
    Value::String(cell.display.clone())
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn write_header(&mut self, labels: &[String]) -> Result<()> {
        self.framing.check_header()?;
        self.writer.write_all(b"[\n ")?;
        serde_json::to_writer(&mut self.writer, labels)?;
        self.framing.header_written(labels.len());
        Ok(())
    }

    fn write_row(&mut self, cells: &[FormattedCell]) -> Result<()> {
        self.framing.check_row(cells.len())?;
        let row: Vec<Value> = cells.iter().map(cell_value).collect();
        self.writer.write_all(b",\n ")?;
        serde_json::to_writer(&mut self.writer, &row)?;
        if self.framing.row_written() {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        self.framing.check_footer()?;
        self.writer.write_all(b"\n]")?;
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
    use crate::options::ExportFormat;

    fn header() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    fn number(display: &str, literal: &str) -> FormattedCell {
        FormattedCell::typed(
            display.to_string(),
            CellKind::Number,
            Some("IntegerFormat"),
            literal.to_string(),
        )
    }

    #[test]
    fn test_empty_document() {
        let options = ExportOptions::for_format(ExportFormat::Json);
        let mut out = Vec::new();
        let mut emitter = JsonEmitter::new(&mut out, &options);
        emitter.write_header(&header()).unwrap();
        emitter.write_footer().unwrap();
        drop(emitter);
        assert_eq!(String::from_utf8(out).unwrap(), "[\n [\"id\",\"name\"]\n]");
    }

    #[test]
    fn test_rows_and_escaping() {
        let options = ExportOptions::for_format(ExportFormat::Json);
        let mut out = Vec::new();
        let mut emitter = JsonEmitter::new(&mut out, &options);
        emitter.write_header(&header()).unwrap();
        emitter
            .write_row(&[number("1,234", "1234"), FormattedCell::text("B\n\"ob\"")])
            .unwrap();
        emitter.write_footer().unwrap();
        assert_eq!(emitter.rows_written(), 1);
        drop(emitter);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "[\n [\"id\",\"name\"],\n [1234,\"B\\n\\\"ob\\\"\"]\n]");

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_non_numeric_literal_falls_back_to_text() {
        let cell = number("NaN", "NaN");
        assert_eq!(cell_value(&cell), Value::String("NaN".to_string()));

        let date = FormattedCell::typed(
            "2020-01-02".to_string(),
            CellKind::DateTime,
            Some("DateFormat"),
            "2020-01-02T00:00:00.000".to_string(),
        );
        assert_eq!(cell_value(&date), Value::String("2020-01-02".to_string()));
        assert_eq!(cell_value(&number("1.50", "1.5")).to_string(), "1.5");
    }

    #[test]
    fn test_zero_columns_keep_one_entry_per_row() {
        let options = ExportOptions::for_format(ExportFormat::Json);
        let mut out = Vec::new();
        let mut emitter = JsonEmitter::new(&mut out, &options);
        emitter.write_header(&[]).unwrap();
        emitter.write_row(&[]).unwrap();
        emitter.write_row(&[]).unwrap();
        emitter.write_footer().unwrap();
        drop(emitter);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "[\n [],\n [],\n []\n]");
        let parsed: Vec<Vec<Value>> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_row_after_footer_is_rejected() {
        let options = ExportOptions::for_format(ExportFormat::Json);
        let mut emitter = JsonEmitter::new(Vec::new(), &options);
        emitter.write_header(&header()).unwrap();
        emitter.write_footer().unwrap();
        let err = emitter
            .write_row(&[FormattedCell::text("1"), FormattedCell::text("x")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Emitter cannot write a row in state Finished");
    }
}
