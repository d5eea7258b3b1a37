//! XML Spreadsheet 2003 output (single worksheet)
//!
//! Document layout:
//! - preamble: XML declaration, `Workbook` with namespaces, `Styles`
//! - `Worksheet` / `Table` with a `Heading`-styled header row
//! - one `Row` per record
//! - footer: `WorksheetOptions`, closing tags

use std::io::Write;

use super::xml_writer::XmlWriter;
use super::{Emitter, EmitterState, Framing};
use crate::error::Result;
use crate::formatter::TypeFormatTable;
use crate::options::ExportOptions;
use crate::text::{self, Transliterator};
use crate::types::{trim_blank, CellKind, FormattedCell};

const NS_SPREADSHEET: &str = "urn:schemas-microsoft-com:office:spreadsheet";
const NS_OFFICE: &str = "urn:schemas-microsoft-com:office:office";
const NS_EXCEL: &str = "urn:schemas-microsoft-com:office:excel";
const NS_COMPONENT: &str = "urn:schemas-microsoft-com:office:component:spreadsheet";

/// Worksheet names are limited to 31 characters
const MAX_SHEET_NAME: usize = 31;

const HEADING_STYLE: &str = "\
\x20       <Style ss:ID=\"Heading\" ss:Name=\"Heading\">\n\
\x20           <Font ss:Size=\"11\" ss:Bold=\"1\" ss:Color=\"#eeeeee\"/>\n\
\x20           <Interior ss:Pattern=\"Solid\" ss:Color=\"#222222\"/>\n\
\x20       </Style>\n";

/// Emits one worksheet, cell by cell
pub struct SpreadsheetXmlEmitter<W: Write> {
    xml: XmlWriter<W>,
    framing: Framing,
    worksheet_name: String,
    encoding: Option<&'static str>,
    type_formats: TypeFormatTable,
}

impl<W: Write> SpreadsheetXmlEmitter<W> {
    /// Create an emitter; fails on an unknown encoding label
    pub fn new(writer: W, options: &ExportOptions) -> Result<Self> {
        let encoding = options
            .encoding
            .as_deref()
            .map(Transliterator::for_label)
            .transpose()?
            .filter(|t| !t.is_utf8())
            .map(|t| t.name());

        Ok(SpreadsheetXmlEmitter {
            xml: XmlWriter::new(writer),
            framing: Framing::new(options.flush_interval),
            worksheet_name: sanitize_sheet_name(&options.worksheet_name),
            encoding,
            type_formats: options.type_formats.clone(),
        })
    }

    fn write_preamble(&mut self) -> Result<()> {
        match self.encoding {
            Some(name) => {
                self.xml.write_str("<?xml version=\"1.0\" encoding=\"")?;
                self.xml.write_str(name)?;
                self.xml.write_str("\"?>\n")?;
            }
            None => self.xml.write_str("<?xml version=\"1.0\"?>\n")?,
        }

        self.xml.start_element("Workbook")?;
        self.xml.attribute("xmlns", NS_SPREADSHEET)?;
        self.xml.attribute("xmlns:o", NS_OFFICE)?;
        self.xml.attribute("xmlns:x", NS_EXCEL)?;
        self.xml.attribute("xmlns:ss", NS_SPREADSHEET)?;
        self.xml.attribute("xmlns:c", NS_COMPONENT)?;
        self.xml.close_start_tag()?;
        self.xml.write_str("\n    <Styles>\n")?;
        self.xml.write_str(HEADING_STYLE)?;

        for (logical_type, format) in &self.type_formats {
            let Some(number_format) = &format.number_format else {
                continue;
            };
            self.xml.write_str("        ")?;
            self.xml.start_element("Style")?;
            self.xml.attribute("ss:ID", logical_type.style_id())?;
            self.xml.close_start_tag()?;
            self.xml.start_element("NumberFormat")?;
            self.xml.attribute("ss:Format", number_format)?;
            self.xml.close_empty_tag()?;
            self.xml.end_element("Style")?;
            self.xml.write_str("\n")?;
        }

        self.xml.write_str("    </Styles>\n    ")?;
        self.xml.start_element("Worksheet")?;
        self.xml.attribute("ss:Name", &self.worksheet_name)?;
        self.xml.close_start_tag()?;
        self.xml.write_str("\n        <Table>\n")
    }

    /// Decode pre-existing entities, then escape for XML
    fn write_text(&mut self, value: &str) -> Result<()> {
        let decoded = text::decode_entities(value);
        self.xml.write_escaped(trim_blank(&decoded))
    }
}

/// Replace characters worksheet names cannot hold and cap the length
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    if trim_blank(&cleaned).is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

impl<W: Write> Emitter for SpreadsheetXmlEmitter<W> {
    fn write_header(&mut self, labels: &[String]) -> Result<()> {
        self.framing.check_header()?;
        self.write_preamble()?;

        self.xml.write_str("<Row ss:StyleID=\"Heading\">")?;
        for label in labels {
            self.xml.write_str("<Cell><Data ss:Type=\"String\">")?;
            let label = text::normalize_line_breaks(label);
            self.write_text(&label)?;
            self.xml.write_str("</Data></Cell>")?;
        }
        self.xml.write_str("</Row>\n")?;
        self.xml.drain()?;

        self.framing.header_written(labels.len());
        Ok(())
    }

    fn write_row(&mut self, cells: &[FormattedCell]) -> Result<()> {
        self.framing.check_row(cells.len())?;

        self.xml.write_str("<Row>")?;
        for cell in cells {
            let typed = match (cell.kind, cell.literal.as_deref()) {
                (CellKind::String, _) | (_, None) => None,
                (kind, Some(literal)) => Some((kind, trim_blank(literal))),
            };
            match typed {
                Some((kind, literal)) if !literal.is_empty() && !cell.is_blank() => {
                    self.xml.start_element("Cell")?;
                    if let Some(style) = cell.style {
                        self.xml.attribute("ss:StyleID", style)?;
                    }
                    self.xml.close_start_tag()?;
                    self.xml.write_str("<Data ss:Type=\"")?;
                    self.xml.write_str(kind.as_str())?;
                    self.xml.write_str("\">")?;
                    self.xml.write_escaped(literal)?;
                }
                _ => {
                    self.xml.write_str("<Cell><Data ss:Type=\"String\">")?;
                    self.write_text(&cell.display)?;
                }
            }
            self.xml.write_str("</Data></Cell>")?;
        }
        self.xml.write_str("</Row>\n")?;
        self.xml.drain()?;

        if self.framing.row_written() {
            self.xml.flush()?;
        }
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        self.framing.check_footer()?;
        self.xml.write_str(
            "        </Table>\n\
             \x20       <c:WorksheetOptions>\n\
             \x20           <c:DisplayCustomHeaders/>\n\
             \x20       </c:WorksheetOptions>\n\
             \x20   </Worksheet>\n\
             </Workbook>\n",
        )?;
        self.xml.flush()?;
        self.framing.finished();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.xml.flush()
    }

    fn state(&self) -> EmitterState {
        self.framing.state()
    }

    fn rows_written(&self) -> u64 {
        self.framing.rows()
    }
}
