//! Run-level export configuration

use std::fmt;
use std::str::FromStr;

use crate::error::{ExportError, Result};
use crate::formatter::{default_type_formats, BooleanFormat, CellFormatter, NumberFormat, TypeFormatTable};

/// Default pagination limit below which the bulk strategy is used
pub const DEFAULT_BULK_THRESHOLD: usize = 1000;

/// Output encoding of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExportFormat {
    /// Delimiter-separated text (CSV-like)
    Delimited,
    /// One JSON array of arrays
    Json,
    /// Single-worksheet XML Spreadsheet 2003 document
    SpreadsheetXml,
}

impl ExportFormat {
    /// MIME type with charset, for the transport collaborator
    pub fn content_type(&self, encoding: Option<&str>) -> String {
        let mime = match self {
            ExportFormat::Delimited => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::SpreadsheetXml => "application/vnd.ms-excel",
        };
        format!("{}; charset={}", mime, encoding.unwrap_or("utf-8"))
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Delimited => "csv",
            ExportFormat::Json => "json",
            ExportFormat::SpreadsheetXml => "xls",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Delimited => "delimited",
            ExportFormat::Json => "json",
            ExportFormat::SpreadsheetXml => "spreadsheetxml",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "delimited" => Ok(ExportFormat::Delimited),
            "json" => Ok(ExportFormat::Json),
            "xls" | "xml" | "spreadsheetxml" => Ok(ExportFormat::SpreadsheetXml),
            other => Err(ExportError::InvalidOption(format!("unknown format '{}'", other))),
        }
    }
}

/// Options for one export run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Field separator (delimited output, single ASCII character)
    pub delimiter: char,
    /// Field quote character (delimited output, single ASCII character)
    pub enclosure: char,
    /// Substitute for embedded line breaks; `None` keeps them
    pub newline_replacement: Option<String>,
    /// Output character encoding label; `None` means UTF-8
    pub encoding: Option<String>,
    /// Remove markup tags from cell text
    pub strip_tags: bool,
    /// Decode HTML entities in cell text
    pub decode_entities: bool,
    /// Pagination limits below this use the bulk strategy
    pub bulk_threshold: usize,
    /// Worksheet name (spreadsheet output)
    pub worksheet_name: String,
    /// Export columns flagged invisible
    pub include_invisible: bool,
    /// Rows between flushes of the output stream
    pub flush_interval: u32,
    /// Rows between progress log lines
    pub progress_interval: u64,
    pub number_format: NumberFormat,
    pub boolean_format: BooleanFormat,
    pub type_formats: TypeFormatTable,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            delimiter: ';',
            enclosure: '"',
            newline_replacement: None,
            encoding: None,
            strip_tags: true,
            decode_entities: true,
            bulk_threshold: DEFAULT_BULK_THRESHOLD,
            worksheet_name: "Sheet1".to_string(),
            include_invisible: true,
            flush_interval: 1000,
            progress_interval: 10_000,
            number_format: NumberFormat::default(),
            boolean_format: BooleanFormat::default(),
            type_formats: default_type_formats(),
        }
    }
}

impl ExportOptions {
    /// Defaults tuned for a format
    ///
    /// Delimited output replaces line breaks with `", "`; JSON keeps markup;
    /// spreadsheet output leaves entity handling to its emitter.
    pub fn for_format(format: ExportFormat) -> Self {
        let base = ExportOptions::default();
        match format {
            ExportFormat::Delimited => ExportOptions {
                newline_replacement: Some(", ".to_string()),
                ..base
            },
            ExportFormat::Json => ExportOptions {
                strip_tags: false,
                ..base
            },
            ExportFormat::SpreadsheetXml => ExportOptions {
                decode_entities: false,
                ..base
            },
        }
    }

    /// Check option consistency
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || !self.enclosure.is_ascii() {
            return Err(ExportError::InvalidOption(
                "delimiter and enclosure must be single ASCII characters".to_string(),
            ));
        }
        if self.delimiter == self.enclosure {
            return Err(ExportError::InvalidOption(format!(
                "delimiter and enclosure are both {:?}",
                self.delimiter
            )));
        }
        if matches!(self.delimiter, '\n' | '\r') || matches!(self.enclosure, '\n' | '\r') {
            return Err(ExportError::InvalidOption(
                "delimiter and enclosure cannot be line breaks".to_string(),
            ));
        }
        if self.flush_interval == 0 {
            return Err(ExportError::InvalidOption(
                "flush interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Formatter configured from these options
    pub fn cell_formatter(&self) -> CellFormatter {
        CellFormatter::new(
            self.type_formats.clone(),
            self.number_format.clone(),
            self.boolean_format.clone(),
        )
    }
}

/// Builder for export options
///
/// # Examples
///
/// ```
/// use gridstream::options::{ExportFormat, ExportOptionsBuilder};
///
/// let options = ExportOptionsBuilder::new(ExportFormat::Delimited)
///     .with_delimiter(',')
///     .with_newline_replacement(None)
///     .build()
///     .unwrap();
/// assert_eq!(options.delimiter, ',');
/// ```
#[derive(Debug, Clone)]
pub struct ExportOptionsBuilder {
    options: ExportOptions,
}

impl ExportOptionsBuilder {
    /// Start from the defaults for a format
    pub fn new(format: ExportFormat) -> Self {
        ExportOptionsBuilder {
            options: ExportOptions::for_format(format),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    pub fn with_enclosure(mut self, enclosure: char) -> Self {
        self.options.enclosure = enclosure;
        self
    }

    pub fn with_newline_replacement(mut self, replacement: Option<&str>) -> Self {
        self.options.newline_replacement = replacement.map(str::to_string);
        self
    }

    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.options.encoding = Some(encoding.to_string());
        self
    }

    pub fn with_strip_tags(mut self, strip: bool) -> Self {
        self.options.strip_tags = strip;
        self
    }

    pub fn with_decode_entities(mut self, decode: bool) -> Self {
        self.options.decode_entities = decode;
        self
    }

    pub fn with_bulk_threshold(mut self, threshold: usize) -> Self {
        self.options.bulk_threshold = threshold;
        self
    }

    pub fn with_worksheet_name(mut self, name: &str) -> Self {
        self.options.worksheet_name = name.to_string();
        self
    }

    pub fn with_include_invisible(mut self, include: bool) -> Self {
        self.options.include_invisible = include;
        self
    }

    /// Set flush interval (rows between stream flushes)
    pub fn with_flush_interval(mut self, interval: u32) -> Self {
        self.options.flush_interval = interval;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.options.progress_interval = interval;
        self
    }

    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.options.number_format = format;
        self
    }

    pub fn with_boolean_format(mut self, format: BooleanFormat) -> Self {
        self.options.boolean_format = format;
        self
    }

    pub fn with_type_formats(mut self, table: TypeFormatTable) -> Self {
        self.options.type_formats = table;
        self
    }

    /// Validate and build the options
    pub fn build(self) -> Result<ExportOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_defaults() {
        let csv = ExportOptions::for_format(ExportFormat::Delimited);
        assert_eq!(csv.delimiter, ';');
        assert_eq!(csv.enclosure, '"');
        assert_eq!(csv.newline_replacement.as_deref(), Some(", "));
        assert!(csv.strip_tags);

        let json = ExportOptions::for_format(ExportFormat::Json);
        assert!(!json.strip_tags);
        assert_eq!(json.newline_replacement, None);

        let xls = ExportOptions::for_format(ExportFormat::SpreadsheetXml);
        assert!(!xls.decode_entities);
        assert_eq!(xls.bulk_threshold, DEFAULT_BULK_THRESHOLD);
    }

    #[test]
    fn test_builder() {
        let options = ExportOptionsBuilder::new(ExportFormat::SpreadsheetXml)
            .with_worksheet_name("Orders")
            .with_bulk_threshold(50)
            .with_flush_interval(200)
            .with_include_invisible(false)
            .build()
            .unwrap();
        assert_eq!(options.worksheet_name, "Orders");
        assert_eq!(options.bulk_threshold, 50);
        assert_eq!(options.flush_interval, 200);
        assert!(!options.include_invisible);
    }

    #[test]
    fn test_validation() {
        let err = ExportOptionsBuilder::new(ExportFormat::Delimited)
            .with_delimiter('"')
            .build();
        assert!(matches!(err, Err(ExportError::InvalidOption(_))));

        let err = ExportOptionsBuilder::new(ExportFormat::Delimited)
            .with_delimiter('§')
            .build();
        assert!(err.is_err());

        let err = ExportOptionsBuilder::new(ExportFormat::Json)
            .with_flush_interval(0)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Delimited);
        assert_eq!("xls".parse::<ExportFormat>().unwrap(), ExportFormat::SpreadsheetXml);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(
            ExportFormat::Delimited.content_type(Some("windows-1250")),
            "text/csv; charset=windows-1250"
        );
        assert_eq!(ExportFormat::Json.file_extension(), "json");
    }
}
