//! Type-aware cell formatting
//!
//! [`CellFormatter`] maps a raw value and a logical type to a display string,
//! a spreadsheet data type and an optional style identifier. It holds only
//! configuration, so formatting the same value twice always yields the same cell.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

use crate::types::{CellKind, FormattedCell, LogicalType, RawValue};

/// Spreadsheet data type and number format for one logical type
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeFormat {
    pub kind: CellKind,
    /// Spreadsheet number format; `None` means the type gets no style
    pub number_format: Option<String>,
}

impl TypeFormat {
    pub fn new(kind: CellKind, number_format: Option<&str>) -> Self {
        TypeFormat {
            kind,
            number_format: number_format.map(str::to_string),
        }
    }
}

/// Ordered mapping from logical type to its spreadsheet format
pub type TypeFormatTable = IndexMap<LogicalType, TypeFormat>;

/// The default type-format table
pub fn default_type_formats() -> TypeFormatTable {
    let mut table = IndexMap::new();
    table.insert(
        LogicalType::Integer,
        TypeFormat::new(CellKind::Number, Some("#,##0")),
    );
    table.insert(
        LogicalType::Number,
        TypeFormat::new(CellKind::Number, Some("#,##0.00")),
    );
    table.insert(
        LogicalType::Date,
        TypeFormat::new(CellKind::DateTime, Some("yyyy\\-mm\\-dd")),
    );
    table.insert(
        LogicalType::Time,
        TypeFormat::new(CellKind::DateTime, Some("hh:mm:ss")),
    );
    table.insert(
        LogicalType::DateTime,
        TypeFormat::new(CellKind::DateTime, Some("yyyy\\-mm\\-dd\\ hh:mm:ss")),
    );
    table.insert(LogicalType::Boolean, TypeFormat::new(CellKind::Boolean, None));
    table
}

/// Separators and precision for numeric display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberFormat {
    /// Digits after the decimal point for `number` columns
    pub decimals: usize,
    pub decimal_separator: String,
    pub thousands_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            decimals: 2,
            decimal_separator: ".".to_string(),
            thousands_separator: ",".to_string(),
        }
    }
}

impl NumberFormat {
    /// Grouped integer, e.g. `1,234,567`
    pub fn format_integer(&self, value: i64) -> String {
        let mut buffer = itoa::Buffer::new();
        let digits = buffer.format(value.unsigned_abs());
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if value < 0 {
            out.push('-');
        }
        push_grouped(&mut out, digits, &self.thousands_separator);
        out
    }

    /// Grouped decimal with fixed precision, e.g. `1,234.50`
    pub fn format_decimal(&self, value: f64) -> String {
        let fixed = format!("{:.*}", self.decimals, value.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
        let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
        if value.is_sign_negative() && !is_zero {
            out.push('-');
        }
        push_grouped(&mut out, int_part, &self.thousands_separator);
        if let Some(frac) = frac_part {
            out.push_str(&self.decimal_separator);
            out.push_str(frac);
        }
        out
    }
}

fn push_grouped(out: &mut String, digits: &str, separator: &str) {
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
}

/// Display strings for `false` and `true`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BooleanFormat {
    pub false_text: String,
    pub true_text: String,
}

impl Default for BooleanFormat {
    fn default() -> Self {
        BooleanFormat {
            false_text: "0".to_string(),
            true_text: "1".to_string(),
        }
    }
}

impl BooleanFormat {
    pub fn new(false_text: impl Into<String>, true_text: impl Into<String>) -> Self {
        BooleanFormat {
            false_text: false_text.into(),
            true_text: true_text.into(),
        }
    }

    pub fn display(&self, value: bool) -> &str {
        if value {
            &self.true_text
        } else {
            &self.false_text
        }
    }
}

/// Per-call context supplied by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatContext {
    /// Zero-based index of the row being rendered
    pub row_index: u64,
}

/// Formats raw values according to a type-format table
#[derive(Debug, Clone)]
pub struct CellFormatter {
    types: TypeFormatTable,
    number: NumberFormat,
    boolean: BooleanFormat,
}

impl Default for CellFormatter {
    fn default() -> Self {
        CellFormatter::new(default_type_formats(), NumberFormat::default(), BooleanFormat::default())
    }
}

impl CellFormatter {
    pub fn new(types: TypeFormatTable, number: NumberFormat, boolean: BooleanFormat) -> Self {
        CellFormatter {
            types,
            number,
            boolean,
        }
    }

    /// The active type-format table
    pub fn type_formats(&self) -> &TypeFormatTable {
        &self.types
    }

    /// Whether the logical type has an entry (text is always supported)
    pub fn supports(&self, logical_type: LogicalType) -> bool {
        logical_type == LogicalType::Text || self.types.contains_key(&logical_type)
    }

    /// Format one value
    ///
    /// Values that cannot be read as the column's type, and types missing from
    /// the table, are passed through as text. A cell whose display is blank is
    /// always an unstyled string.
    pub fn format(
        &self,
        raw: &RawValue,
        logical_type: LogicalType,
        ctx: FormatContext,
    ) -> FormattedCell {
        if raw.is_null() || logical_type == LogicalType::Text {
            return self.format_text(raw);
        }

        let Some(entry) = self.types.get(&logical_type) else {
            tracing::trace!(row = ctx.row_index, %logical_type, "no format entry, passing through");
            return self.format_text(raw);
        };
        let style = entry
            .number_format
            .as_ref()
            .map(|_| logical_type.style_id());

        let typed = match logical_type {
            LogicalType::Integer => integer_value(raw)
                .map(|i| (self.number.format_integer(i), itoa::Buffer::new().format(i).to_string())),
            LogicalType::Number => raw
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| (self.number.format_decimal(f), f.to_string())),
            LogicalType::Date => parse_datetime(raw).map(|ts| {
                (
                    ts.format("%Y-%m-%d").to_string(),
                    ts.format("%Y-%m-%dT00:00:00.000").to_string(),
                )
            }),
            LogicalType::Time => parse_time(raw).map(|t| {
                (
                    t.format("%H:%M:%S").to_string(),
                    t.format("1899-12-31T%H:%M:%S.000").to_string(),
                )
            }),
            LogicalType::DateTime => parse_datetime(raw).map(|ts| {
                (
                    ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                )
            }),
            LogicalType::Boolean => raw.as_bool().map(|b| {
                (
                    self.boolean.display(b).to_string(),
                    if b { "1" } else { "0" }.to_string(),
                )
            }),
            LogicalType::Text => None,
        };

        let Some((display, literal)) = typed else {
            tracing::trace!(row = ctx.row_index, %logical_type, "value does not match column type");
            return self.format_text(raw);
        };

        let mut cell = FormattedCell::typed(display, entry.kind, style, literal);
        if cell.is_blank() {
            cell.downgrade();
        }
        cell
    }

    fn format_text(&self, raw: &RawValue) -> FormattedCell {
        match raw {
            RawValue::Boolean(b) => FormattedCell::text(self.boolean.display(*b)),
            other => FormattedCell::text(other.as_string()),
        }
    }
}

fn integer_value(raw: &RawValue) -> Option<i64> {
    raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.trunc() as i64)
    })
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_datetime(raw: &RawValue) -> Option<NaiveDateTime> {
    match raw {
        RawValue::Timestamp(ts) => Some(*ts),
        RawValue::Integer(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
        RawValue::String(s) => {
            let s = s.trim();
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}

fn parse_time(raw: &RawValue) -> Option<NaiveTime> {
    if let RawValue::String(s) = raw {
        let s = s.trim();
        if let Some(t) = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        {
            return Some(t);
        }
    }
    parse_datetime(raw).map(|ts| ts.time())
}
