//! Value and record types shared by every stage of an export

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ExportError;

/// Semantic kind of a column's values, independent of the output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LogicalType {
    Text,
    Integer,
    Number,
    Date,
    Time,
    DateTime,
    Boolean,
}

impl LogicalType {
    /// All logical types, in the order the default format table lists them
    pub const ALL: [LogicalType; 7] = [
        LogicalType::Integer,
        LogicalType::Number,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::DateTime,
        LogicalType::Boolean,
        LogicalType::Text,
    ];

    /// Lower-case name used in configuration
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Text => "text",
            LogicalType::Integer => "integer",
            LogicalType::Number => "number",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::DateTime => "datetime",
            LogicalType::Boolean => "boolean",
        }
    }

    /// Style identifier referenced by spreadsheet cells of this type
    pub fn style_id(&self) -> &'static str {
        match self {
            LogicalType::Text => "TextFormat",
            LogicalType::Integer => "IntegerFormat",
            LogicalType::Number => "NumberFormat",
            LogicalType::Date => "DateFormat",
            LogicalType::Time => "TimeFormat",
            LogicalType::DateTime => "DateTimeFormat",
            LogicalType::Boolean => "BooleanFormat",
        }
    }

    /// Parse a type name, treating unknown names as text
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: ExportError| {
            tracing::warn!("{}; exporting column as text", err);
            LogicalType::Text
        })
    }
}

impl FromStr for LogicalType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "raw" | "ntext" => Ok(LogicalType::Text),
            "integer" | "int" => Ok(LogicalType::Integer),
            "number" | "decimal" | "float" => Ok(LogicalType::Number),
            "date" => Ok(LogicalType::Date),
            "time" => Ok(LogicalType::Time),
            "datetime" | "timestamp" => Ok(LogicalType::DateTime),
            "boolean" | "bool" => Ok(LogicalType::Boolean),
            _ => Err(ExportError::UnsupportedColumnType(s.to_string())),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spreadsheet data type of a formatted cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellKind {
    String,
    Number,
    DateTime,
    Boolean,
}

impl CellKind {
    /// Value of the `ss:Type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::String => "String",
            CellKind::Number => "Number",
            CellKind::DateTime => "DateTime",
            CellKind::Boolean => "Boolean",
        }
    }
}

/// Raw value extracted from a record before formatting
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl RawValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Plain string form, without any type-driven formatting
    pub fn as_string(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::String(s) => s.clone(),
            RawValue::Integer(i) => itoa::Buffer::new().format(*i).to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            RawValue::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Integer(i) => Some(*i),
            RawValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(*f as i64)
            }
            RawValue::Boolean(b) => Some(*b as i64),
            RawValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(f) => Some(*f),
            RawValue::Integer(i) => Some(*i as f64),
            RawValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            RawValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Boolean(b) => Some(*b),
            RawValue::Integer(i) => Some(*i != 0),
            RawValue::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" | "t" | "y" => Some(true),
                "false" | "no" | "0" | "f" | "n" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<i32> for RawValue {
    fn from(i: i32) -> Self {
        RawValue::Integer(i as i64)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Boolean(b)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(ts: NaiveDateTime) -> Self {
        RawValue::Timestamp(ts)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// One formatted cell, produced per (record, column) pair and discarded after the row is written
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedCell {
    /// Human-readable text
    pub display: String,
    /// Style identifier for spreadsheet output
    pub style: Option<&'static str>,
    /// Spreadsheet data type
    pub kind: CellKind,
    /// Locale-independent machine value for typed output (numbers, dates, booleans)
    pub literal: Option<String>,
}

impl FormattedCell {
    /// Create an unstyled text cell
    pub fn text(display: impl Into<String>) -> Self {
        FormattedCell {
            display: display.into(),
            style: None,
            kind: CellKind::String,
            literal: None,
        }
    }

    /// Create a typed cell
    pub fn typed(
        display: String,
        kind: CellKind,
        style: Option<&'static str>,
        literal: String,
    ) -> Self {
        FormattedCell {
            display,
            style,
            kind,
            literal: Some(literal),
        }
    }

    /// Whether the display text is blank, ignoring whitespace and non-breaking spaces
    pub fn is_blank(&self) -> bool {
        is_blank(&self.display)
    }

    /// Drop any typing and styling, keeping the display text
    pub fn downgrade(&mut self) {
        self.style = None;
        self.kind = CellKind::String;
        self.literal = None;
    }
}

/// Trim ASCII whitespace, NUL, vertical tab and U+00A0
pub(crate) fn trim_blank(s: &str) -> &str {
    s.trim_matches(|c: char| {
        matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\u{0b}' | '\u{a0}')
    })
}

pub(crate) fn is_blank(s: &str) -> bool {
    trim_blank(s).is_empty()
}

/// One row of input data with keyed and positional access
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: IndexMap<String, RawValue>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record::default()
    }

    /// Create a record from ordered key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        Record {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get value by key
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    /// Get value by position
    pub fn get_index(&self, index: usize) -> Option<&RawValue> {
        self.values.get_index(index).map(|(_, v)| v)
    }

    /// Column keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Get number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the record has no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_conversions() {
        let val = RawValue::Integer(42);
        assert_eq!(val.as_i64(), Some(42));
        assert_eq!(val.as_f64(), Some(42.0));

        let val = RawValue::String(" yes ".to_string());
        assert_eq!(val.as_bool(), Some(true));

        assert_eq!(RawValue::Float(2.5).as_i64(), None);
        assert_eq!(RawValue::Float(-3.0).as_i64(), Some(-3));
        assert_eq!(RawValue::Float(1e20).as_i64(), None);
        assert_eq!(RawValue::Float(f64::INFINITY).as_i64(), None);
        assert_eq!(RawValue::from(None::<i64>), RawValue::Null);
    }

    #[test]
    fn test_logical_type_parse() {
        assert_eq!("DateTime".parse::<LogicalType>().unwrap(), LogicalType::DateTime);
        assert!(matches!(
            "currency".parse::<LogicalType>(),
            Err(ExportError::UnsupportedColumnType(_))
        ));
        assert_eq!(LogicalType::parse_lenient("currency"), LogicalType::Text);
    }

    #[test]
    fn test_record_access() {
        let record = Record::new().with("id", 1).with("name", "Ann");
        assert_eq!(record.get("name"), Some(&RawValue::from("Ann")));
        assert_eq!(record.get_index(0), Some(&RawValue::Integer(1)));
        assert_eq!(record.get_index(5), None);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_blank_detection() {
        assert!(FormattedCell::text(" \u{a0}\t").is_blank());
        assert!(!FormattedCell::text(" 0 ").is_blank());
    }
}
