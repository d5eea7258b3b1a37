//! Column descriptors: label, logical type and extraction rule for one output column

use std::fmt;
use std::sync::Arc;

use crate::types::{LogicalType, RawValue, Record};

type ExtractFn = dyn Fn(&Record, u64) -> RawValue + Send + Sync;

/// Rule for pulling a column's raw value out of a record
#[derive(Clone)]
pub enum Extractor {
    /// Value stored under a key
    Key(String),
    /// Value at a position in the record
    Index(usize),
    /// Row-number pseudo-column: `start + row_index`
    Serial { start: i64 },
    /// Arbitrary computation over the record and its zero-based row index
    Computed(Arc<ExtractFn>),
}

impl Extractor {
    /// Build a computed extractor from a closure
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Record, u64) -> RawValue + Send + Sync + 'static,
    {
        Extractor::Computed(Arc::new(f))
    }

    /// Extract the raw value; missing keys and positions yield `Null`
    pub fn extract(&self, record: &Record, row_index: u64) -> RawValue {
        match self {
            Extractor::Key(key) => record.get(key).cloned().unwrap_or(RawValue::Null),
            Extractor::Index(index) => record.get_index(*index).cloned().unwrap_or(RawValue::Null),
            Extractor::Serial { start } => RawValue::Integer(start + row_index as i64),
            Extractor::Computed(f) => f(record, row_index),
        }
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Extractor::Index(index) => f.debug_tuple("Index").field(index).finish(),
            Extractor::Serial { start } => f.debug_struct("Serial").field("start", start).finish(),
            Extractor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Definition of one output column
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Identifier, used as the default extraction key
    pub key: String,
    /// Header text
    pub label: String,
    pub logical_type: LogicalType,
    pub extractor: Extractor,
    pub visible: bool,
}

impl ColumnDescriptor {
    /// Column reading `key` from each record, labelled with the key itself
    pub fn new(key: impl Into<String>, logical_type: LogicalType) -> Self {
        let key = key.into();
        ColumnDescriptor {
            label: key.clone(),
            extractor: Extractor::Key(key.clone()),
            key,
            logical_type,
            visible: true,
        }
    }

    /// Plain text column
    pub fn text(key: impl Into<String>) -> Self {
        Self::new(key, LogicalType::Text)
    }

    /// Column whose type is given by name; unknown names fall back to text
    pub fn with_type_name(key: impl Into<String>, type_name: &str) -> Self {
        Self::new(key, LogicalType::parse_lenient(type_name))
    }

    /// One-based row-number column
    pub fn serial(label: impl Into<String>) -> Self {
        let label = label.into();
        ColumnDescriptor {
            key: label.clone(),
            label,
            logical_type: LogicalType::Integer,
            extractor: Extractor::Serial { start: 1 },
            visible: true,
        }
    }

    /// Set the header label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the extraction rule
    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set visibility
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub(crate) fn extract(&self, record: &Record, row_index: u64) -> RawValue {
        self.extractor.extract(record, row_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_index_extraction() {
        let record = Record::new().with("id", 7).with("name", "Ann");

        let by_key = ColumnDescriptor::text("name");
        assert_eq!(by_key.extract(&record, 0), RawValue::from("Ann"));

        let by_index = ColumnDescriptor::text("first").extractor(Extractor::Index(0));
        assert_eq!(by_index.extract(&record, 0), RawValue::Integer(7));

        let missing = ColumnDescriptor::text("email");
        assert_eq!(missing.extract(&record, 0), RawValue::Null);
    }

    #[test]
    fn test_serial_and_computed() {
        let record = Record::new();
        let serial = ColumnDescriptor::serial("#");
        assert_eq!(serial.extract(&record, 0), RawValue::Integer(1));
        assert_eq!(serial.extract(&record, 41), RawValue::Integer(42));

        let computed = ColumnDescriptor::text("parity").extractor(Extractor::computed(|_, row| {
            RawValue::from(if row % 2 == 0 { "even" } else { "odd" })
        }));
        assert_eq!(computed.extract(&record, 3), RawValue::from("odd"));
    }

    #[test]
    fn test_type_name_fallback() {
        let column = ColumnDescriptor::with_type_name("price", "currency");
        assert_eq!(column.logical_type, LogicalType::Text);
        assert_eq!(column.label, "price");
    }
}
