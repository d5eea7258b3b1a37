//! Row sources: bulk (pre-fetched page) and cursor (lazy forward-only read)
//!
//! The strategy is chosen once per run from the caller's pagination limit:
//! a limit below the bulk threshold reads the already-materialised page,
//! anything else (a large limit, or no pagination at all) opens a cursor.
//! Only the limit is considered, never the actual row count.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{ExportError, Result};
use crate::types::{RawValue, Record};

/// Sort direction of one ordering term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One `(column, direction)` ordering term
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortOrder {
    pub column: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(column: impl Into<String>) -> Self {
        SortOrder {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        SortOrder {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Caller-supplied page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    pub fn new(limit: usize, offset: usize) -> Self {
        Pagination { limit, offset }
    }
}

/// Forward-only, at-most-once reader over a query result
pub trait Cursor {
    /// Read the next record; `Ok(None)` once exhausted
    fn read(&mut self) -> Result<Option<Record>>;
}

/// Cursor over any fallible record iterator
pub struct IterCursor<I> {
    inner: I,
}

impl<I> IterCursor<I>
where
    I: Iterator<Item = Result<Record>>,
{
    pub fn new(inner: I) -> Self {
        IterCursor { inner }
    }
}

impl<I> Cursor for IterCursor<I>
where
    I: Iterator<Item = Result<Record>>,
{
    fn read(&mut self) -> Result<Option<Record>> {
        self.inner.next().transpose()
    }
}

/// Data-access collaborator
pub trait DataSource {
    /// Pagination requested by the caller, if any
    fn pagination(&self) -> Option<Pagination>;

    /// Ordering requested by the caller
    fn sort_orders(&self) -> Vec<SortOrder> {
        Vec::new()
    }

    /// The current page, already fetched
    fn records_bulk(&mut self) -> Result<Vec<Record>>;

    /// Open a lazy cursor over the sorted result set
    fn open_cursor(
        &mut self,
        order: &[SortOrder],
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Box<dyn Cursor + '_>>;
}

/// Traversal strategy of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    Bulk,
    Cursor,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Bulk => "bulk",
            Strategy::Cursor => "cursor",
        })
    }
}

/// Pick the strategy for a run from the pagination limit alone
pub fn select_strategy(pagination: Option<&Pagination>, bulk_threshold: usize) -> Strategy {
    match pagination {
        Some(page) if page.limit < bulk_threshold => Strategy::Bulk,
        _ => Strategy::Cursor,
    }
}

/// Records of one run, yielded in source order
pub enum RowSource<'a> {
    Bulk(std::vec::IntoIter<Record>),
    Cursor(CursorRows<'a>),
}

/// Cursor-backed rows; fused after exhaustion or the first failure
pub struct CursorRows<'a> {
    cursor: Box<dyn Cursor + 'a>,
    rows_read: u64,
    done: bool,
}

impl<'a> RowSource<'a> {
    /// Select a strategy and open the corresponding source
    pub fn open(source: &'a mut dyn DataSource, bulk_threshold: usize) -> Result<Self> {
        let pagination = source.pagination();
        match select_strategy(pagination.as_ref(), bulk_threshold) {
            Strategy::Bulk => {
                let records = source.records_bulk()?;
                tracing::debug!("Using bulk rows: {} records", records.len());
                Ok(RowSource::Bulk(records.into_iter()))
            }
            Strategy::Cursor => {
                let order = source.sort_orders();
                let limit = pagination.map(|p| p.limit);
                let offset = pagination.map(|p| p.offset);
                tracing::debug!(?limit, ?offset, "Opening cursor");
                let cursor = source.open_cursor(&order, limit, offset)?;
                Ok(RowSource::from_cursor(cursor))
            }
        }
    }

    /// Rows from a pre-fetched list
    pub fn from_records(records: Vec<Record>) -> Self {
        RowSource::Bulk(records.into_iter())
    }

    /// Rows pulled from a cursor
    pub fn from_cursor(cursor: Box<dyn Cursor + 'a>) -> Self {
        RowSource::Cursor(CursorRows {
            cursor,
            rows_read: 0,
            done: false,
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            RowSource::Bulk(_) => Strategy::Bulk,
            RowSource::Cursor(_) => Strategy::Cursor,
        }
    }
}

impl Iterator for RowSource<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RowSource::Bulk(records) => records.next().map(Ok),
            RowSource::Cursor(rows) => rows.next(),
        }
    }
}

impl Iterator for CursorRows<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.read() {
            Ok(Some(record)) => {
                self.rows_read += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                let err = match err {
                    err @ ExportError::SourceRead { .. } => err,
                    other => ExportError::source_read(self.rows_read, other.to_string()),
                };
                Some(Err(err))
            }
        }
    }
}

/// In-memory data source, sorted and paged on request
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Record>,
    pagination: Option<Pagination>,
    order: Vec<SortOrder>,
}

impl MemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        MemorySource {
            records,
            pagination: None,
            order: Vec::new(),
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_order(mut self, order: Vec<SortOrder>) -> Self {
        self.order = order;
        self
    }

    fn window(&self, order: &[SortOrder], limit: Option<usize>, offset: Option<usize>) -> Vec<Record> {
        let mut records = self.records.clone();
        if !order.is_empty() {
            records.sort_by(|a, b| compare_records(a, b, order));
        }
        records
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}

impl DataSource for MemorySource {
    fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    fn sort_orders(&self) -> Vec<SortOrder> {
        self.order.clone()
    }

    fn records_bulk(&mut self) -> Result<Vec<Record>> {
        let limit = self.pagination.map(|p| p.limit);
        let offset = self.pagination.map(|p| p.offset);
        Ok(self.window(&self.order, limit, offset))
    }

    fn open_cursor(
        &mut self,
        order: &[SortOrder],
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Box<dyn Cursor + '_>> {
        let records = self.window(order, limit, offset);
        Ok(Box::new(IterCursor::new(records.into_iter().map(Ok))))
    }
}

fn compare_records(a: &Record, b: &Record, order: &[SortOrder]) -> Ordering {
    order
        .iter()
        .map(|term| {
            let ord = compare_raw(
                a.get(&term.column).unwrap_or(&RawValue::Null),
                b.get(&term.column).unwrap_or(&RawValue::Null),
            );
            match term.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn compare_raw(a: &RawValue, b: &RawValue) -> Ordering {
    match (a, b) {
        (RawValue::Null, RawValue::Null) => Ordering::Equal,
        (RawValue::Null, _) => Ordering::Less,
        (_, RawValue::Null) => Ordering::Greater,
        (RawValue::Integer(x), RawValue::Integer(y)) => x.cmp(y),
        (RawValue::Timestamp(x), RawValue::Timestamp(y)) => x.cmp(y),
        (RawValue::Boolean(x), RawValue::Boolean(y)) => x.cmp(y),
        (RawValue::String(x), RawValue::String(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a.as_string().cmp(&b.as_string()),
        },
    }
}
