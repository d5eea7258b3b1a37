//! Row rendering: extract, format and clean up every cell of a record

use std::borrow::Cow;

use crate::column::ColumnDescriptor;
use crate::error::{ExportError, Result};
use crate::formatter::{CellFormatter, FormatContext};
use crate::options::ExportOptions;
use crate::text::{self, Transliterator};
use crate::types::{is_blank, FormattedCell, Record};

/// Text clean-up steps, applied in order: strip tags, decode entities,
/// transliterate, replace newlines
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub strip_tags: bool,
    pub decode_entities: bool,
    pub transliterator: Option<Transliterator>,
    pub newline_replacement: Option<String>,
}

impl RenderOptions {
    /// Render options taken from export options; fails on an unknown encoding label
    pub fn from_export_options(options: &ExportOptions) -> Result<Self> {
        let transliterator = options
            .encoding
            .as_deref()
            .map(Transliterator::for_label)
            .transpose()?;
        Ok(RenderOptions {
            strip_tags: options.strip_tags,
            decode_entities: options.decode_entities,
            transliterator,
            newline_replacement: options.newline_replacement.clone(),
        })
    }
}

/// Turns records into ordered lists of formatted cells
#[derive(Debug, Clone)]
pub struct RowRenderer {
    columns: Vec<ColumnDescriptor>,
    formatter: CellFormatter,
    options: RenderOptions,
}

impl RowRenderer {
    /// Create a renderer; columns whose type has no formatter entry are reported once and exported as text
    pub fn new(columns: Vec<ColumnDescriptor>, formatter: CellFormatter, options: RenderOptions) -> Self {
        for column in columns
            .iter()
            .filter(|c| !formatter.supports(c.logical_type))
        {
            let err = ExportError::UnsupportedColumnType(column.logical_type.to_string());
            tracing::warn!(column = %column.key, "{}; exporting as text", err);
        }

        RowRenderer {
            columns,
            formatter,
            options,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn formatter(&self) -> &CellFormatter {
        &self.formatter
    }

    pub fn transliterator(&self) -> Option<&Transliterator> {
        self.options.transliterator.as_ref()
    }

    /// Header labels, converted to the output encoding
    pub fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match &self.options.transliterator {
                Some(t) => t.transliterate(&column.label).into_owned(),
                None => column.label.clone(),
            })
            .collect()
    }

    /// Render one record into exactly one cell per column
    pub fn render(&self, row_index: u64, record: &Record) -> Vec<FormattedCell> {
        let ctx = FormatContext { row_index };
        self.columns
            .iter()
            .map(|column| {
                let raw = column.extract(record, row_index);
                let mut cell = self.formatter.format(&raw, column.logical_type, ctx);
                self.clean(&mut cell);
                cell
            })
            .collect()
    }

    /// Render one record to display strings only
    pub fn render_strings(&self, row_index: u64, record: &Record) -> Vec<String> {
        self.render(row_index, record)
            .into_iter()
            .map(|cell| cell.display)
            .collect()
    }

    fn clean(&self, cell: &mut FormattedCell) {
        let opts = &self.options;
        let mut value = std::mem::take(&mut cell.display);

        if opts.strip_tags {
            if let Some(s) = owned(text::strip_tags(&value)) {
                value = s;
            }
        }
        if opts.decode_entities {
            if let Some(s) = owned(text::decode_entities(&value)) {
                value = s;
            }
        }
        if let Some(t) = &opts.transliterator {
            if let Some(s) = owned(t.transliterate(&value)) {
                value = s;
            }
        }
        if let Some(replacement) = &opts.newline_replacement {
            if let Some(s) = owned(text::replace_newlines(&value, replacement)) {
                value = s;
            }
        }

        cell.display = value;
        if cell.literal.is_some() && is_blank(&cell.display) {
            cell.downgrade();
        }
    }
}

fn owned(cow: Cow<'_, str>) -> Option<String> {
    match cow {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellKind, LogicalType, RawValue};

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", LogicalType::Integer),
            ColumnDescriptor::text("name"),
            ColumnDescriptor::new("joined", LogicalType::Date),
        ]
    }

    fn renderer(options: RenderOptions) -> RowRenderer {
        RowRenderer::new(columns(), CellFormatter::default(), options)
    }

    #[test]
    fn test_render_one_cell_per_column() {
        let r = renderer(RenderOptions::default());
        let record = Record::new()
            .with("id", 1)
            .with("name", "Ann")
            .with("joined", "2020-01-02")
            .with("ignored", "x");

        let cells = r.render(0, &record);
        assert_eq!(cells.len(), 3);
        assert_eq!(r.render_strings(0, &record), vec!["1", "Ann", "2020-01-02"]);
        assert_eq!(cells[0].kind, CellKind::Number);
        assert_eq!(cells[1].kind, CellKind::String);

        let sparse = r.render(1, &Record::new().with("name", "Bob"));
        assert_eq!(sparse.len(), 3);
        assert_eq!(sparse[0].display, "");
    }

    #[test]
    fn test_cleanup_order() {
        let r = renderer(RenderOptions {
            strip_tags: true,
            decode_entities: true,
            transliterator: None,
            newline_replacement: Some(", ".to_string()),
        });
        let record = Record::new().with("name", "<b>Fish</b> &amp;\nChips &lt;i&gt;");

        // decoded entities are not stripped again
        assert_eq!(r.render_strings(0, &record)[1], "Fish &, Chips <i>");
    }

    #[test]
    fn test_cleanup_disabled() {
        let r = renderer(RenderOptions::default());
        let record = Record::new().with("name", "<b>B\nob</b> &amp;");
        assert_eq!(r.render_strings(0, &record)[1], "<b>B\nob</b> &amp;");
    }

    #[test]
    fn test_transliteration_substitutes_bad_cells() {
        let r = renderer(RenderOptions {
            transliterator: Some(Transliterator::for_label("ISO-8859-2").unwrap()),
            ..RenderOptions::default()
        });
        let record = Record::new().with("name", "Łukasz ✓");
        assert_eq!(r.render_strings(0, &record)[1], "Łukasz ?");
    }

    #[test]
    fn test_header_labels() {
        let cols = vec![ColumnDescriptor::text("a").label("Città ✓")];
        let r = RowRenderer::new(
            cols,
            CellFormatter::default(),
            RenderOptions {
                transliterator: Some(Transliterator::for_label("latin1").unwrap()),
                ..RenderOptions::default()
            },
        );
        assert_eq!(r.header(), vec!["Città ?"]);
    }

    #[test]
    fn test_typed_cell_blanked_by_cleanup_is_downgraded() {
        let cols = vec![ColumnDescriptor::new("n", LogicalType::Number)];
        let r = RowRenderer::new(cols, CellFormatter::default(), RenderOptions::default());
        let cells = r.render(0, &Record::new().with("n", RawValue::Null));
        assert_eq!(cells[0].kind, CellKind::String);
        assert_eq!(cells[0].style, None);
    }
}
