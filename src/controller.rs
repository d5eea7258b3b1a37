//! Export runs: source → renderer → emitter → output stream

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::column::ColumnDescriptor;
use crate::emitter::{create_emitter, CountingWriter, Emitter, TranscodingWriter};
use crate::error::{ExportError, Result};
use crate::options::{ExportFormat, ExportOptions};
use crate::render::{RenderOptions, RowRenderer};
use crate::source::{DataSource, RowSource, Strategy};

/// Buffer between the emitter and the output stream
const OUTPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of a completed export run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportSummary {
    /// Body rows written
    pub rows: u64,
    pub strategy: Strategy,
    /// Bytes handed to the output stream
    pub bytes_written: u64,
    pub elapsed_ms: u64,
}

/// Drives export runs for a fixed column configuration
///
/// A run reads every record of the source in order, renders it and hands it
/// to the emitter for the requested format. Rows are never reordered or held
/// back; a failure stops the run with the output written so far flushed to
/// the stream.
///
/// # Examples
///
/// ```
/// use gridstream::{ColumnDescriptor, ExportController, ExportFormat, ExportOptions, LogicalType, MemorySource, Record};
///
/// let columns = vec![
///     ColumnDescriptor::new("id", LogicalType::Integer),
///     ColumnDescriptor::text("name"),
/// ];
/// let controller = ExportController::new(
///     columns,
///     ExportOptions::for_format(ExportFormat::Delimited),
/// ).unwrap();
///
/// let mut source = MemorySource::new(vec![Record::new().with("id", 1).with("name", "Ann")]);
/// let mut out = Vec::new();
/// let summary = controller.export(ExportFormat::Delimited, &mut source, &mut out).unwrap();
///
/// assert_eq!(summary.rows, 1);
/// assert_eq!(String::from_utf8(out).unwrap(), "id;name\n1;Ann\n");
/// ```
#[derive(Debug, Clone)]
pub struct ExportController {
    renderer: RowRenderer,
    options: ExportOptions,
}

impl ExportController {
    /// Validate options and resolve the columns of the run
    ///
    /// Columns flagged invisible are dropped unless `include_invisible` is set.
    pub fn new(columns: Vec<ColumnDescriptor>, options: ExportOptions) -> Result<Self> {
        options.validate()?;

        let total = columns.len();
        let columns: Vec<ColumnDescriptor> = if options.include_invisible {
            columns
        } else {
            columns.into_iter().filter(|c| c.visible).collect()
        };
        if columns.len() < total {
            debug!("Skipping {} invisible columns", total - columns.len());
        }

        let renderer = RowRenderer::new(
            columns,
            options.cell_formatter(),
            RenderOptions::from_export_options(&options)?,
        );
        Ok(ExportController { renderer, options })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn renderer(&self) -> &RowRenderer {
        &self.renderer
    }

    /// Export every record of `source` to `sink` in the given format
    ///
    /// The row source is opened before anything is written, so a source that
    /// cannot be opened leaves the sink untouched.
    pub fn export<W: Write>(
        &self,
        format: ExportFormat,
        source: &mut dyn DataSource,
        sink: W,
    ) -> Result<ExportSummary> {
        let started = Instant::now();
        let mut rows = RowSource::open(source, self.options.bulk_threshold)?;
        let strategy = rows.strategy();
        info!(
            %format,
            %strategy,
            columns = self.renderer.columns().len(),
            "Starting export"
        );

        let transcode_to = self
            .renderer
            .transliterator()
            .filter(|t| !t.is_utf8())
            .map(|t| t.encoding());

        let mut counter = CountingWriter::new(sink);
        let result = {
            let target: Box<dyn Write + '_> = match transcode_to {
                Some(encoding) => Box::new(TranscodingWriter::new(&mut counter, encoding)),
                None => Box::new(&mut counter),
            };
            let buffered = BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, target);
            let mut emitter = create_emitter(format, buffered, &self.options)?;

            let result = self.run(&mut rows, emitter.as_mut());
            if result.is_err() {
                if let Err(err) = emitter.flush() {
                    warn!("Failed to flush partial output: {}", err);
                }
            }
            result
        };

        let rows = match result {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    bytes = counter.bytes_written(),
                    "Export aborted: {}", err
                );
                return Err(err);
            }
        };

        let summary = ExportSummary {
            rows,
            strategy,
            bytes_written: counter.bytes_written(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            rows = summary.rows,
            bytes = summary.bytes_written,
            elapsed_ms = summary.elapsed_ms,
            "Export completed"
        );
        Ok(summary)
    }

    /// Export to a newly created file
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        format: ExportFormat,
        source: &mut dyn DataSource,
        path: P,
    ) -> Result<ExportSummary> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Exporting to file");
        self.export(format, source, file)
    }

    /// Write header, every row and footer through an emitter; returns the row count
    pub fn run(&self, rows: &mut RowSource<'_>, emitter: &mut dyn Emitter) -> Result<u64> {
        let progress_interval = self.options.progress_interval.max(1);

        emitter.write_header(&self.renderer.header())?;

        let mut row_index: u64 = 0;
        for record in rows {
            let record = record?;
            let cells = self.renderer.render(row_index, &record);
            emitter
                .write_row(&cells)
                .map_err(|e| ExportError::WriteRowError {
                    row: row_index,
                    source: Box::new(e),
                })?;
            row_index += 1;

            if row_index % progress_interval == 0 {
                debug!("Exported {} rows", row_index);
            }
        }

        emitter.write_footer()?;
        Ok(row_index)
    }
}
