use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridstream::formatter::FormatContext;
use gridstream::{
    CellFormatter, ColumnDescriptor, ExportController, ExportFormat, ExportOptions, LogicalType,
    MemorySource, RawValue, Record,
};

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", LogicalType::Integer).label("ID"),
        ColumnDescriptor::text("name").label("Name"),
        ColumnDescriptor::new("amount", LogicalType::Number).label("Amount"),
        ColumnDescriptor::new("created", LogicalType::DateTime).label("Created"),
        ColumnDescriptor::new("active", LogicalType::Boolean).label("Active"),
    ]
}

fn records(size: usize) -> Vec<Record> {
    (0..size)
        .map(|i| {
            Record::new()
                .with("id", i as i64)
                .with("name", format!("Name_{} <b>&amp;</b>", i))
                .with("amount", i as f64 * 1.25)
                .with("created", "2024-03-01 12:30:00")
                .with("active", i % 2 == 0)
        })
        .collect()
}

fn benchmark_export(c: &mut Criterion) {
    let formats = [
        ExportFormat::Delimited,
        ExportFormat::Json,
        ExportFormat::SpreadsheetXml,
    ];

    for format in formats {
        let mut group = c.benchmark_group(format!("export_{}", format));
        group.sample_size(10); // Reduce samples for large benchmarks

        let controller =
            ExportController::new(columns(), ExportOptions::for_format(format)).unwrap();

        for size in [1000usize, 10000, 50000] {
            let data = records(size);
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| {
                    // no pagination: every run goes through the cursor
                    let mut source = MemorySource::new(data.clone());
                    let summary = controller
                        .export(format, &mut source, std::io::sink())
                        .unwrap();
                    black_box(summary);
                });
            });
        }

        group.finish();
    }
}

fn benchmark_format(c: &mut Criterion) {
    let formatter = CellFormatter::default();
    let values = [
        (RawValue::Integer(1_234_567), LogicalType::Integer),
        (RawValue::Float(-9876.543), LogicalType::Number),
        (RawValue::from("2024-03-01 12:30:00"), LogicalType::DateTime),
        (RawValue::Boolean(true), LogicalType::Boolean),
    ];

    c.bench_function("format_cells", |b| {
        b.iter(|| {
            for (raw, logical_type) in &values {
                black_box(formatter.format(raw, *logical_type, FormatContext::default()));
            }
        });
    });
}

criterion_group!(benches, benchmark_export, benchmark_format);
criterion_main!(benches);
