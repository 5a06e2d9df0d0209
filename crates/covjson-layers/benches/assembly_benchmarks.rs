//! Benchmarks for raster and vector assembly.
//!
//! Run with: cargo bench --package covjson-layers --bench assembly_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use covjson::{CoverageJsonReader, Document};
use covjson_layers::{LayerConfig, LayerMaterializer, RasterAssembler, StridedArray, VectorAssembler};
use test_utils::{trajectory_collection, GridFixture};

// ============================================================================
// Parsing
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for &(nx, ny) in &[(64, 64), (256, 256)] {
        let json = GridFixture::new(nx, ny)
            .with_times(4)
            .with_parameter("TMP", Some("K"))
            .build()
            .to_string();
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::new("grid", format!("{}x{}", nx, ny)), &json, |b, json| {
            b.iter(|| CoverageJsonReader::from_str(black_box(json)).unwrap())
        });
    }

    group.finish();
}

// ============================================================================
// Raster assembly
// ============================================================================

fn bench_raster_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("raster_assembly");
    let assembler = RasterAssembler::new(LayerConfig::default());

    for &times in &[1usize, 13, 48] {
        let fixture = GridFixture::new(128, 96).with_times(times).with_parameter("TMP", Some("K"));
        let document = Document::from_value(fixture.build()).unwrap();
        let coverage = &document.coverages()[0];

        group.throughput(Throughput::Elements((128 * 96 * times) as u64));
        group.bench_with_input(BenchmarkId::new("time_steps", times), coverage, |b, coverage| {
            b.iter(|| assembler.assemble(black_box(coverage), 0, "TMP").unwrap())
        });
    }

    group.finish();
}

fn bench_strided_blocks(c: &mut Criterion) {
    let shape = vec![3, 13, 2, 96, 128];
    let len: usize = shape.iter().product();
    let names: Vec<String> = ["number", "t", "z", "y", "x"].iter().map(|s| s.to_string()).collect();
    let array = StridedArray::new(vec![1.0f64; len], shape, names).unwrap();

    c.bench_function("strided_blocks", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for prefix in array.leading_indices(3) {
                if let Some(block) = array.block(black_box(&prefix)) {
                    sum += block[0];
                }
            }
            sum
        })
    });
}

// ============================================================================
// Vector assembly
// ============================================================================

fn bench_vector_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_assembly");
    let assembler = VectorAssembler::new();
    let parameters = vec!["track_type".to_string()];

    for &count in &[221usize, 2000] {
        let document = Document::from_value(trajectory_collection(count, 24, Some(10))).unwrap();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("trajectories", count), &document, |b, document| {
            b.iter(|| assembler.assemble(black_box(document.coverages()), &parameters).unwrap())
        });
    }

    group.finish();
}

fn bench_materialize(c: &mut Criterion) {
    let reader = CoverageJsonReader::from_str(&GridFixture::time_series().build().to_string()).unwrap();
    let materializer = LayerMaterializer::new(LayerConfig::default());

    c.bench_function("materialize_time_series", |b| {
        b.iter(|| materializer.map_layers(black_box(&reader)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_raster_assembly,
    bench_strided_blocks,
    bench_vector_assembly,
    bench_materialize,
);
criterion_main!(benches);
