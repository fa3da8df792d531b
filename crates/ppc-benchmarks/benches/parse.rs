//! Tokenizer, parser and renderer performance benchmarks
//!
//! Benchmarks tokenizing and parsing `.ppc` documents of growing size, and
//! rendering parsed documents back to text.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ppc_benchmarks::{create_document, criterion_config};
use ppc_config::render_document;
use ppc_parser::{parse, parse_tokens, tokenize};

/// Benchmark tokenizing documents of different sizes
fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    group.measurement_time(std::time::Duration::from_secs(5));

    for sections in [10, 100, 1000].iter() {
        let text = create_document(*sections, 12);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("sections", sections), &text, |b, text| {
            b.iter(|| black_box(tokenize(text).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark building the document tree from tokens
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.measurement_time(std::time::Duration::from_secs(5));

    for sections in [10, 100, 1000].iter() {
        let text = create_document(*sections, 12);
        let tokens = tokenize(&text).unwrap();
        group.throughput(Throughput::Elements(tokens.len() as u64));

        group.bench_with_input(BenchmarkId::new("tokens_only", sections), &tokens, |b, tokens| {
            b.iter(|| black_box(parse_tokens(tokens.clone()).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("text", sections), &text, |b, text| {
            b.iter(|| black_box(parse(text).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark repeated headers reopening the same sections
fn bench_section_merging(c: &mut Criterion) {
    let mut group = c.benchmark_group("section_merging");

    let mut text = String::new();
    for i in 0..500 {
        text.push_str(&format!(">> a.b.c{}\n  k = {}\n>> a.b\n  j{} = 1\n", i % 10, i, i));
    }

    group.bench_function("reopened_sections", |b| {
        b.iter(|| black_box(parse(&text).unwrap()));
    });

    group.finish();
}

/// Benchmark canonical rendering of parsed documents
fn bench_render_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_document");

    for sections in [10, 100].iter() {
        let document = parse(&create_document(*sections, 12)).unwrap();

        group.bench_with_input(BenchmarkId::new("sections", sections), &document, |b, document| {
            b.iter(|| black_box(render_document(document)));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_tokenize, bench_parse, bench_section_merging, bench_render_document
}
criterion_main!(benches);
