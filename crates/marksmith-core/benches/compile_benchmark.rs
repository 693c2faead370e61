//! Benchmarks comparing marksmith against pulldown-cmark on the same document
//!
//! Run with: cargo bench -p marksmith-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use marksmith_core::{compile, Config, Document};
use pulldown_cmark::{html, Options, Parser as MdParser};

const SAMPLE: &str = r#"# Introduction

This is a paragraph with *emphasis*, **strong text**, and `inline code`.
It links to [the project](http://example.com/ "Home") and a [reference][ref].

## Lists

* First item with some content
* Second item with more content
* Third item concluding the list

1. Step one of the process
2. Step two continues
3. Step three completes

## Code Example

    fn fibonacci(n: u64) -> u64 {
        match n {
            0 => 0,
            1 => 1,
            _ => fibonacci(n - 1) + fibonacci(n - 2),
        }
    }

## Table

| Name    | Speed   | Memory |
| ------- | ------: | :----: |
| Fast    | 100ms   | 10MB   |
| Medium  | 500ms   | 50MB   |
| Slow    | 1000ms  | 100MB  |

## Quote

> The best code is no code at all.
> Every line of code you write is a liability.
>
> -- Someone wise

* * *

End of document, with a footnote[^end].

[ref]: http://example.com/ref
[^end]: Footnotes are an extension.
"#;

fn full_config() -> Config {
    Config {
        extra_footnote: true,
        header_labels: true,
        ..Config::default()
    }
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    group.throughput(Throughput::Bytes(SAMPLE.len() as u64));

    let plain = Config {
        smartypants: false,
        ..Config::default()
    };
    group.bench_function("marksmith_plain", |b| {
        b.iter(|| black_box(compile(black_box(SAMPLE), &plain).unwrap().len()))
    });

    let full = full_config();
    group.bench_function("marksmith_full", |b| {
        b.iter(|| black_box(compile(black_box(SAMPLE), &full).unwrap().len()))
    });

    group.bench_function("pulldown_cmark", |b| {
        b.iter(|| {
            let parser = MdParser::new_ext(black_box(SAMPLE), Options::all());
            let mut out = String::with_capacity(SAMPLE.len() * 2);
            html::push_html(&mut out, parser);
            black_box(out.len())
        })
    });

    group.finish();
}

fn bench_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("phases");
    let config = full_config();

    group.bench_function("parse", |b| {
        b.iter(|| {
            let doc = Document::compile(black_box(SAMPLE), &config).unwrap();
            black_box(doc.blocks().len())
        })
    });

    let doc = Document::compile(SAMPLE, &config).unwrap();
    group.bench_function("render", |b| {
        b.iter(|| black_box(doc.to_html().unwrap().len()))
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");
    let config = full_config();

    for size in [1, 5, 10, 20].iter() {
        let content = SAMPLE.repeat(*size);
        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("marksmith", size), &content, |b, content| {
            b.iter(|| black_box(compile(black_box(content), &config).unwrap().len()))
        });

        group.bench_with_input(BenchmarkId::new("pulldown", size), &content, |b, content| {
            b.iter(|| {
                let parser = MdParser::new_ext(black_box(content), Options::all());
                let mut out = String::new();
                html::push_html(&mut out, parser);
                black_box(out.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_phases, bench_scaling);
criterion_main!(benches);
