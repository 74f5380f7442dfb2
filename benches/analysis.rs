#![allow(unused)]
extern crate assertscope;

use assertscope::{config::AnalyzerConfig, AnalysisEngine, CancellationToken, Compilation};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

const USINGS: &str = "using System;
using System.IO;
using NUnit.Framework;
using NUnit.Framework.Legacy;
";

/// A fixture with `tests` test methods mixing every kind of finding the rules report
fn fixture(index: usize, tests: usize) -> String {
    let mut source = format!(
        "{USINGS}
public class Fixture{index}
{{
    private static readonly int[] Cases = {{ 1, 2, 3 }};
    private Stream input;

    [SetUp]
    public void SetUp() {{ input = File.OpenRead(\"data.bin\"); }}
"
    );
    for test in 0..tests {
        source.push_str(&format!(
            "
    [TestCaseSource(\"Cases\")]
    public void Test{test}(int value)
    {{
        ClassicAssert.AreEqual(value, value + {test});
        ClassicAssert.IsTrue(value > 0, \"value was {{0}}\", value);
        Assert.That(value, Is.EqualTo(\"{test}\"));
        Assert.That(value + 1, Is.GreaterThan(0));
    }}
"
        ));
    }
    source.push_str("}\n");
    source
}

fn sources(files: usize, tests: usize) -> Vec<(String, String)> {
    (0..files)
        .map(|index| (format!("Fixture{index}.cs"), fixture(index, tests)))
        .collect()
}

/// Benchmark parsing and binding of generated fixtures
fn bench_compile(c: &mut Criterion) {
    let sources = sources(16, 32);
    let bytes: usize = sources.iter().map(|(_, text)| text.len()).sum();

    let mut group = c.benchmark_group("compile");
    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("compilation_new", |b| {
        b.iter(|| {
            let compilation =
                Compilation::new(black_box(sources.clone()), AnalyzerConfig::default()).unwrap();
            black_box(compilation)
        });
    });
    group.finish();
}

/// Benchmark the full rule set, trees analysed in parallel
fn bench_analyze(c: &mut Criterion) {
    let sources = sources(16, 32);
    let bytes: usize = sources.iter().map(|(_, text)| text.len()).sum();
    let compilation = Compilation::new(sources, AnalyzerConfig::default()).unwrap();
    let engine = AnalysisEngine::with_defaults();

    println!(
        "Benchmarking analysis of {} trees: {} bytes ({:.2} KB)",
        compilation.trees().len(),
        bytes,
        bytes as f64 / 1024.0
    );

    let mut group = c.benchmark_group("analyze");
    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("all_rules", |b| {
        b.iter(|| {
            let diagnostics = engine
                .analyze(black_box(&compilation), &CancellationToken::new())
                .unwrap();
            black_box(diagnostics)
        });
    });
    group.finish();
}

/// Benchmark analysing and rewriting a single fixture
fn bench_fix_all(c: &mut Criterion) {
    let source = fixture(0, 32);
    let engine = AnalysisEngine::with_defaults();

    let mut group = c.benchmark_group("fix_all");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("fix_all", |b| {
        b.iter(|| {
            let fixed = engine
                .fix_all(black_box(&source), AnalyzerConfig::default())
                .unwrap();
            black_box(fixed)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_compile, bench_analyze, bench_fix_all);
criterion_main!(benches);
