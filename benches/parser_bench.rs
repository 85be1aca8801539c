//! Parser benchmarks using criterion.
//!
//! Run with: cargo bench --bench parser_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fluently::parse;

/// A small, representative localization file.
const SIMPLE_MESSAGES: &str = "\
app-title = Fluently
app-subtitle = Localization that degrades gracefully
greeting = Hello, { $name }!
farewell = Goodbye, { $name }.
";

/// Multiline block patterns with indentation handling.
const BLOCK_PATTERNS: &str = "\
about =
    Fluently is a localization library.
      It keeps indentation that goes deeper
    than the common indent of the block.
help =
    First line
    Second line
    Third line
";

/// Select expressions with plural categories.
const SELECT_HEAVY: &str = "\
emails = { $n ->
    [zero] You have no emails.
    [one] You have one email.
    [two] You have two emails.
   *[other] You have { $n } emails.
}
warnings = { $count ->
    [one] One warning
   *[other] { $count } warnings
}
";

/// Terms, attributes and references between entries.
const REFERENCE_HEAVY: &str = "\
-brand = Firefly
    .gender = fem
menu-about = About { -brand }
menu-help = { menu-about } and help
status = { -brand.gender ->
    [fem] She is ready
   *[other] It is ready
}
";

/// A document with malformed entries in the middle.
const JUNK_RECOVERY: &str = "\
good-one = fine
broken == not fine
good-two = also fine
another === mess
good-three = still fine
";

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    for (name, source) in [
        ("simple_messages", SIMPLE_MESSAGES),
        ("block_patterns", BLOCK_PATTERNS),
        ("select_heavy", SELECT_HEAVY),
        ("reference_heavy", REFERENCE_HEAVY),
        ("junk_recovery", JUNK_RECOVERY),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new(name, source.len()), source, |b, source| {
            b.iter(|| parse(black_box(source)));
        });
    }

    group.finish();
}

fn bench_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_scaling");

    for size in [1, 8, 64] {
        let source: String = (0..size)
            .map(|i| format!("message-{i} = Value number {{ $n{i} }} here\n"))
            .collect();
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("messages", size),
            &source,
            |b, source| {
                b.iter(|| parse(black_box(source)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parser, bench_parser_scaling);
criterion_main!(benches);
