use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use docdelta::{Block, BlockAligner, CompareOptions, StubJudge, compare, diff_tokens, tokenize};

const WORDS: &[&str] = &[
    "the", "supplier", "shall", "deliver", "services", "within", "days", "of", "notice",
    "payment", "fee", "tenant", "landlord", "agreement", "term", "party", "may", "terminate",
];

fn paragraph(seed: usize, len: usize) -> String {
    (0..len)
        .map(|i| WORDS[(seed * 7 + i * 13) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// `blocks` paragraphs; revisions past zero append a fee to every fifth one.
fn document(blocks: usize, revision: usize) -> Vec<Block> {
    (0..blocks)
        .map(|i| {
            let mut text = paragraph(i, 40);
            if revision > 0 && i % 5 == 0 {
                text.push_str(&format!(" with a fee of ${}", 100 + revision * i));
            }
            Block::paragraph(format!("b{i}"), text, i)
        })
        .collect()
}

fn bench_word_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("word_diff");
    for len in [20usize, 100, 400] {
        let old = tokenize(&paragraph(1, len));
        let new = tokenize(&paragraph(2, len));
        group.throughput(Throughput::Elements((old.len() + new.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| diff_tokens(black_box(&old), black_box(&new)))
        });
    }
    group.finish();
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    let aligner = BlockAligner::default();
    for blocks in [10usize, 100, 300] {
        let old = document(blocks, 0);
        let new = document(blocks, 1);
        group.throughput(Throughput::Elements(blocks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &blocks, |b, _| {
            b.iter(|| aligner.align(black_box(&old), black_box(&new)))
        });
    }
    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let old = document(100, 0);
    let new = document(100, 1);
    let options = CompareOptions::default();

    c.bench_function("compare_100_blocks", |b| {
        b.iter(|| {
            runtime.block_on(compare(
                black_box(&old),
                black_box(&new),
                &options,
                Arc::new(StubJudge::default()),
            ))
        })
    });
}

criterion_group!(benches, bench_word_diff, bench_align, bench_compare);
criterion_main!(benches);
