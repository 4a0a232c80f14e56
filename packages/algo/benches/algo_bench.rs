//! Benchmark suite for kanji-algo
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

use kanji_algo::types::{JlptLevel, KanjiWord, UserAnswer};
use kanji_algo::{generate_daily_questions, grade_batch};

fn catalog(count: usize) -> Vec<KanjiWord> {
    (1..=count as i64)
        .map(|id| KanjiWord {
            id,
            kanji: format!("字{id}"),
            hiragana: format!("かな{id}"),
            meaning: format!("뜻{id}"),
            level: JlptLevel::N4,
        })
        .collect()
}

fn bench_generate_daily_questions(c: &mut Criterion) {
    let words = catalog(2000);
    let studied: HashSet<i64> = (1..=500).collect();

    c.bench_function("generate_daily_questions/2000", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| generate_daily_questions(&words, &studied, 3, &mut rng))
    });
}

fn bench_grade_batch(c: &mut Criterion) {
    let words = catalog(100);
    let answers: Vec<UserAnswer> = words
        .iter()
        .map(|w| UserAnswer {
            word_id: w.id,
            hiragana: w.hiragana.clone(),
            meaning: w.meaning.clone(),
        })
        .collect();

    c.bench_function("grade_batch/100", |b| {
        b.iter(|| grade_batch(&words, &answers))
    });
}

criterion_group!(benches, bench_generate_daily_questions, bench_grade_batch);
criterion_main!(benches);
