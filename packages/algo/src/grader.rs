//! Answer Grading
//!
//! Grades typed answers against the expected reading and meaning of a
//! word by exact match after whitespace normalization.
//!
//! Rules:
//! - Both sides are trimmed and stripped of all internal whitespace
//!   before comparison
//! - The meaning comparison is case-insensitive; the reading
//!   comparison is not (the reading alphabet has no case)
//! - A word without a submitted answer is graded fully incorrect
//!   against a synthesized empty answer, never an error

use std::collections::HashMap;

use crate::types::{AnswerResult, KanjiWord, UserAnswer};

/// Normalize a string for comparison: trim, then remove every internal
/// whitespace run. Idempotent.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect()
}

/// Exact reading match after normalization.
fn check_hiragana(correct: &str, user_input: &str) -> bool {
    normalize(correct) == normalize(user_input)
}

/// Case-insensitive meaning match after normalization.
fn check_meaning(correct: &str, user_input: &str) -> bool {
    normalize(&correct.to_lowercase()) == normalize(&user_input.to_lowercase())
}

/// Grade a single answer against its word.
pub fn grade(word: &KanjiWord, user_answer: &UserAnswer) -> AnswerResult {
    let hiragana_correct = check_hiragana(&word.hiragana, &user_answer.hiragana);
    let meaning_correct = check_meaning(&word.meaning, &user_answer.meaning);

    AnswerResult {
        word_id: word.id,
        word: word.clone(),
        user_answer: user_answer.clone(),
        hiragana_correct,
        meaning_correct,
        is_correct: hiragana_correct && meaning_correct,
    }
}

/// Grade a batch of answers.
///
/// Returns exactly one result per word, in word order. Answers are
/// matched by word id; when several answers carry the same id the
/// first one wins, and a word without any answer is graded as fully
/// incorrect.
pub fn grade_batch(words: &[KanjiWord], user_answers: &[UserAnswer]) -> Vec<AnswerResult> {
    let mut by_id: HashMap<i64, &UserAnswer> = HashMap::new();
    for answer in user_answers {
        by_id.entry(answer.word_id).or_insert(answer);
    }

    words
        .iter()
        .map(|word| match by_id.get(&word.id) {
            Some(answer) => grade(word, answer),
            None => grade(word, &UserAnswer::empty(word.id)),
        })
        .collect()
}

/// Overall accuracy as a rounded percentage. 0 for an empty batch.
pub fn accuracy(results: &[AnswerResult]) -> u32 {
    if results.is_empty() {
        return 0;
    }
    let correct = correct_count(results);
    ((correct as f64 / results.len() as f64) * 100.0).round() as u32
}

/// Number of fully correct results.
pub fn correct_count(results: &[AnswerResult]) -> usize {
    results.iter().filter(|r| r.is_correct).count()
}

/// Number of incorrect results.
pub fn wrong_count(results: &[AnswerResult]) -> usize {
    results.iter().filter(|r| !r.is_correct).count()
}

/// Ids of the fully correct words, in result order.
pub fn correct_word_ids(results: &[AnswerResult]) -> Vec<i64> {
    results
        .iter()
        .filter(|r| r.is_correct)
        .map(|r| r.word_id)
        .collect()
}

/// Ids of the incorrect words, in result order.
pub fn wrong_word_ids(results: &[AnswerResult]) -> Vec<i64> {
    results
        .iter()
        .filter(|r| !r.is_correct)
        .map(|r| r.word_id)
        .collect()
}

/// Whether both answer fields are non-blank.
///
/// Presentation-layer gate for the "next" action; grading itself never
/// rejects an answer (blank answers simply grade as wrong).
pub fn validate_answer(user_answer: &UserAnswer) -> bool {
    !user_answer.hiragana.trim().is_empty() && !user_answer.meaning.trim().is_empty()
}
