//! Question Scheduling
//!
//! Selects which catalog entries form the next question set, balancing
//! review of already-studied words against new material.
//!
//! Policy:
//! - First session ever: up to [`DAILY_NEW_LIMIT`] shuffled new words
//! - Later sessions: up to [`DAILY_REVIEW_LIMIT`] shuffled studied
//!   words plus up to [`DAILY_NEW_LIMIT`] shuffled new words,
//!   re-shuffled together before presentation
//! - Pools never borrow from each other; a short pool simply yields a
//!   shorter question list
//!
//! Every function here is a pure selection over its inputs; the random
//! source is always injected so behavior is reproducible under test.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::KanjiWord;

/// Maximum number of new words per session.
pub const DAILY_NEW_LIMIT: usize = 10;

/// Maximum number of review words per session.
pub const DAILY_REVIEW_LIMIT: usize = 10;

/// Shuffle a slice in place with an unbiased Fisher-Yates permutation.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Select today's question list.
///
/// `studied_ids` and `session_count` come from the persistence
/// collaborator; `all_words` from the catalog. The result is empty
/// when no eligible words exist, which callers must tolerate.
pub fn generate_daily_questions<R: Rng>(
    all_words: &[KanjiWord],
    studied_ids: &HashSet<i64>,
    session_count: usize,
    rng: &mut R,
) -> Vec<KanjiWord> {
    if session_count == 0 {
        // First session: new words only.
        let mut new_words: Vec<KanjiWord> = all_words
            .iter()
            .filter(|w| !studied_ids.contains(&w.id))
            .cloned()
            .collect();
        new_words.shuffle(rng);
        new_words.truncate(DAILY_NEW_LIMIT);
        new_words
    } else {
        // Later sessions: review words plus new words. Each pool is
        // shuffled and truncated independently; a shortfall in one
        // pool is never filled from the other.
        let mut review: Vec<KanjiWord> = all_words
            .iter()
            .filter(|w| studied_ids.contains(&w.id))
            .cloned()
            .collect();
        review.shuffle(rng);
        review.truncate(DAILY_REVIEW_LIMIT);

        let mut fresh: Vec<KanjiWord> = all_words
            .iter()
            .filter(|w| !studied_ids.contains(&w.id))
            .cloned()
            .collect();
        fresh.shuffle(rng);
        fresh.truncate(DAILY_NEW_LIMIT);

        let mut questions = review;
        questions.append(&mut fresh);
        // Second shuffle interleaves review and new items.
        questions.shuffle(rng);
        questions
    }
}

/// Build the question list for a retry round: the previously-wrong
/// words, shuffled, with nothing mixed in.
pub fn retry_round<R: Rng>(mut wrong_words: Vec<KanjiWord>, rng: &mut R) -> Vec<KanjiWord> {
    wrong_words.shuffle(rng);
    wrong_words
}

/// Pick up to `count` not-yet-studied words.
///
/// The candidate pool is capped at `2 * count` before shuffling, so a
/// huge catalog does not all end up in the shuffle.
pub fn new_words<R: Rng>(
    all_words: &[KanjiWord],
    studied_ids: &HashSet<i64>,
    count: usize,
    rng: &mut R,
) -> Vec<KanjiWord> {
    let mut candidates: Vec<KanjiWord> = all_words
        .iter()
        .filter(|w| !studied_ids.contains(&w.id))
        .take(count * 2)
        .cloned()
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates
}

/// Whether at least `required` unstudied words remain.
pub fn has_enough_new_words(
    all_words: &[KanjiWord],
    studied_ids: &HashSet<i64>,
    required: usize,
) -> bool {
    all_words
        .iter()
        .filter(|w| !studied_ids.contains(&w.id))
        .count()
        >= required
}

/// Number of catalog words the learner has already studied.
pub fn studied_word_count(all_words: &[KanjiWord], studied_ids: &HashSet<i64>) -> usize {
    all_words
        .iter()
        .filter(|w| studied_ids.contains(&w.id))
        .count()
}

/// Number of catalog words the learner has not studied yet.
pub fn remaining_word_count(all_words: &[KanjiWord], studied_ids: &HashSet<i64>) -> usize {
    all_words.len() - studied_word_count(all_words, studied_ids)
}

/// Catalog completion as a rounded percentage. 0 for an empty catalog.
pub fn level_completion(total: usize, studied: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((studied as f64 / total as f64) * 100.0).round() as u32
}
