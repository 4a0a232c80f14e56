//! Multi-Round Review Loop
//!
//! State machine for one study run:
//!
//! ```text
//! Presenting(round, index) --all answered--> RoundGraded(round)
//! RoundGraded(round) --retry_wrong-->  Presenting(round + 1, 0)
//! RoundGraded(round) --finish------->  Complete
//! ```
//!
//! Answers are recorded in presentation order; a skip records a
//! definitively-wrong empty answer and never blocks progress. A retry
//! round contains exactly the wrong subset of the previous round,
//! re-shuffled. Results accumulate across rounds and are deduplicated
//! on completion, keeping the most recent attempt per word.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grader;
use crate::scheduler;
use crate::types::{AnswerResult, KanjiWord, UserAnswer};

/// Where the session currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Question `index` of the current round's list is on screen.
    Presenting { round: usize, index: usize },
    /// Every question of `round` has been answered and graded.
    RoundGraded { round: usize },
    /// Terminal. The summary has been emitted.
    Complete,
}

/// Invalid transition requested by the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no question is currently being presented")]
    NotPresenting,
    #[error("the current round is still in progress")]
    RoundInProgress,
    #[error("every answer in the last round was correct; nothing to retry")]
    NothingToRetry,
    #[error("the session is already complete")]
    AlreadyComplete,
}

/// Final summary of a completed session, ready for persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    /// One result per distinct word asked (the most recent attempt
    /// wins), ordered by first presentation.
    pub results: Vec<AnswerResult>,
    /// Count of `is_correct` entries in `results`.
    pub correct_answers: usize,
    /// Distinct word ids presented across all rounds, in first
    /// presentation order.
    pub presented_word_ids: Vec<i64>,
}

impl SessionSummary {
    /// Total number of distinct questions asked.
    pub fn total_questions(&self) -> usize {
        self.results.len()
    }
}

/// One study run: a question list, the learner's answers, and the
/// retry rounds that follow.
#[derive(Debug)]
pub struct ReviewSession {
    questions: Vec<KanjiWord>,
    answers: Vec<UserAnswer>,
    /// Results of every attempt across all rounds, chronological.
    history: Vec<AnswerResult>,
    /// Index into `history` where the current round's results begin.
    round_start: usize,
    phase: SessionPhase,
}

impl ReviewSession {
    /// Start a session over `questions`.
    ///
    /// An empty list starts directly in `RoundGraded` so the only
    /// possible step is `finish`; callers must tolerate this.
    pub fn new(questions: Vec<KanjiWord>) -> Self {
        let phase = if questions.is_empty() {
            SessionPhase::RoundGraded { round: 1 }
        } else {
            SessionPhase::Presenting { round: 1, index: 0 }
        };
        Self {
            questions,
            answers: Vec::new(),
            history: Vec::new(),
            round_start: 0,
            phase,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The current round's question list.
    pub fn questions(&self) -> &[KanjiWord] {
        &self.questions
    }

    /// The question currently on screen, if any.
    pub fn current_question(&self) -> Option<&KanjiWord> {
        match self.phase {
            SessionPhase::Presenting { index, .. } => self.questions.get(index),
            _ => None,
        }
    }

    /// Record the learner's answer for the current question and
    /// advance. Grades the whole round once its last answer lands.
    pub fn submit_answer(
        &mut self,
        hiragana: String,
        meaning: String,
    ) -> Result<(), SessionError> {
        let word_id = self
            .current_question()
            .ok_or(SessionError::NotPresenting)?
            .id;
        self.record(UserAnswer {
            word_id,
            hiragana,
            meaning,
        })
    }

    /// Skip the current question: records an empty answer, which
    /// grades as definitively wrong. Never blocks progress.
    pub fn skip(&mut self) -> Result<(), SessionError> {
        let word_id = self
            .current_question()
            .ok_or(SessionError::NotPresenting)?
            .id;
        self.record(UserAnswer::empty(word_id))
    }

    fn record(&mut self, answer: UserAnswer) -> Result<(), SessionError> {
        let SessionPhase::Presenting { round, index } = self.phase else {
            return Err(SessionError::NotPresenting);
        };

        self.answers.push(answer);

        if index + 1 < self.questions.len() {
            self.phase = SessionPhase::Presenting {
                round,
                index: index + 1,
            };
        } else {
            let graded = grader::grade_batch(&self.questions, &self.answers);
            self.round_start = self.history.len();
            self.history.extend(graded);
            self.phase = SessionPhase::RoundGraded { round };
        }
        Ok(())
    }

    /// Results of the most recently graded round.
    pub fn round_results(&self) -> Result<&[AnswerResult], SessionError> {
        match self.phase {
            SessionPhase::RoundGraded { .. } => Ok(&self.history[self.round_start..]),
            SessionPhase::Complete => Err(SessionError::AlreadyComplete),
            SessionPhase::Presenting { .. } => Err(SessionError::RoundInProgress),
        }
    }

    /// Words answered incorrectly in the most recently graded round.
    pub fn wrong_words(&self) -> Result<Vec<KanjiWord>, SessionError> {
        Ok(self
            .round_results()?
            .iter()
            .filter(|r| !r.is_correct)
            .map(|r| r.word.clone())
            .collect())
    }

    /// Begin the next round over the wrong subset of the last one.
    ///
    /// Only allowed from `RoundGraded` and only when at least one
    /// answer was wrong; with a clean round the sole path is `finish`.
    pub fn retry_wrong<R: Rng>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        let SessionPhase::RoundGraded { round } = self.phase else {
            return match self.phase {
                SessionPhase::Complete => Err(SessionError::AlreadyComplete),
                _ => Err(SessionError::RoundInProgress),
            };
        };

        let wrong = self.wrong_words()?;
        if wrong.is_empty() {
            return Err(SessionError::NothingToRetry);
        }

        self.questions = scheduler::retry_round(wrong, rng);
        self.answers.clear();
        self.phase = SessionPhase::Presenting {
            round: round + 1,
            index: 0,
        };
        Ok(())
    }

    /// Complete the session and emit its summary.
    ///
    /// Always available from `RoundGraded`, even with outstanding
    /// wrong answers. Deduplicates the accumulated results by word id,
    /// keeping the latest attempt; output order is first-presentation
    /// order.
    pub fn finish(&mut self) -> Result<SessionSummary, SessionError> {
        match self.phase {
            SessionPhase::RoundGraded { .. } => {}
            SessionPhase::Complete => return Err(SessionError::AlreadyComplete),
            SessionPhase::Presenting { .. } => return Err(SessionError::RoundInProgress),
        }

        // Chronological inserts into an id-keyed map: later attempts
        // overwrite earlier ones.
        let mut order: Vec<i64> = Vec::new();
        let mut latest: HashMap<i64, AnswerResult> = HashMap::new();
        for result in &self.history {
            if !latest.contains_key(&result.word_id) {
                order.push(result.word_id);
            }
            latest.insert(result.word_id, result.clone());
        }

        let results: Vec<AnswerResult> = order
            .iter()
            .filter_map(|id| latest.remove(id))
            .collect();
        let correct_answers = grader::correct_count(&results);

        self.phase = SessionPhase::Complete;
        Ok(SessionSummary {
            results,
            correct_answers,
            presented_word_ids: order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JlptLevel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn words(count: usize) -> Vec<KanjiWord> {
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

    /// Answer the current question, correctly or not.
    fn answer_current(session: &mut ReviewSession, correctly: bool) {
        let word = session.current_question().expect("a question on screen");
        let (hiragana, meaning) = if correctly {
            (word.hiragana.clone(), word.meaning.clone())
        } else {
            ("ちがう".to_string(), "오답".to_string())
        };
        session.submit_answer(hiragana, meaning).expect("submit");
    }

    #[test]
    fn test_clean_round_goes_to_round_graded() {
        let mut session = ReviewSession::new(words(3));
        assert_eq!(session.phase(), SessionPhase::Presenting { round: 1, index: 0 });

        for _ in 0..3 {
            answer_current(&mut session, true);
        }
        assert_eq!(session.phase(), SessionPhase::RoundGraded { round: 1 });
        assert!(session.wrong_words().unwrap().is_empty());
    }

    #[test]
    fn test_round_of_five_with_two_wrong() {
        let mut session = ReviewSession::new(words(5));
        // Questions 1 and 2 answered correctly, 3-4 wrong, 5 correct.
        answer_current(&mut session, true);
        answer_current(&mut session, true);
        answer_current(&mut session, false);
        answer_current(&mut session, false);
        answer_current(&mut session, true);

        let wrong = session.wrong_words().unwrap();
        let mut wrong_ids: Vec<i64> = wrong.iter().map(|w| w.id).collect();
        wrong_ids.sort_unstable();
        assert_eq!(wrong_ids, vec![3, 4]);

        // Choosing finish instead of retry: 5 distinct results, 3 correct.
        let summary = session.finish().unwrap();
        assert_eq!(summary.total_questions(), 5);
        assert_eq!(summary.correct_answers, 3);
        assert_eq!(summary.presented_word_ids.len(), 5);
    }

    #[test]
    fn test_retry_contains_exactly_the_wrong_subset() {
        let mut session = ReviewSession::new(words(5));
        answer_current(&mut session, true);
        answer_current(&mut session, false);
        answer_current(&mut session, false);
        answer_current(&mut session, true);
        answer_current(&mut session, true);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        session.retry_wrong(&mut rng).unwrap();
        assert_eq!(session.phase(), SessionPhase::Presenting { round: 2, index: 0 });

        let mut round2_ids: Vec<i64> = session.questions().iter().map(|w| w.id).collect();
        round2_ids.sort_unstable();
        assert_eq!(round2_ids, vec![2, 3]);
    }

    #[test]
    fn test_dedup_keeps_latest_attempt() {
        let mut session = ReviewSession::new(words(3));
        // Round 1: word 2 wrong, others correct.
        answer_current(&mut session, true);
        answer_current(&mut session, false);
        answer_current(&mut session, true);

        let mut rng = ChaCha8Rng::seed_from_u64(12);
        session.retry_wrong(&mut rng).unwrap();

        // Round 2: word 2 now answered correctly.
        answer_current(&mut session, true);

        let summary = session.finish().unwrap();
        assert_eq!(summary.total_questions(), 3);
        assert_eq!(summary.correct_answers, 3);

        let word2 = summary
            .results
            .iter()
            .find(|r| r.word_id == 2)
            .expect("word 2 in summary");
        assert!(word2.is_correct, "round-2 verdict wins");
    }

    #[test]
    fn test_dedup_keeps_latest_wrong_verdict_too() {
        let mut session = ReviewSession::new(words(2));
        answer_current(&mut session, false);
        answer_current(&mut session, true);

        let mut rng = ChaCha8Rng::seed_from_u64(13);
        session.retry_wrong(&mut rng).unwrap();
        // Word 1 wrong again in round 2.
        answer_current(&mut session, false);

        let summary = session.finish().unwrap();
        assert_eq!(summary.total_questions(), 2);
        assert_eq!(summary.correct_answers, 1);
        let word1 = summary.results.iter().find(|r| r.word_id == 1).unwrap();
        assert!(!word1.is_correct);
    }

    #[test]
    fn test_summary_invariants() {
        let mut session = ReviewSession::new(words(4));
        answer_current(&mut session, true);
        answer_current(&mut session, false);
        answer_current(&mut session, false);
        answer_current(&mut session, true);

        let summary = session.finish().unwrap();
        let correct = summary.results.iter().filter(|r| r.is_correct).count();
        assert_eq!(summary.correct_answers, correct);
        assert_eq!(summary.total_questions(), summary.results.len());
        assert_eq!(summary.presented_word_ids.len(), summary.results.len());
    }

    #[test]
    fn test_skip_records_a_wrong_result() {
        let mut session = ReviewSession::new(words(2));
        session.skip().unwrap();
        answer_current(&mut session, true);

        let results = session.round_results().unwrap();
        assert!(!results[0].is_correct);
        assert_eq!(results[0].user_answer, UserAnswer::empty(1));
        assert!(results[1].is_correct);
    }

    #[test]
    fn test_retry_with_clean_round_is_rejected() {
        let mut session = ReviewSession::new(words(1));
        answer_current(&mut session, true);

        let mut rng = ChaCha8Rng::seed_from_u64(14);
        assert_eq!(session.retry_wrong(&mut rng), Err(SessionError::NothingToRetry));

        // Finish is still available.
        assert!(session.finish().is_ok());
    }

    #[test]
    fn test_empty_question_list_finishes_immediately() {
        let mut session = ReviewSession::new(Vec::new());
        assert_eq!(session.phase(), SessionPhase::RoundGraded { round: 1 });

        let summary = session.finish().unwrap();
        assert!(summary.results.is_empty());
        assert_eq!(summary.correct_answers, 0);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = ReviewSession::new(words(2));

        // Mid-round: grading queries and finish are rejected.
        assert_eq!(session.round_results().err(), Some(SessionError::RoundInProgress));
        assert!(session.finish().is_err());

        answer_current(&mut session, true);
        answer_current(&mut session, true);

        // Graded: no question on screen.
        assert_eq!(
            session.submit_answer("x".into(), "y".into()),
            Err(SessionError::NotPresenting)
        );
        assert_eq!(session.skip(), Err(SessionError::NotPresenting));

        // Complete is terminal.
        session.finish().unwrap();
        assert_eq!(session.finish().err(), Some(SessionError::AlreadyComplete));
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        assert_eq!(session.retry_wrong(&mut rng), Err(SessionError::AlreadyComplete));
    }
}
