//! # kanji-algo - 漢字学習ドリルのコアロジック
//!
//! Pure logic for the kanji vocabulary drill: question scheduling,
//! answer grading, and the multi-round review loop. No storage, no
//! I/O; randomness is always injected so every selection is
//! reproducible under test.
//!
//! ## 模块结构
//!
//! - [`types`] - 公共类型 (word, answer, verdict, level)
//! - [`scheduler`] - 出题调度 (new/review 平衡、Fisher-Yates 洗牌)
//! - [`grader`] - 判分 (normalize + exact match)
//! - [`session`] - 多轮复习状态机 (retry wrong answers)
//!
//! ## 使用示例
//!
//! ```rust
//! use kanji_algo::{generate_daily_questions, ReviewSession};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::collections::HashSet;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let questions = generate_daily_questions(&[], &HashSet::new(), 0, &mut rng);
//! let mut session = ReviewSession::new(questions);
//! let summary = session.finish().unwrap();
//! assert_eq!(summary.total_questions(), 0);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod grader;
pub mod scheduler;
pub mod session;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::{AnswerResult, JlptLevel, KanjiWord, UserAnswer};

/// 重新导出判分函数
pub use grader::{accuracy, correct_word_ids, grade, grade_batch, normalize, wrong_word_ids};

/// 重新导出调度函数
pub use scheduler::{
    generate_daily_questions, retry_round, DAILY_NEW_LIMIT, DAILY_REVIEW_LIMIT,
};

/// 重新导出复习状态机
pub use session::{ReviewSession, SessionError, SessionPhase, SessionSummary};
