//! Common types shared by the scheduler, grader and review session.

use serde::{Deserialize, Serialize};

// ==================== Levels ====================

/// JLPT difficulty tier of a word list.
///
/// `All` is the union of every tier and is only used for catalog
/// selection; individual words always carry a concrete tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JlptLevel {
    N4,
    N3,
    N2,
    #[serde(rename = "ALL")]
    All,
}

impl JlptLevel {
    /// Parse a level code such as `"N4"` or `"ALL"`.
    ///
    /// Returns `None` for unrecognized codes; callers decide the
    /// fallback (the catalog falls back to the default level).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N4" => Some(Self::N4),
            "N3" => Some(Self::N3),
            "N2" => Some(Self::N2),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }

    /// The canonical string code for this level.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::N4 => "N4",
            Self::N3 => "N3",
            Self::N2 => "N2",
            Self::All => "ALL",
        }
    }
}

impl Default for JlptLevel {
    fn default() -> Self {
        Self::N4
    }
}

impl std::fmt::Display for JlptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

// ==================== Catalog entries ====================

/// One immutable catalog entry: a kanji word with its expected answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanjiWord {
    /// Numeric id, unique within the level catalog.
    pub id: i64,
    /// Display glyph(s).
    pub kanji: String,
    /// Expected phonetic reading.
    pub hiragana: String,
    /// Expected meaning.
    pub meaning: String,
    /// Difficulty tier this word belongs to.
    pub level: JlptLevel,
}

// ==================== Answers ====================

/// A learner's typed answer for one presented word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub word_id: i64,
    pub hiragana: String,
    pub meaning: String,
}

impl UserAnswer {
    /// The answer synthesized for a skipped or never-answered word.
    pub fn empty(word_id: i64) -> Self {
        Self {
            word_id,
            hiragana: String::new(),
            meaning: String::new(),
        }
    }
}

/// Grading verdict for one word in one attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub word_id: i64,
    pub word: KanjiWord,
    pub user_answer: UserAnswer,
    pub hiragana_correct: bool,
    pub meaning_correct: bool,
    /// True iff both the reading and the meaning check passed.
    pub is_correct: bool,
}
