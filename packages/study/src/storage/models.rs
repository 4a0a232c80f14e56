//! 数据模型定义
//!
//! 定义 SQLite 存储所需的数据结构，以及与数据库交互的方法。

use chrono::{DateTime, Utc};
use kanji_algo::{AnswerResult, JlptLevel};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};

use crate::storage::StorageResult;

// ============================================================
// 时间格式辅助函数
// ============================================================

/// 格式化为数据库存储的 UTC 字符串
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// 从数据库字符串解析时间；无法解析时退回当前时间
pub fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ============================================================
// WrongWordRecord - 错题账本条目
// ============================================================

/// 每个单词的错题账本条目
///
/// 首次答错时创建；之后每次答错 `wrong_count` 加一并刷新时间戳、
/// 清除掌握标记；在完成轮中答对时翻转 `is_mastered`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongWordRecord {
    /// 单词 ID
    pub word_id: i64,
    /// 累计答错次数
    pub wrong_count: i64,
    /// 最近一次答错时间
    pub last_wrong_at: DateTime<Utc>,
    /// 是否已掌握
    pub is_mastered: bool,
}

impl WrongWordRecord {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            word_id: row.get("word_id")?,
            wrong_count: row.get("wrong_count")?,
            last_wrong_at: parse_datetime(row.get::<_, String>("last_wrong_at")?),
            is_mastered: row.get::<_, i32>("is_mastered")? != 0,
        })
    }

    /// 插入或整行覆盖（备份导入用）
    pub fn upsert(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO wrong_word (word_id, wrong_count, last_wrong_at, is_mastered)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(word_id) DO UPDATE SET
                wrong_count = excluded.wrong_count,
                last_wrong_at = excluded.last_wrong_at,
                is_mastered = excluded.is_mastered
            "#,
            params![
                self.word_id,
                self.wrong_count,
                format_datetime(self.last_wrong_at),
                self.is_mastered as i32,
            ],
        )?;
        Ok(())
    }
}

// ============================================================
// StudySession - 一次完成的学习会话
// ============================================================

/// 一次完成的学习会话（append-only，写入后不再变更）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    /// 会话唯一标识 (UUID)
    pub id: String,
    /// 会话日期
    pub date: DateTime<Utc>,
    /// 去重后的题目总数
    pub total_questions: i64,
    /// 其中答对的数量
    pub correct_answers: i64,
    /// 完成时间
    pub completed_at: DateTime<Utc>,
    /// 每个单词的最终判分（按单词去重，保留最后一次作答）
    pub results: Vec<AnswerResult>,
}

impl StudySession {
    /// 从数据库行解析
    ///
    /// `results` 列存储 JSON 文本；损坏的 JSON 按空列表恢复，
    /// 不让单条坏数据拖垮整个历史查询。
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        let raw_results: String = row.get("results")?;
        let results = serde_json::from_str(&raw_results).unwrap_or_else(|e| {
            log::warn!("corrupted session results, recovering as empty: {e}");
            Vec::new()
        });

        Ok(Self {
            id: row.get("id")?,
            date: parse_datetime(row.get::<_, String>("date")?),
            total_questions: row.get("total_questions")?,
            correct_answers: row.get("correct_answers")?,
            completed_at: parse_datetime(row.get::<_, String>("completed_at")?),
            results,
        })
    }

    /// 插入到数据库
    pub fn insert(&self, conn: &Connection) -> StorageResult<()> {
        let results = serde_json::to_string(&self.results)
            .map_err(|e| crate::storage::StorageError::Serialization(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO study_session (
                id, date, total_questions, correct_answers, completed_at, results
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                self.id,
                format_datetime(self.date),
                self.total_questions,
                self.correct_answers,
                format_datetime(self.completed_at),
                results,
            ],
        )?;
        Ok(())
    }
}

// ============================================================
// Progress - 总体进度（单例）
// ============================================================

/// 总体进度聚合，固定存储在 id = 1 的单行中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 当前选择的等级
    pub current_level: JlptLevel,
    /// 累计学习单词数
    pub total_words_studied: i64,
    /// 最近一次学习时间
    pub last_study_date: Option<DateTime<Utc>>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_level: JlptLevel::default(),
            total_words_studied: 0,
            last_study_date: None,
        }
    }
}

impl Progress {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        let level_code: String = row.get("current_level")?;
        Ok(Self {
            current_level: JlptLevel::from_code(&level_code).unwrap_or_default(),
            total_words_studied: row.get("total_words_studied")?,
            last_study_date: row
                .get::<_, Option<String>>("last_study_date")?
                .map(parse_datetime),
        })
    }

    /// 插入或覆盖单例行
    pub fn upsert(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO progress (id, current_level, total_words_studied, last_study_date)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                current_level = excluded.current_level,
                total_words_studied = excluded.total_words_studied,
                last_study_date = excluded.last_study_date
            "#,
            params![
                self.current_level.as_code(),
                self.total_words_studied,
                self.last_study_date.map(format_datetime),
            ],
        )?;
        Ok(())
    }
}

/// 进度的部分更新；`None` 字段保持原值
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub current_level: Option<JlptLevel>,
    pub total_words_studied: Option<i64>,
    pub last_study_date: Option<DateTime<Utc>>,
}

impl Progress {
    /// 应用部分更新
    pub fn apply(&mut self, update: &ProgressUpdate) {
        if let Some(level) = update.current_level {
            self.current_level = level;
        }
        if let Some(total) = update.total_words_studied {
            self.total_words_studied = total;
        }
        if let Some(date) = update.last_study_date {
            self.last_study_date = Some(date);
        }
    }
}
