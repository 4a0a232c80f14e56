//! 错题账本的数据库操作
//!
//! 每个答错过的单词一条记录：累计答错次数、最近答错时间、掌握标记。
//! 再次答错会清除掌握标记，让单词回到待复习队列。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::storage::models::{format_datetime, WrongWordRecord};
use crate::storage::{StorageError, StorageResult};

/// 错题账本仓库
pub struct WrongWordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WrongWordRepository {
    /// 创建新的仓库实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取连接锁
    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 获取所有错题记录
    pub fn get_all(&self) -> StorageResult<Vec<WrongWordRecord>> {
        let conn = self.get_conn()?;
        Self::get_all_internal(&conn)
    }

    /// 获取未掌握的错题，按答错次数从多到少排序
    pub fn get_unmastered(&self) -> StorageResult<Vec<WrongWordRecord>> {
        let conn = self.get_conn()?;
        Self::get_unmastered_internal(&conn)
    }

    /// 获取单个单词的错题记录
    pub fn get_record(&self, word_id: i64) -> StorageResult<Option<WrongWordRecord>> {
        let conn = self.get_conn()?;
        Self::get_record_internal(&conn, word_id)
    }

    /// 记录一次答错
    ///
    /// 无记录时新建 (wrong_count = 1)；已有记录时计数加一、
    /// 刷新答错时间并清除掌握标记。
    pub fn record_wrong(&self, word_id: i64) -> StorageResult<()> {
        let conn = self.get_conn()?;
        Self::record_wrong_internal(&conn, word_id, Utc::now())
    }

    /// 标记单词为已掌握
    ///
    /// 账本中没有该单词时静默返回（从未答错过的单词没有可标记的记录）。
    pub fn mark_mastered(&self, word_id: i64) -> StorageResult<()> {
        let conn = self.get_conn()?;
        Self::mark_mastered_internal(&conn, word_id)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 获取所有错题记录（内部实现）
    pub fn get_all_internal(conn: &Connection) -> StorageResult<Vec<WrongWordRecord>> {
        let mut stmt = conn.prepare(
            "SELECT word_id, wrong_count, last_wrong_at, is_mastered
             FROM wrong_word ORDER BY word_id",
        )?;
        let records = stmt
            .query_map([], WrongWordRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 获取未掌握的错题（内部实现）
    pub fn get_unmastered_internal(conn: &Connection) -> StorageResult<Vec<WrongWordRecord>> {
        let mut stmt = conn.prepare(
            "SELECT word_id, wrong_count, last_wrong_at, is_mastered
             FROM wrong_word
             WHERE is_mastered = 0
             ORDER BY wrong_count DESC, word_id",
        )?;
        let records = stmt
            .query_map([], WrongWordRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 获取单个错题记录（内部实现）
    pub fn get_record_internal(
        conn: &Connection,
        word_id: i64,
    ) -> StorageResult<Option<WrongWordRecord>> {
        let mut stmt = conn.prepare(
            "SELECT word_id, wrong_count, last_wrong_at, is_mastered
             FROM wrong_word WHERE word_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![word_id], WrongWordRecord::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 记录一次答错（内部实现）
    pub fn record_wrong_internal(
        conn: &Connection,
        word_id: i64,
        wrong_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO wrong_word (word_id, wrong_count, last_wrong_at, is_mastered)
            VALUES (?1, 1, ?2, 0)
            ON CONFLICT(word_id) DO UPDATE SET
                wrong_count = wrong_count + 1,
                last_wrong_at = excluded.last_wrong_at,
                is_mastered = 0
            "#,
            params![word_id, format_datetime(wrong_at)],
        )?;
        Ok(())
    }

    /// 标记已掌握（内部实现）
    pub fn mark_mastered_internal(conn: &Connection, word_id: i64) -> StorageResult<()> {
        conn.execute(
            "UPDATE wrong_word SET is_mastered = 1 WHERE word_id = ?1",
            params![word_id],
        )?;
        Ok(())
    }

    /// 清空错题账本（内部实现，备份导入/重置用）
    pub fn clear_internal(conn: &Connection) -> StorageResult<()> {
        conn.execute("DELETE FROM wrong_word", [])?;
        Ok(())
    }
}
