//! 已学单词集合的数据库操作
//!
//! 一个单词只要在任意会话中出现过一次即视为"已学"。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::storage::models::format_datetime;
use crate::storage::{StorageError, StorageResult};

/// 已学单词仓库
///
/// 支持两种使用方式：
/// 1. 使用 `Arc<Mutex<Connection>>` 进行线程安全操作
/// 2. 使用 `*_internal(&Connection)` 静态方法在事务内操作
pub struct StudiedWordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudiedWordRepository {
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

    /// 获取所有已学单词的 ID 集合
    pub fn get_studied_word_ids(&self) -> StorageResult<HashSet<i64>> {
        let conn = self.get_conn()?;
        Self::get_studied_word_ids_internal(&conn)
    }

    /// 批量记录已学单词（重复 ID 自动忽略）
    pub fn add_studied_words(&self, word_ids: &[i64]) -> StorageResult<()> {
        let conn = self.get_conn()?;
        Self::add_studied_words_internal(&conn, word_ids, Utc::now())
    }

    /// 获取已学单词总数
    pub fn count(&self) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::count_internal(&conn)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 获取已学单词 ID 集合（内部实现）
    pub fn get_studied_word_ids_internal(conn: &Connection) -> StorageResult<HashSet<i64>> {
        let mut stmt = conn.prepare("SELECT word_id FROM studied_word")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    /// 批量记录已学单词（内部实现）
    pub fn add_studied_words_internal(
        conn: &Connection,
        word_ids: &[i64],
        studied_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        if word_ids.is_empty() {
            return Ok(());
        }

        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO studied_word (word_id, studied_at) VALUES (?1, ?2)",
        )?;
        let studied_at = format_datetime(studied_at);
        for word_id in word_ids {
            stmt.execute(params![word_id, studied_at])?;
        }
        Ok(())
    }

    /// 获取已学单词总数（内部实现）
    pub fn count_internal(conn: &Connection) -> StorageResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM studied_word", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 清空已学单词（内部实现，备份导入/重置用）
    pub fn clear_internal(conn: &Connection) -> StorageResult<()> {
        conn.execute("DELETE FROM studied_word", [])?;
        Ok(())
    }
}
