//! 总体进度的数据库操作
//!
//! 进度是单例行（id 固定为 1）。数据库中没有该行时所有读取
//! 返回默认进度，首次写入时才创建。

use chrono::Utc;
use kanji_algo::JlptLevel;
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::storage::models::{Progress, ProgressUpdate};
use crate::storage::{StorageError, StorageResult};

/// 进度仓库
pub struct ProgressRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressRepository {
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

    /// 获取当前进度，没有记录时返回默认值
    pub fn get_progress(&self) -> StorageResult<Progress> {
        let conn = self.get_conn()?;
        Self::get_progress_internal(&conn)
    }

    /// 部分更新进度
    pub fn update_progress(&self, update: &ProgressUpdate) -> StorageResult<Progress> {
        let conn = self.get_conn()?;
        Self::update_progress_internal(&conn, update)
    }

    /// 累加已学单词数并刷新最近学习时间
    pub fn increment_words_studied(&self, count: i64) -> StorageResult<Progress> {
        let conn = self.get_conn()?;
        Self::increment_words_studied_internal(&conn, count)
    }

    /// 获取当前选择的等级
    pub fn get_current_level(&self) -> StorageResult<JlptLevel> {
        Ok(self.get_progress()?.current_level)
    }

    /// 设置当前等级
    pub fn set_current_level(&self, level: JlptLevel) -> StorageResult<Progress> {
        self.update_progress(&ProgressUpdate {
            current_level: Some(level),
            ..Default::default()
        })
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 获取进度（内部实现）
    pub fn get_progress_internal(conn: &Connection) -> StorageResult<Progress> {
        let progress = conn
            .query_row(
                "SELECT current_level, total_words_studied, last_study_date
                 FROM progress WHERE id = 1",
                [],
                |row| Progress::from_row(row),
            )
            .optional()?;

        Ok(progress.unwrap_or_default())
    }

    /// 部分更新进度（内部实现，读-改-写）
    pub fn update_progress_internal(
        conn: &Connection,
        update: &ProgressUpdate,
    ) -> StorageResult<Progress> {
        let mut progress = Self::get_progress_internal(conn)?;
        progress.apply(update);
        progress.upsert(conn)?;
        Ok(progress)
    }

    /// 累加已学单词数（内部实现）
    pub fn increment_words_studied_internal(
        conn: &Connection,
        count: i64,
    ) -> StorageResult<Progress> {
        let mut progress = Self::get_progress_internal(conn)?;
        progress.total_words_studied += count;
        progress.last_study_date = Some(Utc::now());
        progress.upsert(conn)?;
        Ok(progress)
    }

    /// 重置进度为默认值（内部实现，备份导入/重置用）
    pub fn reset_internal(conn: &Connection) -> StorageResult<()> {
        conn.execute("DELETE FROM progress", [])?;
        Ok(())
    }
}
