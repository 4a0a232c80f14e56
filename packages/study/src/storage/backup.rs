//! 学习数据的备份导出与导入
//!
//! 导出为单个 JSON 文档，包含已学单词、错题账本、会话历史和总体进度。
//! 导入是全量替换：先解析整个文档，解析失败时不触碰任何数据；
//! 解析成功后在单个事务中清空并重建所有表。

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::storage::models::{Progress, StudySession, WrongWordRecord};
use crate::storage::{
    ProgressRepository, SessionRepository, Storage, StorageError, StorageResult,
    StudiedWordRepository, WrongWordRepository,
};

/// 备份文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    /// 已学单词 ID 列表
    pub studied_word_ids: Vec<i64>,
    /// 错题账本
    pub wrong_words: Vec<WrongWordRecord>,
    /// 会话历史
    pub sessions: Vec<StudySession>,
    /// 总体进度
    pub progress: Progress,
}

/// 导出全部学习数据为 JSON 字符串
pub fn export_all(storage: &Storage) -> StorageResult<String> {
    let mut studied_word_ids: Vec<i64> = storage
        .studied_words()
        .get_studied_word_ids()?
        .into_iter()
        .collect();
    studied_word_ids.sort_unstable();

    let data = BackupData {
        studied_word_ids,
        wrong_words: storage.wrong_words().get_all()?,
        sessions: storage.sessions().get_sessions()?,
        progress: storage.progress().get_progress()?,
    };

    serde_json::to_string_pretty(&data).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// 从 JSON 字符串导入全部学习数据
///
/// 整个文档解析失败时返回错误且不修改数据库。导入时已学单词的
/// 学习时间统一记为导入时刻（备份文档只保留 ID 列表）。
pub fn import_all(storage: &Storage, json: &str) -> StorageResult<()> {
    let data: BackupData =
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;

    let imported_at = Utc::now();
    storage.transaction(|conn| {
        StudiedWordRepository::clear_internal(conn)?;
        WrongWordRepository::clear_internal(conn)?;
        SessionRepository::clear_internal(conn)?;
        ProgressRepository::reset_internal(conn)?;

        StudiedWordRepository::add_studied_words_internal(
            conn,
            &data.studied_word_ids,
            imported_at,
        )?;
        for record in &data.wrong_words {
            record.upsert(conn)?;
        }
        for session in &data.sessions {
            SessionRepository::append_session_internal(conn, session)?;
        }
        data.progress.upsert(conn)?;

        Ok(())
    })?;

    log::info!(
        "已导入备份: {} 个已学单词, {} 条错题, {} 次会话",
        data.studied_word_ids.len(),
        data.wrong_words.len(),
        data.sessions.len()
    );

    Ok(())
}

/// 清空全部学习数据
pub fn reset_all(storage: &Storage) -> StorageResult<()> {
    storage.transaction(|conn| {
        StudiedWordRepository::clear_internal(conn)?;
        WrongWordRepository::clear_internal(conn)?;
        SessionRepository::clear_internal(conn)?;
        ProgressRepository::reset_internal(conn)?;
        Ok(())
    })?;

    log::info!("已清空全部学习数据");
    Ok(())
}
