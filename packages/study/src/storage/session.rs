//! 学习会话日志的数据库操作
//!
//! 会话日志是 append-only 的：完成一次学习写入一条，之后不再修改。

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::storage::models::StudySession;
use crate::storage::{StorageError, StorageResult};

/// 会话日志仓库
pub struct SessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SessionRepository {
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

    /// 追加一条会话记录
    pub fn append_session(&self, session: &StudySession) -> StorageResult<()> {
        let conn = self.get_conn()?;
        Self::append_session_internal(&conn, session)
    }

    /// 获取全部会话历史，按完成时间从早到晚排序
    pub fn get_sessions(&self) -> StorageResult<Vec<StudySession>> {
        let conn = self.get_conn()?;
        Self::get_sessions_internal(&conn)
    }

    /// 获取会话总数
    pub fn get_session_count(&self) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::get_session_count_internal(&conn)
    }

    /// 获取最近一次完成的会话
    pub fn get_latest_session(&self) -> StorageResult<Option<StudySession>> {
        let conn = self.get_conn()?;
        Self::get_latest_session_internal(&conn)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 追加会话记录（内部实现）
    pub fn append_session_internal(conn: &Connection, session: &StudySession) -> StorageResult<()> {
        session.insert(conn)
    }

    /// 获取全部会话历史（内部实现）
    pub fn get_sessions_internal(conn: &Connection) -> StorageResult<Vec<StudySession>> {
        let mut stmt = conn.prepare(
            "SELECT id, date, total_questions, correct_answers, completed_at, results
             FROM study_session ORDER BY completed_at",
        )?;
        let sessions = stmt
            .query_map([], StudySession::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// 获取会话总数（内部实现）
    pub fn get_session_count_internal(conn: &Connection) -> StorageResult<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM study_session", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 获取最近一次会话（内部实现）
    pub fn get_latest_session_internal(conn: &Connection) -> StorageResult<Option<StudySession>> {
        let mut stmt = conn.prepare(
            "SELECT id, date, total_questions, correct_answers, completed_at, results
             FROM study_session ORDER BY completed_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([], StudySession::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 清空会话历史（内部实现，备份导入/重置用）
    pub fn clear_internal(conn: &Connection) -> StorageResult<()> {
        conn.execute("DELETE FROM study_session", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::{Duration, Utc};

    fn sample_session(id: &str, offset_minutes: i64) -> StudySession {
        let at = Utc::now() + Duration::minutes(offset_minutes);
        StudySession {
            id: id.to_string(),
            date: at,
            total_questions: 10,
            correct_answers: 8,
            completed_at: at,
            results: Vec::new(),
        }
    }

    #[test]
    fn test_empty_history() {
        let storage = Storage::in_memory().expect("in-memory storage");
        let repo = storage.sessions();

        assert!(repo.get_sessions().unwrap().is_empty());
        assert_eq!(repo.get_session_count().unwrap(), 0);
        assert!(repo.get_latest_session().unwrap().is_none());
    }

    #[test]
    fn test_append_and_read_back() {
        let storage = Storage::in_memory().expect("in-memory storage");
        let repo = storage.sessions();

        repo.append_session(&sample_session("s1", 0)).unwrap();

        let sessions = repo.get_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[0].total_questions, 10);
        assert_eq!(sessions[0].correct_answers, 8);
    }

    #[test]
    fn test_sessions_ordered_by_completion_time() {
        let storage = Storage::in_memory().expect("in-memory storage");
        let repo = storage.sessions();

        repo.append_session(&sample_session("late", 10)).unwrap();
        repo.append_session(&sample_session("early", -10)).unwrap();

        let sessions = repo.get_sessions().unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);

        let latest = repo.get_latest_session().unwrap().unwrap();
        assert_eq!(latest.id, "late");
    }

    #[test]
    fn test_corrupted_results_recover_as_empty() {
        let storage = Storage::in_memory().expect("in-memory storage");
        {
            let conn = storage.connection();
            let guard = conn.lock().unwrap();
            guard
                .execute(
                    "INSERT INTO study_session
                     (id, date, total_questions, correct_answers, completed_at, results)
                     VALUES ('bad', '2026-01-01T00:00:00Z', 5, 3, '2026-01-01T00:00:00Z', 'not json')",
                    [],
                )
                .unwrap();
        }

        let sessions = storage.sessions().get_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].results.is_empty());
        assert_eq!(sessions[0].total_questions, 5);
    }
}
