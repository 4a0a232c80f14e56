//! SQLite 本地存储模块
//!
//! 提供学习进度的本地持久化，支持：
//! - 已学单词集合
//! - 错题账本（答错次数、掌握标记）
//! - 学习会话日志
//! - 总体进度与备份导入导出

// ============================================================
// 子模块声明
// ============================================================

pub mod backup;
pub mod migrations;
pub mod models;
pub mod progress;
pub mod session;
pub mod studied_word;
pub mod wrong_word;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use backup::BackupData;
pub use migrations::run_migrations;
pub use models::{Progress, ProgressUpdate, StudySession, WrongWordRecord};
pub use progress::ProgressRepository;
pub use session::SessionRepository;
pub use studied_word::StudiedWordRepository;
pub use wrong_word::WrongWordRepository;

// ============================================================
// 依赖导入
// ============================================================

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("数据未找到: {0}")]
    NotFound(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// Storage - 统一存储结构体
// ============================================================

/// 统一存储结构体
///
/// 持有数据库连接并提供对所有 Repository 的便捷访问。
/// 单浏览器式的单写者模型：连接互斥锁串行化所有访问。
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Storage {
    /// 打开（或创建）指定路径的数据库
    ///
    /// 自动启用 WAL 模式、外键约束，并运行数据库迁移。
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let path_str = db_path.as_ref().to_string_lossy().to_string();
        let connection = Connection::open(&db_path)?;

        // 启用 WAL 模式以提高并发性能
        connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;

        let conn = Arc::new(Mutex::new(connection));

        // 运行迁移
        {
            let guard = conn
                .lock()
                .map_err(|e| StorageError::LockError(e.to_string()))?;
            migrations::run_migrations(&guard)?;
        }

        Ok(Self {
            conn,
            db_path: path_str,
        })
    }

    /// 创建内存数据库（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;

        connection.execute_batch("PRAGMA foreign_keys=ON;")?;

        let conn = Arc::new(Mutex::new(connection));

        {
            let guard = conn
                .lock()
                .map_err(|e| StorageError::LockError(e.to_string()))?;
            migrations::run_migrations(&guard)?;
        }

        Ok(Self {
            conn,
            db_path: ":memory:".to_string(),
        })
    }

    /// 获取数据库连接
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 获取数据库路径
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 获取已学单词仓库
    pub fn studied_words(&self) -> StudiedWordRepository {
        StudiedWordRepository::new(Arc::clone(&self.conn))
    }

    /// 获取错题账本仓库
    pub fn wrong_words(&self) -> WrongWordRepository {
        WrongWordRepository::new(Arc::clone(&self.conn))
    }

    /// 获取会话日志仓库
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(Arc::clone(&self.conn))
    }

    /// 获取进度仓库
    pub fn progress(&self) -> ProgressRepository {
        ProgressRepository::new(Arc::clone(&self.conn))
    }

    /// 执行事务
    ///
    /// # Example
    /// ```ignore
    /// let result = storage.transaction(|conn| {
    ///     conn.execute("INSERT INTO ...", [])?;
    ///     Ok(42)
    /// })?;
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }
}

// ============================================================
// 测试
// ============================================================
