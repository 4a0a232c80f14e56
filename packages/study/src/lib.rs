//! # kanji-study - 漢字学習ドリルの本体
//!
//! 词表目录、SQLite 本地存储和学习服务层。纯算法部分在
//! [`kanji_algo`] 中，本 crate 负责把它接到持久化数据上。
//!
//! ## 模块结构
//!
//! - [`catalog`] - 内置词表（按 JLPT 等级嵌入）
//! - [`storage`] - SQLite 存储（已学单词、错题账本、会话日志、进度、备份）
//! - [`service`] - 高层学习流程（出题 → 作答 → 落库）

// ============================================================================
// 模块声明
// ============================================================================

pub mod catalog;
pub mod service;
pub mod storage;

// ============================================================================
// 重新导出
// ============================================================================

pub use service::{Stats, StudyService};
pub use storage::{
    BackupData, Progress, ProgressUpdate, Storage, StorageError, StorageResult, StudySession,
    WrongWordRecord,
};
