//! 学习服务层
//!
//! 把词表、出题调度、复习状态机和本地存储串成完整的学习流程：
//! 出题 → 多轮作答 → 汇总落库。落库在单个事务中完成，已学单词、
//! 错题账本、会话日志和总体进度要么全部更新要么全部不更新。

use chrono::{DateTime, Utc};
use kanji_algo::{scheduler, JlptLevel, KanjiWord, ReviewSession, SessionSummary};
use rand::Rng;
use uuid::Uuid;

use crate::catalog;
use crate::storage::{
    ProgressRepository, SessionRepository, Storage, StorageResult, StudiedWordRepository,
    StudySession, WrongWordRepository,
};

/// 某一等级的学习统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// 统计对应的等级
    pub level: JlptLevel,
    /// 词表总单词数
    pub total_words: usize,
    /// 其中已学的数量
    pub studied_words: usize,
    /// 尚未学习的数量
    pub remaining_words: usize,
    /// 完成度百分比（四舍五入）
    pub completion: u32,
    /// 累计完成会话数
    pub session_count: i64,
    /// 历史会话的总正确率百分比（四舍五入，无会话时为 0）
    pub overall_accuracy: u32,
    /// 未掌握的错题数量
    pub unmastered_wrong_words: usize,
    /// 最近一次学习时间
    pub last_study_date: Option<DateTime<Utc>>,
}

/// 学习服务
///
/// 持有存储并提供面向调用方的高层操作。
pub struct StudyService {
    storage: Storage,
}

impl StudyService {
    /// 创建服务实例
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// 访问底层存储
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// 生成今日题目列表
    ///
    /// 首次学习只出新词；之后每次复习已学词并补充新词。
    pub fn build_daily_questions<R: Rng>(
        &self,
        level: JlptLevel,
        rng: &mut R,
    ) -> StorageResult<Vec<KanjiWord>> {
        let all_words = catalog::load_words(level);
        let studied_ids = self.storage.studied_words().get_studied_word_ids()?;
        let session_count = self.storage.sessions().get_session_count()? as usize;

        Ok(scheduler::generate_daily_questions(
            &all_words,
            &studied_ids,
            session_count,
            rng,
        ))
    }

    /// 开始一次学习会话
    pub fn start_session<R: Rng>(
        &self,
        level: JlptLevel,
        rng: &mut R,
    ) -> StorageResult<ReviewSession> {
        let questions = self.build_daily_questions(level, rng)?;
        Ok(ReviewSession::new(questions))
    }

    /// 持久化一次完成的会话
    ///
    /// 在单个事务中：
    /// 1. 记录所有出现过的单词为已学
    /// 2. 按最终判分更新错题账本（答对翻掌握标记，答错计数加一）
    /// 3. 追加会话日志（空会话也会留下一条记录）
    /// 4. 累加总体进度并刷新最近学习时间
    pub fn complete_session(&self, summary: &SessionSummary) -> StorageResult<StudySession> {
        let now = Utc::now();
        let record = StudySession {
            id: Uuid::new_v4().to_string(),
            date: now,
            total_questions: summary.total_questions() as i64,
            correct_answers: summary.correct_answers as i64,
            completed_at: now,
            results: summary.results.clone(),
        };

        self.storage.transaction(|conn| {
            StudiedWordRepository::add_studied_words_internal(
                conn,
                &summary.presented_word_ids,
                now,
            )?;

            for result in &summary.results {
                if result.is_correct {
                    WrongWordRepository::mark_mastered_internal(conn, result.word_id)?;
                } else {
                    WrongWordRepository::record_wrong_internal(conn, result.word_id, now)?;
                }
            }

            SessionRepository::append_session_internal(conn, &record)?;
            ProgressRepository::increment_words_studied_internal(
                conn,
                summary.presented_word_ids.len() as i64,
            )?;

            Ok(())
        })?;

        log::info!(
            "会话完成: {}/{} 答对",
            record.correct_answers,
            record.total_questions
        );

        Ok(record)
    }

    /// 获取指定等级的学习统计
    pub fn get_stats(&self, level: JlptLevel) -> StorageResult<Stats> {
        let all_words = catalog::load_words(level);
        let studied_ids = self.storage.studied_words().get_studied_word_ids()?;

        let total_words = all_words.len();
        let studied_words = scheduler::studied_word_count(&all_words, &studied_ids);

        let sessions = self.storage.sessions().get_sessions()?;
        let asked: i64 = sessions.iter().map(|s| s.total_questions).sum();
        let correct: i64 = sessions.iter().map(|s| s.correct_answers).sum();
        let overall_accuracy = if asked == 0 {
            0
        } else {
            ((correct as f64 / asked as f64) * 100.0).round() as u32
        };

        let progress = self.storage.progress().get_progress()?;

        Ok(Stats {
            level,
            total_words,
            studied_words,
            remaining_words: scheduler::remaining_word_count(&all_words, &studied_ids),
            completion: scheduler::level_completion(total_words, studied_words),
            session_count: sessions.len() as i64,
            overall_accuracy,
            unmastered_wrong_words: self.storage.wrong_words().get_unmastered()?.len(),
            last_study_date: progress.last_study_date,
        })
    }

    /// 获取最需要复习的错题
    ///
    /// 未掌握的错题按答错次数从多到少排序，取前 `count` 个并
    /// 关联到词表；账本中存在但词表中已不存在的 ID 被跳过。
    pub fn wrong_words_for_review(
        &self,
        level: JlptLevel,
        count: usize,
    ) -> StorageResult<Vec<KanjiWord>> {
        let all_words = catalog::load_words(level);
        let unmastered = self.storage.wrong_words().get_unmastered()?;

        let words = unmastered
            .iter()
            .filter_map(|record| all_words.iter().find(|w| w.id == record.word_id))
            .take(count)
            .cloned()
            .collect();

        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_algo::SessionPhase;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn service() -> StudyService {
        StudyService::new(Storage::in_memory().expect("in-memory storage"))
    }

    /// 把一个会话按给定的错误单词集合答完并结束
    fn run_session(
        service: &StudyService,
        level: JlptLevel,
        wrong_ids: &[i64],
        rng: &mut ChaCha8Rng,
    ) -> SessionSummary {
        let mut session = service.start_session(level, rng).unwrap();

        loop {
            match session.phase() {
                SessionPhase::Presenting { .. } => {
                    let word = session.current_question().unwrap().clone();
                    if wrong_ids.contains(&word.id) {
                        session.skip().unwrap();
                    } else {
                        session
                            .submit_answer(word.hiragana.clone(), word.meaning.clone())
                            .unwrap();
                    }
                }
                SessionPhase::RoundGraded { .. } => break,
                SessionPhase::Complete => unreachable!("finish not called yet"),
            }
        }

        session.finish().unwrap()
    }

    #[test]
    fn test_first_session_is_new_words_only() {
        let service = service();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let questions = service
            .build_daily_questions(JlptLevel::N4, &mut rng)
            .unwrap();
        assert_eq!(questions.len(), kanji_algo::DAILY_NEW_LIMIT);
        assert!(questions.iter().all(|w| w.level == JlptLevel::N4));
    }

    #[test]
    fn test_complete_session_persists_everything() {
        let service = service();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let summary = run_session(&service, JlptLevel::N4, &[], &mut rng);
        let record = service.complete_session(&summary).unwrap();

        assert_eq!(record.total_questions, 10);
        assert_eq!(record.correct_answers, 10);

        let storage = service.storage();
        assert_eq!(storage.studied_words().count().unwrap(), 10);
        assert_eq!(storage.sessions().get_session_count().unwrap(), 1);

        let progress = storage.progress().get_progress().unwrap();
        assert_eq!(progress.total_words_studied, 10);
        assert!(progress.last_study_date.is_some());
    }

    #[test]
    fn test_wrong_answer_lands_in_the_ledger() {
        let service = service();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // 克隆 RNG 预览题目列表，保证会话看到同一份洗牌结果
        let questions = service
            .build_daily_questions(JlptLevel::N4, &mut rng.clone())
            .unwrap();
        let victim = questions[0].id;

        let summary = run_session(&service, JlptLevel::N4, &[victim], &mut rng);
        service.complete_session(&summary).unwrap();

        let record = service
            .storage()
            .wrong_words()
            .get_record(victim)
            .unwrap()
            .expect("wrong word recorded");
        assert_eq!(record.wrong_count, 1);
        assert!(!record.is_mastered);
    }

    #[test]
    fn test_second_session_mixes_review_and_new() {
        let service = service();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let summary = run_session(&service, JlptLevel::N4, &[], &mut rng);
        service.complete_session(&summary).unwrap();

        // N4 词表共 15 个：复习 10 个已学 + 剩余 5 个新词
        let questions = service
            .build_daily_questions(JlptLevel::N4, &mut rng)
            .unwrap();
        assert_eq!(questions.len(), 15);

        let studied = service
            .storage()
            .studied_words()
            .get_studied_word_ids()
            .unwrap();
        let new_count = questions.iter().filter(|w| !studied.contains(&w.id)).count();
        assert_eq!(new_count, 5);
    }

    #[test]
    fn test_empty_session_still_leaves_a_record() {
        let service = service();

        let mut session = ReviewSession::new(Vec::new());
        let summary = session.finish().unwrap();

        service.complete_session(&summary).unwrap();

        let storage = service.storage();
        assert_eq!(storage.sessions().get_session_count().unwrap(), 1);
        let latest = storage.sessions().get_latest_session().unwrap().unwrap();
        assert_eq!(latest.total_questions, 0);
        assert_eq!(storage.studied_words().count().unwrap(), 0);
    }

    #[test]
    fn test_stats_track_progress() {
        let service = service();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let before = service.get_stats(JlptLevel::N4).unwrap();
        assert_eq!(before.total_words, 15);
        assert_eq!(before.studied_words, 0);
        assert_eq!(before.completion, 0);
        assert_eq!(before.overall_accuracy, 0);
        assert!(before.last_study_date.is_none());

        let questions = service
            .build_daily_questions(JlptLevel::N4, &mut rng.clone())
            .unwrap();
        let victim = questions[0].id;
        let summary = run_session(&service, JlptLevel::N4, &[victim], &mut rng);
        service.complete_session(&summary).unwrap();

        let after = service.get_stats(JlptLevel::N4).unwrap();
        assert_eq!(after.studied_words, 10);
        assert_eq!(after.remaining_words, 5);
        assert_eq!(after.completion, 67);
        assert_eq!(after.session_count, 1);
        // 9/10 答对
        assert_eq!(after.overall_accuracy, 90);
        assert_eq!(after.unmastered_wrong_words, 1);
        assert!(after.last_study_date.is_some());
    }

    #[test]
    fn test_wrong_words_for_review_sorted_and_joined() {
        let service = service();
        let repo = service.storage().wrong_words();

        repo.record_wrong(1).unwrap();
        repo.record_wrong(2).unwrap();
        repo.record_wrong(2).unwrap();
        repo.record_wrong(9999).unwrap(); // 词表中不存在

        let words = service
            .wrong_words_for_review(JlptLevel::N4, 10)
            .unwrap();
        let ids: Vec<i64> = words.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
