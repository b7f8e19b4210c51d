// src/store/session.rs

//! Active exam sessions and the permanent attempt history.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::session::{ExamSession, NewSession, SessionStatus};
use crate::proctor::{CheatMonitor, Verdict, classify_activity};
use crate::utils::token::random_hex;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Student already in exam session")]
    AlreadyActive,
    #[error("No active exam session found")]
    NotFound,
}

#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EndedSession {
    pub session_id: String,
    pub duration_ms: i64,
    pub end_time: DateTime<Utc>,
}

struct ActiveSession {
    record: ExamSession,
    monitor: CheatMonitor,
}

#[derive(Default)]
struct Inner {
    /// At most one entry per student wallet.
    active: HashMap<String, ActiveSession>,
    /// Completed attempts keyed by session id; never pruned.
    history: HashMap<String, ExamSession>,
}

/// Tracks one active exam session per student wallet plus the history of
/// completed attempts.
///
/// Check-then-act spans hold the write lock for their whole duration, so the
/// single-active-session guarantee holds on a multi-threaded runtime.
#[derive(Clone, Default)]
pub struct SessionTracker {
    inner: Arc<RwLock<Inner>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session; rejects wallets that already have one running.
    pub async fn start(&self, new: NewSession) -> Result<StartedSession, SessionError> {
        let mut inner = self.inner.write().await;
        if inner.active.contains_key(&new.student_wallet) {
            return Err(SessionError::AlreadyActive);
        }

        let session_id = random_hex(16);
        let start_time = Utc::now();
        let record = ExamSession {
            session_id: session_id.clone(),
            student_wallet: new.student_wallet.clone(),
            student_id: new.student_id,
            subject: new.subject,
            exam_session: new.exam_session,
            start_time,
            end_time: None,
            duration_ms: None,
            status: SessionStatus::Active,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
        };

        inner.active.insert(
            new.student_wallet,
            ActiveSession {
                record,
                monitor: CheatMonitor::new(),
            },
        );

        Ok(StartedSession {
            session_id,
            start_time,
        })
    }

    /// Completes the wallet's session, moving it into history.
    pub async fn end(&self, wallet: &str, session_id: &str) -> Result<EndedSession, SessionError> {
        let mut inner = self.inner.write().await;

        let active = inner.active.remove(wallet).ok_or(SessionError::NotFound)?;
        if active.record.session_id != session_id {
            inner.active.insert(wallet.to_string(), active);
            return Err(SessionError::NotFound);
        }
        let ActiveSession { mut record, .. } = active;

        let end_time = Utc::now();
        let duration_ms = end_time
            .signed_duration_since(record.start_time)
            .num_milliseconds();
        record.end_time = Some(end_time);
        record.duration_ms = Some(duration_ms);
        record.status = SessionStatus::Completed;

        let ended = EndedSession {
            session_id: record.session_id.clone(),
            duration_ms,
            end_time,
        };
        inner.history.insert(record.session_id.clone(), record);

        Ok(ended)
    }

    /// Active session for the wallet, if any.
    pub async fn status(&self, wallet: &str) -> Option<ExamSession> {
        let inner = self.inner.read().await;
        inner.active.get(wallet).map(|s| s.record.clone())
    }

    /// Completed attempts for the wallet, oldest first.
    pub async fn history_for(&self, wallet: &str) -> Vec<ExamSession> {
        let inner = self.inner.read().await;
        let mut attempts: Vec<ExamSession> = inner
            .history
            .values()
            .filter(|s| s.student_wallet == wallet)
            .cloned()
            .collect();
        attempts.sort_by_key(|s| s.end_time);
        attempts
    }

    pub async fn active_sessions(&self) -> Vec<ExamSession> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<ExamSession> =
            inner.active.values().map(|s| s.record.clone()).collect();
        sessions.sort_by_key(|s| s.start_time);
        sessions
    }

    /// Validates the session and feeds the activity into its cheat monitor.
    ///
    /// Returns the monitor's verdict when the activity classified as a
    /// violation; benign activity returns `None`.
    pub async fn record_activity(
        &self,
        wallet: &str,
        session_id: &str,
        activity: &str,
    ) -> Result<Option<Verdict>, SessionError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .active
            .get_mut(wallet)
            .filter(|s| s.record.session_id == session_id)
            .ok_or(SessionError::NotFound)?;

        Ok(classify_activity(activity).map(|violation| session.monitor.observe(violation, Utc::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xABC0000000000000000000000000000000000001";

    fn new_session(wallet: &str) -> NewSession {
        NewSession {
            student_wallet: wallet.to_string(),
            student_id: "SV01".to_string(),
            subject: "Math".to_string(),
            exam_session: "S1".to_string(),
            ip_address: "127.0.0.1".to_string(),
            user_agent: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn second_start_for_same_wallet_is_rejected() {
        let tracker = SessionTracker::new();
        tracker.start(new_session(WALLET)).await.unwrap();

        let second = tracker.start(new_session(WALLET)).await;
        assert_eq!(second.unwrap_err(), SessionError::AlreadyActive);
    }

    #[tokio::test]
    async fn end_requires_matching_session_id() {
        let tracker = SessionTracker::new();
        let started = tracker.start(new_session(WALLET)).await.unwrap();

        assert_eq!(
            tracker.end(WALLET, "bogus").await.unwrap_err(),
            SessionError::NotFound
        );
        // The mismatched end must not have consumed the session.
        assert!(tracker.status(WALLET).await.is_some());

        let ended = tracker.end(WALLET, &started.session_id).await.unwrap();
        assert!(ended.duration_ms >= 0);
        assert!(tracker.status(WALLET).await.is_none());
    }

    #[tokio::test]
    async fn completed_sessions_land_in_history() {
        let tracker = SessionTracker::new();
        let started = tracker.start(new_session(WALLET)).await.unwrap();
        tracker.end(WALLET, &started.session_id).await.unwrap();

        let history = tracker.history_for(WALLET).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, SessionStatus::Completed);
        assert_eq!(history[0].session_id, started.session_id);

        // A new attempt is allowed after the first completes.
        tracker.start(new_session(WALLET)).await.unwrap();
    }

    #[tokio::test]
    async fn history_is_per_wallet() {
        let tracker = SessionTracker::new();
        let other = "0xABC0000000000000000000000000000000000002";

        let a = tracker.start(new_session(WALLET)).await.unwrap();
        let b = tracker.start(new_session(other)).await.unwrap();
        tracker.end(WALLET, &a.session_id).await.unwrap();
        tracker.end(other, &b.session_id).await.unwrap();

        assert_eq!(tracker.history_for(WALLET).await.len(), 1);
        assert_eq!(tracker.history_for(other).await.len(), 1);
    }

    #[tokio::test]
    async fn activity_requires_a_live_session() {
        let tracker = SessionTracker::new();
        assert_eq!(
            tracker
                .record_activity(WALLET, "nope", "tab-blur")
                .await
                .unwrap_err(),
            SessionError::NotFound
        );

        let started = tracker.start(new_session(WALLET)).await.unwrap();
        let verdict = tracker
            .record_activity(WALLET, &started.session_id, "tab-blur")
            .await
            .unwrap();
        assert!(matches!(verdict, Some(Verdict::Warned { count: 1, .. })));

        let benign = tracker
            .record_activity(WALLET, &started.session_id, "answer-saved")
            .await
            .unwrap();
        assert!(benign.is_none());
    }
}
