// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lifecycle of an exam session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// A proctored exam session.
///
/// Lives in the active map (keyed by student wallet) while running, then
/// moves to the history map (keyed by session id) on completion. History
/// records are never deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    pub session_id: String,
    pub student_wallet: String,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds between start and end; present once completed.
    #[serde(rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    pub status: SessionStatus,
    pub ip_address: String,
    pub user_agent: String,
}

/// Inputs for opening a session; request-derived fields (ip, user agent)
/// are captured by the handler.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub student_wallet: String,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub ip_address: String,
    pub user_agent: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct StartExamRequest {
    #[validate(length(min = 1, message = "studentWallet is required"))]
    pub student_wallet: String,
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "examSession is required"))]
    pub exam_session: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct EndExamRequest {
    #[validate(length(min = 1, message = "studentWallet is required"))]
    pub student_wallet: String,
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityRequest {
    #[validate(length(min = 1, message = "studentWallet is required"))]
    pub student_wallet: String,
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,
    #[validate(length(min = 1, message = "activity is required"))]
    pub activity: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CheatReportRequest {
    #[validate(length(min = 1, message = "studentWallet is required"))]
    pub student_wallet: String,
    #[validate(length(min = 1, message = "reason is required"))]
    pub reason: String,
    /// Client-side timestamp of the terminal violation; echoed in logs only.
    pub timestamp: Option<DateTime<Utc>>,
}
