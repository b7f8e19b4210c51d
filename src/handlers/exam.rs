// src/handlers/exam.rs

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    chain::Contracts,
    error::AppError,
    models::session::{
        ActivityRequest, CheatReportRequest, EndExamRequest, NewSession, StartExamRequest,
    },
    proctor::Verdict,
    store::SessionTracker,
    utils::net::{client_ip, user_agent},
};

/// Opens an exam session for the wallet. One active session per wallet.
pub async fn start(
    State(tracker): State<SessionTracker>,
    headers: HeaderMap,
    Json(payload): Json<StartExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing required fields",
            validation_errors.to_string(),
        ));
    }

    let started = tracker
        .start(NewSession {
            student_wallet: payload.student_wallet,
            student_id: payload.student_id,
            subject: payload.subject,
            exam_session: payload.exam_session,
            ip_address: client_ip(&headers),
            user_agent: user_agent(&headers),
        })
        .await
        .map_err(|_| {
            AppError::conflict(
                "Student already in exam session",
                "You are already participating in an exam",
            )
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Exam session started successfully",
        "data": {
            "sessionId": started.session_id,
            "startTime": started.start_time,
        }
    })))
}

/// Completes the session and moves it into history.
pub async fn end(
    State(tracker): State<SessionTracker>,
    Json(payload): Json<EndExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing required fields",
            validation_errors.to_string(),
        ));
    }

    let ended = tracker
        .end(&payload.student_wallet, &payload.session_id)
        .await
        .map_err(|_| {
            AppError::validation("Invalid exam session", "No active exam session found")
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Exam session ended successfully",
        "data": {
            "sessionId": ended.session_id,
            "duration": ended.duration_ms,
            "endTime": ended.end_time,
        }
    })))
}

/// Pure read of the wallet's active session, if any.
pub async fn status(
    State(tracker): State<SessionTracker>,
    Path(student_wallet): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match tracker.status(&student_wallet).await {
        Some(session) => {
            let running_ms = Utc::now()
                .signed_duration_since(session.start_time)
                .num_milliseconds();
            Ok(Json(json!({
                "success": true,
                "data": {
                    "hasActiveSession": true,
                    "sessionId": session.session_id,
                    "subject": session.subject,
                    "examSession": session.exam_session,
                    "startTime": session.start_time,
                    "duration": running_ms,
                }
            })))
        }
        None => Ok(Json(json!({
            "success": true,
            "data": {
                "hasActiveSession": false,
                "message": "No active exam session",
            }
        }))),
    }
}

/// Completed attempts for one wallet, oldest first.
pub async fn history(
    State(tracker): State<SessionTracker>,
    Path(student_wallet): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = tracker.history_for(&student_wallet).await;
    let exam_history: Vec<Value> = attempts
        .iter()
        .map(|s| {
            json!({
                "sessionId": s.session_id,
                "subject": s.subject,
                "examSession": s.exam_session,
                "startTime": s.start_time,
                "endTime": s.end_time,
                "duration": s.duration_ms,
                "status": s.status,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "studentWallet": student_wallet,
            "examHistory": exam_history,
            "totalExams": attempts.len(),
        }
    })))
}

/// All currently running sessions (admin dashboard).
pub async fn active_sessions(
    State(tracker): State<SessionTracker>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = tracker.active_sessions().await;
    let active: Vec<Value> = sessions
        .iter()
        .map(|s| {
            json!({
                "sessionId": s.session_id,
                "studentWallet": s.student_wallet,
                "studentId": s.student_id,
                "subject": s.subject,
                "examSession": s.exam_session,
                "startTime": s.start_time,
                "ipAddress": s.ip_address,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "activeSessions": active,
            "totalActive": active.len(),
        }
    })))
}

/// Logs proctoring activity against a live session.
///
/// Activity that classifies as a violation feeds the session's cheat
/// monitor; a terminal verdict escalates through the same on-chain marking
/// path as `cheat_report`, so a client that never sends its own report still
/// gets flagged.
pub async fn activity(
    State(tracker): State<SessionTracker>,
    State(contracts): State<Contracts>,
    Json(payload): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing required fields",
            validation_errors.to_string(),
        ));
    }

    let verdict = tracker
        .record_activity(&payload.student_wallet, &payload.session_id, &payload.activity)
        .await
        .map_err(|_| {
            AppError::validation("Invalid exam session", "No active exam session found")
        })?;

    tracing::info!(
        "Exam activity - Student: {}, Session: {}, Activity: {}",
        payload.student_wallet,
        payload.session_id,
        payload.activity
    );

    let data = match verdict {
        Some(Verdict::Warned {
            count,
            limit,
            reason,
            ..
        }) => Some(json!({
            "warning": { "reason": reason, "count": count, "limit": limit }
        })),
        Some(Verdict::Terminated { reason }) => {
            let outcome = mark_cheater_once(&contracts, &payload.student_wallet, &reason).await;
            Some(json!({
                "terminated": true,
                "reason": reason,
                "report": outcome,
            }))
        }
        Some(Verdict::Debounced) | Some(Verdict::Ignored) | None => None,
    };

    let mut body = json!({
        "success": true,
        "message": "Activity logged successfully",
    });
    if let Some(data) = data {
        body["data"] = data;
    }

    Ok(Json(body))
}

/// Terminal cheat report from the client.
///
/// Re-checks the on-chain cheater flag before marking so repeated reports
/// (or a report racing the activity-driven escalation) never double-mark.
pub async fn cheat_report(
    State(contracts): State<Contracts>,
    Json(payload): Json<CheatReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing studentWallet or reason",
            validation_errors.to_string(),
        ));
    }

    let already = contracts
        .registration
        .is_cheater(&payload.student_wallet)
        .await?;
    if already {
        tracing::info!(
            "Cheat report for {} ignored: already marked",
            payload.student_wallet
        );
        return Ok(Json(json!({
            "success": true,
            "alreadyCheater": true,
            "message": "Student already marked as cheater",
        })));
    }

    let receipt = contracts
        .registration_write
        .mark_cheating(&payload.student_wallet, &payload.reason)
        .await?;
    tracing::info!(
        "Marked cheater: {}, reason: {}, tx: {}",
        payload.student_wallet,
        payload.reason,
        receipt.tx_hash
    );

    Ok(Json(json!({
        "success": true,
        "marked": true,
        "txHash": receipt.tx_hash,
    })))
}

/// Shared idempotent marking path. Failures are reported in the returned
/// value rather than failing the caller; the activity log must still land.
async fn mark_cheater_once(contracts: &Contracts, wallet: &str, reason: &str) -> Value {
    match contracts.registration.is_cheater(wallet).await {
        Ok(true) => json!({ "alreadyCheater": true }),
        Ok(false) => match contracts.registration_write.mark_cheating(wallet, reason).await {
            Ok(receipt) => {
                tracing::info!("Marked cheater: {}, reason: {}, tx: {}", wallet, reason, receipt.tx_hash);
                json!({ "marked": true, "txHash": receipt.tx_hash })
            }
            Err(e) => {
                tracing::error!("Failed to mark cheater {}: {}", wallet, e);
                json!({ "marked": false, "error": e.to_string() })
            }
        },
        Err(e) => {
            tracing::error!("Cheater status check failed for {}: {}", wallet, e);
            json!({ "marked": false, "error": e.to_string() })
        }
    }
}
