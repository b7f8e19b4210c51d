// src/routes.rs

use axum::{
    Json, Router,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, exam, nft, student},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exam, nft, student, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, contract gateway, service clients).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/nonce", post(auth::nonce))
        .route("/verify-signature", post(auth::verify_signature))
        .route("/wallet/{address}", get(auth::wallet_info))
        .route("/logout", post(auth::logout));

    let exam_routes = Router::new()
        .route("/start", post(exam::start))
        .route("/end", post(exam::end))
        .route("/status/{student_wallet}", get(exam::status))
        .route("/history/{student_wallet}", get(exam::history))
        .route("/active-sessions", get(exam::active_sessions))
        .route("/activity", post(exam::activity))
        .route("/cheat-report", post(exam::cheat_report));

    let nft_routes = Router::new()
        .route(
            "/pending-mint",
            post(nft::add_pending_mint).get(nft::list_pending_mint),
        )
        .route("/complete-mint/{student_wallet}", post(nft::complete_mint))
        .route("/completed-mint", get(nft::list_completed_mint))
        .route("/mint", post(nft::mint))
        .route("/certificates", get(nft::certificates))
        .route("/metadata/{token_id}", get(nft::metadata))
        .route("/revoke/{token_id}", post(nft::revoke))
        .route("/whitelist/add", post(nft::whitelist_add))
        .route(
            "/whitelist/status/{student_address}",
            get(nft::whitelist_status),
        );

    let student_routes = Router::new()
        .route("/verify", post(student::verify))
        .route("/id-nft", get(student::id_nft));

    let admin_routes = Router::new()
        .route("/add-student", post(admin::add_student))
        .route(
            "/student-addresses",
            get(admin::list_student_addresses),
        )
        .route("/student-addresses/add", post(admin::add_student_address))
        .route(
            "/student-addresses/remove",
            post(admin::remove_student_address),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exam", exam_routes)
        .nest("/api/nft", nft_routes)
        .nest("/api/student", student_routes)
        .nest("/api/admin", admin_routes)
        .route("/api/health", get(health))
        .fallback(not_found)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "message": "Blockchain Exam Authentication API is running",
        "timestamp": Utc::now(),
    }))
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "message": format!("Cannot {} {}", method, uri),
        })),
    )
}
