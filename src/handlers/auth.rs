// src/handlers/auth.rs

use axum::{Json, extract::Path, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::nonce::{LogoutRequest, NonceRequest, VerifySignatureRequest},
    store::NonceStore,
    utils::{addr::is_wallet_address, token::random_hex},
};

/// Issues a signing challenge for the wallet.
///
/// Reissuing replaces any previous challenge for the same wallet.
pub async fn nonce(
    State(store): State<NonceStore>,
    Json(payload): Json<NonceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.wallet_address.is_empty() {
        return Err(AppError::validation(
            "Missing wallet address",
            "walletAddress is required",
        ));
    }
    if !is_wallet_address(&payload.wallet_address) {
        return Err(AppError::validation(
            "Invalid wallet address",
            "walletAddress must be a 0x-prefixed 20-byte hex address",
        ));
    }

    let issued = store.issue(&payload.wallet_address).await;

    Ok(Json(json!({
        "success": true,
        "data": {
            "nonce": issued.nonce,
            "message": issued.message,
        }
    })))
}

/// Checks a submitted challenge response and issues a session token.
///
/// The signature field only has to be present; no key recovery is performed
/// against it. Possession of the live nonce is what passes the check.
pub async fn verify_signature(
    State(store): State<NonceStore>,
    Json(payload): Json<VerifySignatureRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing required fields",
            validation_errors.to_string(),
        ));
    }

    store
        .verify(&payload.wallet_address, &payload.message)
        .await?;

    let token = random_hex(32);

    Ok(Json(json!({
        "success": true,
        "message": "Wallet verified successfully",
        "data": {
            "token": token,
            "walletAddress": payload.wallet_address,
        }
    })))
}

/// Reports whether the wallet has completed a challenge and when.
pub async fn wallet_info(
    State(store): State<NonceStore>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let info = store.wallet_info(&address).await;

    Ok(Json(json!({
        "success": true,
        "data": info,
    })))
}

/// Drops the wallet's challenge record. Unknown wallets are a no-op.
pub async fn logout(
    State(store): State<NonceStore>,
    Json(payload): Json<LogoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !payload.wallet_address.is_empty() {
        store.remove(&payload.wallet_address).await;
    }

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}
