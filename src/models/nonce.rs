// src/models/nonce.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One challenge record per wallet.
///
/// `nonce` is `None` once consumed by a successful verification; the record
/// itself survives so `GET /api/auth/wallet/:address` can report login state.
#[derive(Debug, Clone)]
pub struct NonceRecord {
    pub nonce: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// What the wallet-info endpoint reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub wallet_address: String,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
}

/// DTO for requesting a login challenge.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NonceRequest {
    #[validate(length(min = 1, message = "walletAddress is required"))]
    pub wallet_address: String,
}

/// DTO for submitting a signed challenge.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifySignatureRequest {
    #[validate(length(min = 1, message = "walletAddress is required"))]
    pub wallet_address: String,
    #[validate(length(min = 1, message = "signature is required"))]
    pub signature: String,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
}

/// DTO for logout. The wallet address is optional; logging out an unknown
/// wallet is a no-op.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogoutRequest {
    pub wallet_address: String,
}
