// src/store/nonce.rs

//! Challenge/response login state, one live nonce per wallet.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::nonce::{NonceRecord, WalletInfo};
use crate::utils::token::random_hex;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthFlowError {
    #[error("Invalid nonce or wallet address")]
    InvalidNonce,
    #[error("Nonce expired")]
    NonceExpired,
}

impl AuthFlowError {
    pub fn detail(&self) -> &'static str {
        match self {
            AuthFlowError::InvalidNonce => {
                "No challenge was issued for this wallet, or the message does not match"
            }
            AuthFlowError::NonceExpired => "The challenge expired; request a new nonce",
        }
    }
}

/// The nonce and the human-readable challenge embedding it.
#[derive(Debug, Clone)]
pub struct IssuedNonce {
    pub nonce: String,
    pub message: String,
}

/// In-memory nonce store keyed by wallet address.
///
/// Reissuing overwrites the previous nonce, so at most one challenge is live
/// per wallet and a successful verification consumes it. The record itself
/// stays behind (with `verified_at` set) to back the wallet-info read; only
/// logout removes it.
#[derive(Clone)]
pub struct NonceStore {
    inner: Arc<RwLock<HashMap<String, NonceRecord>>>,
    ttl: Duration,
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(5))
    }

    /// TTL injection point for tests; production uses the 5-minute window.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issues a fresh 32-byte challenge for the wallet, overwriting any
    /// previous one.
    pub async fn issue(&self, wallet: &str) -> IssuedNonce {
        let nonce = random_hex(32);
        let message = format!(
            "Please sign this message to verify your wallet: {}",
            nonce
        );

        let mut map = self.inner.write().await;
        let verified_at = map.get(wallet).and_then(|r| r.verified_at);
        map.insert(
            wallet.to_string(),
            NonceRecord {
                nonce: Some(nonce.clone()),
                issued_at: Utc::now(),
                verified_at,
            },
        );

        IssuedNonce { nonce, message }
    }

    /// Checks the submitted message against the stored nonce and consumes it.
    ///
    /// No signature recovery happens here: the signature field is only
    /// required to be non-empty by the handler. Knowing the nonce is what
    /// passes the check.
    pub async fn verify(&self, wallet: &str, message: &str) -> Result<(), AuthFlowError> {
        let mut map = self.inner.write().await;
        let record = map.get_mut(wallet).ok_or(AuthFlowError::InvalidNonce)?;

        let live = record.nonce.as_deref().ok_or(AuthFlowError::InvalidNonce)?;
        if live != message {
            return Err(AuthFlowError::InvalidNonce);
        }

        if Utc::now().signed_duration_since(record.issued_at) > self.ttl {
            return Err(AuthFlowError::NonceExpired);
        }

        record.nonce = None;
        record.verified_at = Some(Utc::now());
        Ok(())
    }

    pub async fn wallet_info(&self, wallet: &str) -> WalletInfo {
        let map = self.inner.read().await;
        match map.get(wallet) {
            Some(record) => WalletInfo {
                wallet_address: wallet.to_string(),
                is_verified: record.verified_at.is_some(),
                last_login: record.verified_at,
            },
            None => WalletInfo {
                wallet_address: wallet.to_string(),
                is_verified: false,
                last_login: None,
            },
        }
    }

    pub async fn remove(&self, wallet: &str) {
        self.inner.write().await.remove(wallet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x7485b0810293AA7584b8A697e133A4F8785510fC";

    #[tokio::test]
    async fn verify_succeeds_exactly_once_per_nonce() {
        let store = NonceStore::new();
        let issued = store.issue(WALLET).await;

        assert_eq!(store.verify(WALLET, &issued.nonce).await, Ok(()));
        // The nonce was consumed.
        assert_eq!(
            store.verify(WALLET, &issued.nonce).await,
            Err(AuthFlowError::InvalidNonce)
        );
    }

    #[tokio::test]
    async fn verify_rejects_wrong_message_and_unknown_wallet() {
        let store = NonceStore::new();
        store.issue(WALLET).await;

        assert_eq!(
            store.verify(WALLET, "not-the-nonce").await,
            Err(AuthFlowError::InvalidNonce)
        );
        assert_eq!(
            store.verify("0x0000000000000000000000000000000000000000", "x").await,
            Err(AuthFlowError::InvalidNonce)
        );
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_nonce() {
        let store = NonceStore::new();
        let first = store.issue(WALLET).await;
        let second = store.issue(WALLET).await;
        assert_ne!(first.nonce, second.nonce);

        assert_eq!(
            store.verify(WALLET, &first.nonce).await,
            Err(AuthFlowError::InvalidNonce)
        );
        assert_eq!(store.verify(WALLET, &second.nonce).await, Ok(()));
    }

    #[tokio::test]
    async fn expired_nonce_is_rejected() {
        let store = NonceStore::with_ttl(Duration::milliseconds(10));
        let issued = store.issue(WALLET).await;

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;

        assert_eq!(
            store.verify(WALLET, &issued.nonce).await,
            Err(AuthFlowError::NonceExpired)
        );
    }

    #[tokio::test]
    async fn wallet_info_tracks_login_state() {
        let store = NonceStore::new();

        let info = store.wallet_info(WALLET).await;
        assert!(!info.is_verified);
        assert!(info.last_login.is_none());

        let issued = store.issue(WALLET).await;
        store.verify(WALLET, &issued.nonce).await.unwrap();

        let info = store.wallet_info(WALLET).await;
        assert!(info.is_verified);
        assert!(info.last_login.is_some());

        store.remove(WALLET).await;
        assert!(!store.wallet_info(WALLET).await.is_verified);
    }
}
