// src/store/mint.rs

//! In-memory pending/completed certificate mint lists.
//!
//! The HTTP layer merges these with chain-derived lists; this store only
//! owns the off-chain side.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::mint::{MintRecord, MintStatus};
use crate::utils::addr::normalize;
use crate::utils::token::random_hex;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MintQueueError {
    #[error("Student already in pending list")]
    AlreadyPending,
    #[error("Student not found in pending list")]
    NotFound,
    #[error("NFT certificate not found")]
    UnknownToken,
}

/// Inputs for queuing a student after they finish an exam.
#[derive(Debug, Clone)]
pub struct NewPendingMint {
    pub student_wallet: String,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub score: i64,
    pub exam_date: DateTime<Utc>,
    pub ip_address: String,
}

#[derive(Default)]
struct Inner {
    pending: Vec<MintRecord>,
    completed: Vec<MintRecord>,
}

#[derive(Clone, Default)]
pub struct MintQueue {
    inner: Arc<RwLock<Inner>>,
}

impl MintQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the pending list. Wallet uniqueness is case-insensitive.
    /// Returns the stored record and the new pending count.
    pub async fn add_pending(
        &self,
        new: NewPendingMint,
    ) -> Result<(MintRecord, usize), MintQueueError> {
        let mut inner = self.inner.write().await;

        let wallet = normalize(&new.student_wallet);
        if inner
            .pending
            .iter()
            .any(|r| normalize(&r.student_wallet) == wallet)
        {
            return Err(MintQueueError::AlreadyPending);
        }

        let record = MintRecord {
            student_wallet: new.student_wallet,
            student_id: new.student_id,
            subject: new.subject,
            exam_session: new.exam_session,
            score: new.score,
            exam_date: new.exam_date,
            ip_address: new.ip_address,
            status: MintStatus::Pending,
            added_at: Utc::now(),
            token_id: None,
            mint_date: None,
            is_valid: true,
            revocation_date: None,
            revocation_reason: None,
        };
        inner.pending.push(record.clone());

        Ok((record, inner.pending.len()))
    }

    /// Moves a wallet from pending to completed, attaching the token id and
    /// mint date (generated/now when the caller has none).
    /// Returns the completed record plus the new (pending, completed) counts.
    pub async fn complete(
        &self,
        wallet: &str,
        token_id: Option<String>,
        mint_date: Option<DateTime<Utc>>,
    ) -> Result<(MintRecord, usize, usize), MintQueueError> {
        let mut inner = self.inner.write().await;

        let wallet = normalize(wallet);
        let index = inner
            .pending
            .iter()
            .position(|r| normalize(&r.student_wallet) == wallet)
            .ok_or(MintQueueError::NotFound)?;

        let mut record = inner.pending.remove(index);
        record.token_id = Some(token_id.unwrap_or_else(|| random_hex(16)));
        record.mint_date = Some(mint_date.unwrap_or_else(Utc::now));
        record.status = MintStatus::Completed;
        inner.completed.push(record.clone());

        Ok((record, inner.pending.len(), inner.completed.len()))
    }

    pub async fn pending(&self) -> Vec<MintRecord> {
        self.inner.read().await.pending.clone()
    }

    pub async fn completed(&self) -> Vec<MintRecord> {
        self.inner.read().await.completed.clone()
    }

    /// Marks the record carrying `token_id` invalid, in either list.
    pub async fn revoke(
        &self,
        token_id: &str,
        reason: &str,
    ) -> Result<MintRecord, MintQueueError> {
        let mut inner = self.inner.write().await;

        let Inner { pending, completed } = &mut *inner;
        let record = pending
            .iter_mut()
            .chain(completed.iter_mut())
            .find(|r| r.token_id.as_deref() == Some(token_id))
            .ok_or(MintQueueError::UnknownToken)?;

        record.is_valid = false;
        record.revocation_date = Some(Utc::now());
        record.revocation_reason = Some(reason.to_string());
        Ok(record.clone())
    }
}
