// src/chain/memory.rs

//! In-process chain stub.
//!
//! Backs the test suite and the `RPC_URL=memory` development mode with the
//! same trait surface as the node gateway. Addresses compare
//! case-insensitively, matching on-chain semantics. Transaction hashes are
//! a deterministic counter so assertions stay stable.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    CertificateRead, CertificateWrite, ChainError, ExamInfo, IdentityRead, IdentityWrite,
    MintCertificate, MintedId, RegistrationRead, RegistrationWrite, Signer, TxReceipt,
};
use crate::utils::addr::normalize;

#[derive(Debug, Clone)]
struct StoredCertificate {
    owner: String,
    token_uri: String,
    info: ExamInfo,
    valid: bool,
}

#[derive(Debug, Clone)]
struct StoredIdentity {
    owner: String,
    token_uri: String,
}

#[derive(Default)]
struct ChainState {
    whitelist: Vec<String>,
    cheaters: Vec<(String, String)>,
    certificates: Vec<StoredCertificate>,
    identities: Vec<StoredIdentity>,
    tx_counter: u64,
    mark_cheating_calls: u64,
}

impl ChainState {
    fn next_tx(&mut self) -> TxReceipt {
        self.tx_counter += 1;
        TxReceipt {
            tx_hash: format!("0x{:064x}", self.tx_counter),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryChain {
    state: Arc<RwLock<ChainState>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a signer context, mirroring the node gateway's factory. The
    /// stub does not check authorization; it only preserves the shape.
    pub fn with_signer(&self, signer: Signer) -> SignedMemoryChain {
        SignedMemoryChain {
            chain: self.clone(),
            _signer: signer,
        }
    }

    // ── Seeding / inspection helpers for tests ──────────────────────────

    pub async fn seed_whitelisted(&self, wallet: &str) {
        let mut state = self.state.write().await;
        state.whitelist.push(wallet.to_string());
    }

    pub async fn seed_cheater(&self, wallet: &str, reason: &str) {
        let mut state = self.state.write().await;
        state
            .cheaters
            .push((normalize(wallet), reason.to_string()));
    }

    pub async fn seed_identity(&self, wallet: &str, token_uri: &str) -> u64 {
        let mut state = self.state.write().await;
        state.identities.push(StoredIdentity {
            owner: wallet.to_string(),
            token_uri: token_uri.to_string(),
        });
        state.identities.len() as u64
    }

    pub async fn seed_certificate(&self, mint: &MintCertificate, info: ExamInfo) -> u64 {
        let mut state = self.state.write().await;
        state.certificates.push(StoredCertificate {
            owner: mint.student_wallet.clone(),
            token_uri: mint.token_uri.clone(),
            info,
            valid: true,
        });
        state.certificates.len() as u64
    }

    pub async fn mark_cheating_calls(&self) -> u64 {
        self.state.read().await.mark_cheating_calls
    }
}

#[async_trait]
impl RegistrationRead for MemoryChain {
    async fn is_whitelisted(&self, wallet: &str) -> Result<bool, ChainError> {
        let state = self.state.read().await;
        let wallet = normalize(wallet);
        Ok(state.whitelist.iter().any(|w| normalize(w) == wallet))
    }

    async fn whitelist_count(&self) -> Result<u64, ChainError> {
        Ok(self.state.read().await.whitelist.len() as u64)
    }

    async fn whitelisted_student(&self, index: u64) -> Result<String, ChainError> {
        let state = self.state.read().await;
        state
            .whitelist
            .get(index as usize)
            .cloned()
            .ok_or_else(|| ChainError::Node(format!("whitelist index {index} out of range")))
    }

    async fn is_cheater(&self, wallet: &str) -> Result<bool, ChainError> {
        let state = self.state.read().await;
        let wallet = normalize(wallet);
        Ok(state.cheaters.iter().any(|(w, _)| *w == wallet))
    }
}

#[async_trait]
impl CertificateRead for MemoryChain {
    async fn total_certificates(&self) -> Result<u64, ChainError> {
        Ok(self.state.read().await.certificates.len() as u64)
    }

    async fn owner_of(&self, token_id: u64) -> Result<String, ChainError> {
        let state = self.state.read().await;
        certificate(&state, token_id).map(|c| c.owner.clone())
    }

    async fn token_uri(&self, token_id: u64) -> Result<String, ChainError> {
        let state = self.state.read().await;
        certificate(&state, token_id).map(|c| c.token_uri.clone())
    }

    async fn exam_info(&self, token_id: u64) -> Result<ExamInfo, ChainError> {
        let state = self.state.read().await;
        certificate(&state, token_id).map(|c| c.info.clone())
    }

    async fn is_valid(&self, token_id: u64) -> Result<bool, ChainError> {
        let state = self.state.read().await;
        certificate(&state, token_id).map(|c| c.valid)
    }

    async fn token_id_by_wallet(&self, wallet: &str) -> Result<u64, ChainError> {
        let state = self.state.read().await;
        let wallet = normalize(wallet);
        Ok(state
            .certificates
            .iter()
            .position(|c| normalize(&c.owner) == wallet)
            .map(|i| i as u64 + 1)
            .unwrap_or(0))
    }
}

#[async_trait]
impl IdentityRead for MemoryChain {
    async fn token_id_by_wallet(&self, wallet: &str) -> Result<u64, ChainError> {
        let state = self.state.read().await;
        let wallet = normalize(wallet);
        Ok(state
            .identities
            .iter()
            .position(|t| normalize(&t.owner) == wallet)
            .map(|i| i as u64 + 1)
            .unwrap_or(0))
    }

    async fn token_uri(&self, token_id: u64) -> Result<String, ChainError> {
        let state = self.state.read().await;
        state
            .identities
            .get(token_id.wrapping_sub(1) as usize)
            .map(|t| t.token_uri.clone())
            .ok_or_else(|| ChainError::Node(format!("identity token {token_id} does not exist")))
    }
}

/// Token ids are 1-based.
fn certificate(state: &ChainState, token_id: u64) -> Result<&StoredCertificate, ChainError> {
    state
        .certificates
        .get(token_id.wrapping_sub(1) as usize)
        .ok_or_else(|| ChainError::Node(format!("certificate {token_id} does not exist")))
}

/// Write interface over the shared stub state.
#[derive(Clone)]
pub struct SignedMemoryChain {
    chain: MemoryChain,
    _signer: Signer,
}

#[async_trait]
impl RegistrationWrite for SignedMemoryChain {
    async fn add_to_whitelist(&self, wallet: &str) -> Result<TxReceipt, ChainError> {
        let mut state = self.chain.state.write().await;
        let normalized = normalize(wallet);
        if state.whitelist.iter().any(|w| normalize(w) == normalized) {
            return Err(ChainError::Node("execution reverted: already whitelisted".into()));
        }
        state.whitelist.push(wallet.to_string());
        Ok(state.next_tx())
    }

    async fn mark_cheating(&self, wallet: &str, reason: &str) -> Result<TxReceipt, ChainError> {
        let mut state = self.chain.state.write().await;
        state.mark_cheating_calls += 1;
        let normalized = normalize(wallet);
        if !state.cheaters.iter().any(|(w, _)| *w == normalized) {
            state.cheaters.push((normalized, reason.to_string()));
        }
        Ok(state.next_tx())
    }
}

#[async_trait]
impl CertificateWrite for SignedMemoryChain {
    async fn mint_certificate(&self, mint: &MintCertificate) -> Result<TxReceipt, ChainError> {
        let mut state = self.chain.state.write().await;
        let wallet = normalize(&mint.student_wallet);
        if state
            .certificates
            .iter()
            .any(|c| normalize(&c.owner) == wallet)
        {
            return Err(ChainError::Node(
                "execution reverted: certificate already minted".into(),
            ));
        }
        let now = chrono::Utc::now().timestamp();
        state.certificates.push(StoredCertificate {
            owner: mint.student_wallet.clone(),
            token_uri: mint.token_uri.clone(),
            info: ExamInfo {
                student_id: mint.student_id.clone(),
                subject: mint.subject.clone(),
                exam_session: mint.exam_session.clone(),
                exam_date: now,
                ip_address: mint.ip_address.clone(),
                verification_time: now,
            },
            valid: true,
        });
        Ok(state.next_tx())
    }
}

#[async_trait]
impl IdentityWrite for SignedMemoryChain {
    async fn mint_student_id(
        &self,
        wallet: &str,
        _student_id: &str,
        metadata_uri: &str,
    ) -> Result<MintedId, ChainError> {
        let mut state = self.chain.state.write().await;
        state.identities.push(StoredIdentity {
            owner: wallet.to_string(),
            token_uri: metadata_uri.to_string(),
        });
        let token_id = state.identities.len() as u64;
        let receipt = state.next_tx();
        Ok(MintedId {
            tx_hash: receipt.tx_hash,
            token_id,
        })
    }
}
