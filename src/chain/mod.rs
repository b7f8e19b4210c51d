// src/chain/mod.rs

//! Typed gateway to the pre-deployed exam contracts.
//!
//! One trait method per on-chain function this service actually calls.
//! Read and write interfaces are separate: reads go through a bare provider
//! and never need a signer; every write carries an explicit signer context
//! (the server's key, or a user wallet when a call is relayed on a user's
//! behalf). The contracts themselves are external; their invariants live
//! on-chain, and failures here surface as `ChainError`.

pub mod memory;
pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
pub use memory::MemoryChain;
pub use rpc::{NodeClient, RpcContracts};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("contract not available: {0}")]
    Unavailable(String),
    #[error("node request failed: {0}")]
    Transport(String),
    #[error("node error: {0}")]
    Node(String),
    #[error("invalid node response: {0}")]
    InvalidResponse(String),
}

/// Confirmation of a submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// Exam metadata embedded in a certificate token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInfo {
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    /// Unix seconds.
    pub exam_date: i64,
    pub ip_address: String,
    /// Unix seconds.
    pub verification_time: i64,
}

/// Inputs for minting a certificate NFT.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCertificate {
    pub student_wallet: String,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub ip_address: String,
    pub token_uri: String,
}

/// Result of minting a student identity token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedId {
    pub tx_hash: String,
    pub token_id: u64,
}

/// Which key authorizes a state-mutating call.
#[derive(Debug, Clone)]
pub enum Signer {
    /// The backend's own key (admin operations, cheat marking).
    ServerKey(String),
    /// A user wallet the node holds a session for; calls are sent `from` it.
    UserWallet(String),
}

#[async_trait]
pub trait RegistrationRead: Send + Sync {
    async fn is_whitelisted(&self, wallet: &str) -> Result<bool, ChainError>;
    async fn whitelist_count(&self) -> Result<u64, ChainError>;
    async fn whitelisted_student(&self, index: u64) -> Result<String, ChainError>;
    async fn is_cheater(&self, wallet: &str) -> Result<bool, ChainError>;
}

#[async_trait]
pub trait RegistrationWrite: Send + Sync {
    async fn add_to_whitelist(&self, wallet: &str) -> Result<TxReceipt, ChainError>;
    async fn mark_cheating(&self, wallet: &str, reason: &str) -> Result<TxReceipt, ChainError>;
}

#[async_trait]
pub trait CertificateRead: Send + Sync {
    async fn total_certificates(&self) -> Result<u64, ChainError>;
    async fn owner_of(&self, token_id: u64) -> Result<String, ChainError>;
    async fn token_uri(&self, token_id: u64) -> Result<String, ChainError>;
    async fn exam_info(&self, token_id: u64) -> Result<ExamInfo, ChainError>;
    async fn is_valid(&self, token_id: u64) -> Result<bool, ChainError>;
    /// 0 means the wallet holds no certificate.
    async fn token_id_by_wallet(&self, wallet: &str) -> Result<u64, ChainError>;
}

#[async_trait]
pub trait CertificateWrite: Send + Sync {
    async fn mint_certificate(&self, mint: &MintCertificate) -> Result<TxReceipt, ChainError>;
}

#[async_trait]
pub trait IdentityRead: Send + Sync {
    /// 0 means the wallet holds no identity token.
    async fn token_id_by_wallet(&self, wallet: &str) -> Result<u64, ChainError>;
    async fn token_uri(&self, token_id: u64) -> Result<String, ChainError>;
}

#[async_trait]
pub trait IdentityWrite: Send + Sync {
    async fn mint_student_id(
        &self,
        wallet: &str,
        student_id: &str,
        metadata_uri: &str,
    ) -> Result<MintedId, ChainError>;
}

/// The full set of contract handles the handlers work against.
///
/// Write handles are pre-bound to the server signer at startup; handlers
/// relaying a user-signed call would bind a fresh handle via
/// `RpcContracts::with_user_signer`.
#[derive(Clone)]
pub struct Contracts {
    pub registration: Arc<dyn RegistrationRead>,
    pub registration_write: Arc<dyn RegistrationWrite>,
    pub certificates: Arc<dyn CertificateRead>,
    pub certificates_write: Arc<dyn CertificateWrite>,
    pub identity: Arc<dyn IdentityRead>,
    pub identity_write: Arc<dyn IdentityWrite>,
}

impl Contracts {
    /// Node-backed gateway with writes signed by the server key.
    pub fn rpc(config: &Config) -> Result<Self, ChainError> {
        let client = NodeClient::new(&config.rpc_url)?;
        let contracts = RpcContracts::new(
            client,
            &config.exam_registration_address,
            &config.exam_nft_registry_address,
            &config.student_id_nft_address,
        );
        let signed = contracts.with_server_signer(&config.private_key);

        Ok(Self {
            registration: Arc::new(contracts.clone()),
            registration_write: Arc::new(signed.clone()),
            certificates: Arc::new(contracts.clone()),
            certificates_write: Arc::new(signed.clone()),
            identity: Arc::new(contracts),
            identity_write: Arc::new(signed),
        })
    }

    /// In-process chain stub. Returns the shared handle so tests and the
    /// `RPC_URL=memory` development mode can seed and inspect state.
    pub fn memory() -> (Self, MemoryChain) {
        let chain = MemoryChain::new();
        let signed = chain.with_signer(Signer::ServerKey("memory".to_string()));

        let bundle = Self {
            registration: Arc::new(chain.clone()),
            registration_write: Arc::new(signed.clone()),
            certificates: Arc::new(chain.clone()),
            certificates_write: Arc::new(signed.clone()),
            identity: Arc::new(chain.clone()),
            identity_write: Arc::new(signed),
        };
        (bundle, chain)
    }
}
