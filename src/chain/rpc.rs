// src/chain/rpc.rs

//! JSON-RPC contract gateway.
//!
//! The node runs the contract library client and exposes the contract entry
//! points as named actions; this side sends `{action, contract, ...params}`
//! and reads the `result` field back. ABI encoding stays node-side. Write
//! actions additionally carry the signer context and resolve once the node
//! reports the transaction receipt, so confirmation latency is the await.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{
    CertificateRead, CertificateWrite, ChainError, ExamInfo, IdentityRead, IdentityWrite,
    MintCertificate, MintedId, RegistrationRead, RegistrationWrite, Signer, TxReceipt,
};

/// HTTP client for the node's RPC endpoint.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    node_url: String,
}

impl NodeClient {
    pub fn new(node_url: impl Into<String>) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Send one action and return the `result` field.
    async fn rpc_call(&self, action: &str, params: Value) -> Result<Value, ChainError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| ChainError::InvalidResponse("params must be a JSON object".into()))?
            .insert("action".to_string(), json!(action));

        let response = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ChainError::Node(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
            return Err(ChainError::Node(err.to_string()));
        }

        Ok(json.get("result").cloned().unwrap_or(json))
    }
}

/// Read-side handles for all three contracts; no signer involved.
#[derive(Clone)]
pub struct RpcContracts {
    client: NodeClient,
    registration_address: String,
    certificate_address: String,
    identity_address: String,
}

impl RpcContracts {
    pub fn new(
        client: NodeClient,
        registration_address: &str,
        certificate_address: &str,
        identity_address: &str,
    ) -> Self {
        Self {
            client,
            registration_address: registration_address.to_string(),
            certificate_address: certificate_address.to_string(),
            identity_address: identity_address.to_string(),
        }
    }

    /// Write interface authorized by the backend's own key.
    pub fn with_server_signer(&self, private_key: &str) -> SignedRpcContracts {
        SignedRpcContracts {
            contracts: self.clone(),
            signer: Signer::ServerKey(private_key.to_string()),
        }
    }

    /// Write interface sending calls from a user wallet the node manages.
    pub fn with_user_signer(&self, wallet: &str) -> SignedRpcContracts {
        SignedRpcContracts {
            contracts: self.clone(),
            signer: Signer::UserWallet(wallet.to_string()),
        }
    }

    async fn read(&self, contract: &str, action: &str, params: Value) -> Result<Value, ChainError> {
        let mut body = params;
        body.as_object_mut()
            .ok_or_else(|| ChainError::InvalidResponse("params must be a JSON object".into()))?
            .insert("contract".to_string(), json!(contract));
        self.client.rpc_call(action, body).await
    }
}

fn as_bool(value: Value, action: &str) -> Result<bool, ChainError> {
    value
        .as_bool()
        .ok_or_else(|| ChainError::InvalidResponse(format!("{action}: expected bool")))
}

fn as_u64(value: Value, action: &str) -> Result<u64, ChainError> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| ChainError::InvalidResponse(format!("{action}: expected integer")))
}

fn as_string(value: Value, action: &str) -> Result<String, ChainError> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ChainError::InvalidResponse(format!("{action}: expected string")))
}

#[async_trait]
impl RegistrationRead for RpcContracts {
    async fn is_whitelisted(&self, wallet: &str) -> Result<bool, ChainError> {
        let result = self
            .read(
                &self.registration_address,
                "isStudentWhitelisted",
                json!({ "student": wallet }),
            )
            .await?;
        as_bool(result, "isStudentWhitelisted")
    }

    async fn whitelist_count(&self) -> Result<u64, ChainError> {
        let result = self
            .read(&self.registration_address, "whitelistCount", json!({}))
            .await?;
        as_u64(result, "whitelistCount")
    }

    async fn whitelisted_student(&self, index: u64) -> Result<String, ChainError> {
        let result = self
            .read(
                &self.registration_address,
                "whitelistedStudents",
                json!({ "index": index }),
            )
            .await?;
        as_string(result, "whitelistedStudents")
    }

    async fn is_cheater(&self, wallet: &str) -> Result<bool, ChainError> {
        let result = self
            .read(
                &self.registration_address,
                "isStudentCheater",
                json!({ "student": wallet }),
            )
            .await?;
        as_bool(result, "isStudentCheater")
    }
}

#[async_trait]
impl CertificateRead for RpcContracts {
    async fn total_certificates(&self) -> Result<u64, ChainError> {
        let result = self
            .read(&self.certificate_address, "getTotalCertificates", json!({}))
            .await?;
        as_u64(result, "getTotalCertificates")
    }

    async fn owner_of(&self, token_id: u64) -> Result<String, ChainError> {
        let result = self
            .read(
                &self.certificate_address,
                "ownerOf",
                json!({ "tokenId": token_id }),
            )
            .await?;
        as_string(result, "ownerOf")
    }

    async fn token_uri(&self, token_id: u64) -> Result<String, ChainError> {
        let result = self
            .read(
                &self.certificate_address,
                "tokenURI",
                json!({ "tokenId": token_id }),
            )
            .await?;
        as_string(result, "tokenURI")
    }

    async fn exam_info(&self, token_id: u64) -> Result<ExamInfo, ChainError> {
        let result = self
            .read(
                &self.certificate_address,
                "getExamInfo",
                json!({ "tokenId": token_id }),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("getExamInfo: {e}")))
    }

    async fn is_valid(&self, token_id: u64) -> Result<bool, ChainError> {
        let result = self
            .read(
                &self.certificate_address,
                "isCertificateValid",
                json!({ "tokenId": token_id }),
            )
            .await?;
        as_bool(result, "isCertificateValid")
    }

    async fn token_id_by_wallet(&self, wallet: &str) -> Result<u64, ChainError> {
        let result = self
            .read(
                &self.certificate_address,
                "getTokenIdByWallet",
                json!({ "wallet": wallet }),
            )
            .await?;
        as_u64(result, "getTokenIdByWallet")
    }
}

#[async_trait]
impl IdentityRead for RpcContracts {
    async fn token_id_by_wallet(&self, wallet: &str) -> Result<u64, ChainError> {
        let result = self
            .read(
                &self.identity_address,
                "getTokenIdByWallet",
                json!({ "wallet": wallet }),
            )
            .await?;
        as_u64(result, "getTokenIdByWallet")
    }

    async fn token_uri(&self, token_id: u64) -> Result<String, ChainError> {
        let result = self
            .read(
                &self.identity_address,
                "tokenURI",
                json!({ "tokenId": token_id }),
            )
            .await?;
        as_string(result, "tokenURI")
    }
}

/// Write-side handles: the same contracts bound to a signer context.
#[derive(Clone)]
pub struct SignedRpcContracts {
    contracts: RpcContracts,
    signer: Signer,
}

impl SignedRpcContracts {
    async fn write(
        &self,
        contract: &str,
        action: &str,
        params: Value,
    ) -> Result<Value, ChainError> {
        let mut body = params;
        let object = body
            .as_object_mut()
            .ok_or_else(|| ChainError::InvalidResponse("params must be a JSON object".into()))?;
        object.insert("contract".to_string(), json!(contract));
        match &self.signer {
            Signer::ServerKey(key) => object.insert("key".to_string(), json!(key)),
            Signer::UserWallet(wallet) => object.insert("from".to_string(), json!(wallet)),
        };
        self.contracts.client.rpc_call(action, body).await
    }

    fn receipt(value: Value, action: &str) -> Result<TxReceipt, ChainError> {
        serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("{action}: {e}")))
    }
}

#[async_trait]
impl RegistrationWrite for SignedRpcContracts {
    async fn add_to_whitelist(&self, wallet: &str) -> Result<TxReceipt, ChainError> {
        let result = self
            .write(
                &self.contracts.registration_address,
                "addStudentToWhitelist",
                json!({ "student": wallet }),
            )
            .await?;
        Self::receipt(result, "addStudentToWhitelist")
    }

    async fn mark_cheating(&self, wallet: &str, reason: &str) -> Result<TxReceipt, ChainError> {
        let result = self
            .write(
                &self.contracts.registration_address,
                "markCheating",
                json!({ "student": wallet, "reason": reason }),
            )
            .await?;
        Self::receipt(result, "markCheating")
    }
}

#[async_trait]
impl CertificateWrite for SignedRpcContracts {
    async fn mint_certificate(&self, mint: &MintCertificate) -> Result<TxReceipt, ChainError> {
        let params = serde_json::to_value(mint)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        let result = self
            .write(
                &self.contracts.certificate_address,
                "mintCertificate",
                params,
            )
            .await?;
        Self::receipt(result, "mintCertificate")
    }
}

#[async_trait]
impl IdentityWrite for SignedRpcContracts {
    async fn mint_student_id(
        &self,
        wallet: &str,
        student_id: &str,
        metadata_uri: &str,
    ) -> Result<MintedId, ChainError> {
        let result = self
            .write(
                &self.contracts.identity_address,
                "mintStudentID",
                json!({
                    "wallet": wallet,
                    "studentId": student_id,
                    "metadataURI": metadata_uri,
                }),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("mintStudentID: {e}")))
    }
}
