// src/clients/ipfs.rs

use serde::Deserialize;

use super::ClientError;

const PINATA_PIN_URL: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";

/// Pins metadata JSON through Pinata and resolves `ipfs://` URIs through the
/// configured gateway.
#[derive(Clone)]
pub struct IpfsClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    gateway_url: String,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl IpfsClient {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        gateway_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            gateway_url: gateway_url.into(),
        }
    }

    /// Pins a JSON document, returning its `ipfs://` URI.
    pub async fn pin_json(&self, value: &serde_json::Value) -> Result<String, ClientError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(ClientError::Service(
                "Pinata credentials are not configured".to_string(),
            ));
        }

        let response = self
            .http
            .post(PINATA_PIN_URL)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.api_secret)
            .json(value)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Service(format!(
                "Pinata upload failed: HTTP {}",
                response.status()
            )));
        }

        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(format!("ipfs://{}", body.ipfs_hash))
    }

    /// Fetches a metadata document by URI, rewriting `ipfs://` onto the
    /// gateway.
    pub async fn fetch_json(&self, uri: &str) -> Result<serde_json::Value, ClientError> {
        let url = self.resolve(uri);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Service(format!(
                "metadata fetch failed: HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    fn resolve(&self, uri: &str) -> String {
        match uri.strip_prefix("ipfs://") {
            Some(hash) => format!("{}{}", self.gateway_url, hash),
            None => uri.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipfs_uris_resolve_through_gateway() {
        let client = IpfsClient::new("k", "s", "https://gateway.pinata.cloud/ipfs/");
        assert_eq!(
            client.resolve("ipfs://QmHash"),
            "https://gateway.pinata.cloud/ipfs/QmHash"
        );
        assert_eq!(client.resolve("https://x/y.json"), "https://x/y.json");
    }

    #[tokio::test]
    async fn pin_requires_credentials() {
        let client = IpfsClient::new("", "", "https://gateway.pinata.cloud/ipfs/");
        let err = client.pin_json(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ClientError::Service(_)));
    }
}
