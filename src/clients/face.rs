// src/clients/face.rs

use serde::Deserialize;
use serde_json::json;

use super::ClientError;

/// Client for the external face-embedding service.
///
/// The service owns the matching decision entirely; this side only ships
/// images and embeddings and reads the boolean back.
#[derive(Clone)]
pub struct FaceClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(rename = "match")]
    is_match: bool,
}

impl FaceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Extracts a face embedding from raw image bytes.
    pub async fn extract_embedding(&self, image: Vec<u8>) -> Result<Vec<f64>, ClientError> {
        let part = reqwest::multipart::Part::bytes(image).file_name("face.jpg");
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(format!("{}/extract-embedding", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Service(format!(
                "AI service returned HTTP {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(body.embedding)
    }

    /// Asks the service whether two embeddings belong to the same face.
    pub async fn compare(&self, reference: &[f64], current: &[f64]) -> Result<bool, ClientError> {
        let response = self
            .http
            .post(format!("{}/compare-embedding", self.base_url))
            .json(&json!({
                "embedding1": reference,
                "embedding2": current,
            }))
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Service(format!(
                "AI service returned HTTP {}",
                response.status()
            )));
        }

        let body: CompareResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(body.is_match)
    }
}
