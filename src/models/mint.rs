// src/models/mint.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintStatus {
    Pending,
    Completed,
}

/// A student waiting for (or holding) a certificate NFT.
///
/// Records start on the pending list and move to the completed list when an
/// admin triggers the mint; `token_id` and `mint_date` are attached at that
/// point. Revocation only flips `is_valid` and stamps the reason.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    pub student_wallet: String,
    pub student_id: String,
    pub subject: String,
    pub exam_session: String,
    pub score: i64,
    pub exam_date: DateTime<Utc>,
    pub ip_address: String,
    pub status: MintStatus,
    pub added_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_date: Option<DateTime<Utc>>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PendingMintRequest {
    #[validate(length(min = 1, message = "studentWallet is required"))]
    pub student_wallet: String,
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "examSession is required"))]
    pub exam_session: String,
    pub score: Option<i64>,
    pub exam_date: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompleteMintRequest {
    pub token_id: Option<String>,
    pub mint_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct MintCertificateRequest {
    #[validate(length(min = 1, message = "studentWallet is required"))]
    pub student_wallet: String,
    #[validate(length(min = 1, message = "studentId is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "examSession is required"))]
    pub exam_session: String,
    pub exam_date: Option<DateTime<Utc>>,
    pub verification_time: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub image_hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevokeRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct WhitelistAddRequest {
    #[validate(length(min = 1, message = "studentAddress is required"))]
    pub student_address: String,
}

/// ERC-721 style metadata document embedded in the certificate.
/// Field names follow the marketplace metadata convention, hence no
/// camel-casing here.
#[derive(Debug, Clone, Serialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<MetadataAttribute>,
    pub external_url: String,
    pub background_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

impl NftMetadata {
    pub fn for_exam(
        student_id: &str,
        subject: &str,
        exam_session: &str,
        exam_date: DateTime<Utc>,
        verification_time: DateTime<Utc>,
        ip_address: &str,
        image_hash: &str,
    ) -> Self {
        let attr = |trait_type: &str, value: serde_json::Value| MetadataAttribute {
            trait_type: trait_type.to_string(),
            value,
        };
        Self {
            name: format!("Exam Certificate - {}", student_id),
            description: format!("Certificate for {} exam", subject),
            image: format!("https://ipfs.io/ipfs/{}", image_hash),
            attributes: vec![
                attr("Student ID", json!(student_id)),
                attr("Subject", json!(subject)),
                attr("Exam Session", json!(exam_session)),
                attr("Exam Date", json!(exam_date.format("%Y-%m-%d").to_string())),
                attr("Verification Time", json!(verification_time.to_rfc3339())),
                attr("IP Address", json!(ip_address)),
                attr(
                    "Certificate Type",
                    json!("Blockchain Exam Authentication"),
                ),
            ],
            external_url: "https://blockchain-exam-auth.com".to_string(),
            background_color: "000000".to_string(),
        }
    }
}
