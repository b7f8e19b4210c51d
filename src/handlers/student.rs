// src/handlers/student.rs

use axum::{
    Json,
    extract::{Multipart, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    chain::Contracts,
    clients::{FaceClient, IpfsClient},
    error::AppError,
};

/// Verifies a student's identity against their StudentID NFT.
///
/// Pulls the reference embedding out of the NFT metadata, extracts one from
/// the uploaded image, and lets the AI service decide the match.
pub async fn verify(
    State(contracts): State<Contracts>,
    State(face): State<FaceClient>,
    State(ipfs): State<IpfsClient>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = read_face_upload(multipart).await?;

    let token_id = contracts
        .identity
        .token_id_by_wallet(&upload.wallet_address)
        .await?;
    if token_id == 0 {
        return Err(AppError::not_found(
            "Student ID NFT not found",
            "No identity NFT is associated with this wallet",
        ));
    }

    let metadata_uri = contracts.identity.token_uri(token_id).await?;
    let metadata = ipfs.fetch_json(&metadata_uri).await?;

    let reference: Vec<f64> = metadata
        .get("faceEmbedding")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .ok_or_else(|| {
            AppError::validation(
                "No face embedding in NFT",
                "The identity NFT metadata does not contain a face embedding",
            )
        })?;

    let current = face.extract_embedding(upload.image).await?;
    let matched = face.compare(&reference, &current).await?;

    if matched {
        Ok(Json(json!({ "success": true, "verified": true })))
    } else {
        Ok(Json(json!({
            "success": true,
            "verified": false,
            "reason": "Face does not match NFT",
        })))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdNftQuery {
    pub wallet_address: String,
}

/// Looks up the student id recorded in the wallet's StudentID NFT metadata.
pub async fn id_nft(
    State(contracts): State<Contracts>,
    State(ipfs): State<IpfsClient>,
    Query(query): Query<IdNftQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.wallet_address.is_empty() {
        return Err(AppError::validation(
            "Missing walletAddress",
            "walletAddress query parameter is required",
        ));
    }

    let not_found =
        || AppError::not_found("Not found", "No student id recorded for this wallet");

    let token_id = contracts
        .identity
        .token_id_by_wallet(&query.wallet_address)
        .await
        .map_err(|_| not_found())?;
    if token_id == 0 {
        return Err(not_found());
    }

    let metadata_uri = contracts
        .identity
        .token_uri(token_id)
        .await
        .map_err(|_| not_found())?;
    let metadata = ipfs.fetch_json(&metadata_uri).await.map_err(|_| not_found())?;

    match metadata.get("studentId").and_then(|v| v.as_str()) {
        Some(student_id) => Ok(Json(json!({ "studentId": student_id }))),
        None => Err(not_found()),
    }
}

pub struct FaceUpload {
    pub wallet_address: String,
    pub image: Vec<u8>,
}

/// Pulls the wallet address and face image out of a multipart form.
/// Shared with the admin enrollment handler.
pub async fn read_face_upload(mut multipart: Multipart) -> Result<FaceUpload, AppError> {
    let mut wallet_address = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::validation("Invalid multipart body", e.to_string())
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("walletAddress") => {
                wallet_address = Some(field.text().await.map_err(|e| {
                    AppError::validation("Invalid walletAddress field", e.to_string())
                })?);
            }
            Some("face") | Some("image") => {
                image = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            AppError::validation("Invalid image field", e.to_string())
                        })?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let wallet_address = wallet_address.filter(|w| !w.is_empty()).ok_or_else(|| {
        AppError::validation("Missing wallet address", "walletAddress field is required")
    })?;
    let image = image.filter(|i| !i.is_empty()).ok_or_else(|| {
        AppError::validation("No image provided", "Please upload a verification image")
    })?;

    Ok(FaceUpload {
        wallet_address,
        image,
    })
}
