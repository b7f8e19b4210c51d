// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    chain::Contracts,
    clients::{FaceClient, IpfsClient},
    error::AppError,
    models::roster::RosterAddressRequest,
    store::{RosterStore, roster::RosterError},
    utils::addr::is_wallet_address,
};

/// Enrolls a student: extracts a face embedding from the uploaded photo,
/// pins the identity metadata to IPFS, and mints their StudentID NFT.
pub async fn add_student(
    State(contracts): State<Contracts>,
    State(face): State<FaceClient>,
    State(ipfs): State<IpfsClient>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // The enrollment form carries studentId alongside the face fields.
    let mut student_id = None;
    let mut wallet_address = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::validation("Invalid multipart body", e.to_string())
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("studentId") => {
                student_id = Some(field.text().await.map_err(|e| {
                    AppError::validation("Invalid studentId field", e.to_string())
                })?);
            }
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

    let student_id = student_id.filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::validation("Missing studentId", "studentId field is required")
    })?;
    let wallet_address = wallet_address.filter(|w| !w.is_empty()).ok_or_else(|| {
        AppError::validation("Missing wallet address", "walletAddress field is required")
    })?;
    let image = image.filter(|i| !i.is_empty()).ok_or_else(|| {
        AppError::validation("No image provided", "Please upload an enrollment photo")
    })?;

    tracing::info!("Enrolling student {} ({})", student_id, wallet_address);

    let embedding = face.extract_embedding(image).await?;

    let metadata = json!({
        "name": "Student ID NFT",
        "description": "Student identity NFT for exam authentication",
        "studentId": student_id,
        "walletAddress": wallet_address,
        "faceEmbedding": embedding,
    });

    let metadata_uri = ipfs.pin_json(&metadata).await?;

    let minted = contracts
        .identity_write
        .mint_student_id(&wallet_address, &student_id, &metadata_uri)
        .await?;
    tracing::info!(
        "StudentID NFT minted for {}: token {} tx {}",
        wallet_address,
        minted.token_id,
        minted.tx_hash
    );

    Ok(Json(json!({
        "success": true,
        "txHash": minted.tx_hash,
        "metadataURI": metadata_uri,
        "tokenId": minted.token_id,
    })))
}

/// Current roster file contents.
pub async fn list_student_addresses(
    State(roster): State<RosterStore>,
) -> Result<impl IntoResponse, AppError> {
    let file = roster.load().await.map_err(roster_error)?;

    Ok(Json(json!({
        "success": true,
        "data": file,
    })))
}

/// Appends an address to the roster file.
pub async fn add_student_address(
    State(roster): State<RosterStore>,
    Json(payload): Json<RosterAddressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing student address",
            validation_errors.to_string(),
        ));
    }
    if !is_wallet_address(&payload.address) {
        return Err(AppError::validation(
            "Invalid student address",
            "address must be a 0x-prefixed 20-byte hex address",
        ));
    }

    let file = roster.add(&payload.address).await.map_err(roster_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Student address added",
        "data": file,
    })))
}

/// Removes an address from the roster file.
pub async fn remove_student_address(
    State(roster): State<RosterStore>,
    Json(payload): Json<RosterAddressRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing student address",
            validation_errors.to_string(),
        ));
    }

    let file = roster.remove(&payload.address).await.map_err(roster_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Student address removed",
        "data": file,
    })))
}

fn roster_error(err: RosterError) -> AppError {
    match err {
        RosterError::AlreadyListed => AppError::conflict(
            "Student address already listed",
            "This address is already in the student list",
        ),
        RosterError::NotListed => AppError::not_found(
            "Student address not listed",
            "This address is not in the student list",
        ),
        RosterError::Io(msg) => AppError::Internal(msg),
    }
}
