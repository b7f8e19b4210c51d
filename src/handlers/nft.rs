// src/handlers/nft.rs

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    chain::{ChainError, Contracts, MintCertificate},
    error::AppError,
    models::mint::{
        CompleteMintRequest, MintCertificateRequest, MintRecord, MintStatus, NftMetadata,
        PendingMintRequest, RevokeRequest, WhitelistAddRequest,
    },
    store::{MintQueue, mint::NewPendingMint},
    utils::{net::client_ip, token::random_hex},
};

/// Queues a student for certificate minting after they finish an exam.
pub async fn add_pending_mint(
    State(queue): State<MintQueue>,
    headers: HeaderMap,
    Json(payload): Json<PendingMintRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing required fields",
            validation_errors.to_string(),
        ));
    }

    let ip_address = payload.ip_address.unwrap_or_else(|| client_ip(&headers));
    let (student, total_pending) = queue
        .add_pending(NewPendingMint {
            student_wallet: payload.student_wallet,
            student_id: payload.student_id,
            subject: payload.subject,
            exam_session: payload.exam_session,
            score: payload.score.unwrap_or(0),
            exam_date: payload.exam_date.unwrap_or_else(Utc::now),
            ip_address,
        })
        .await
        .map_err(|_| {
            AppError::conflict(
                "Student already in pending list",
                "This student is already waiting for NFT mint",
            )
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Student added to pending mint list",
        "data": {
            "student": student,
            "totalPending": total_pending,
        }
    })))
}

/// Students awaiting a mint: chain-derived list merged with the in-memory
/// queue. A chain read failure downgrades silently to memory-only.
pub async fn list_pending_mint(
    State(queue): State<MintQueue>,
    State(contracts): State<Contracts>,
) -> Result<impl IntoResponse, AppError> {
    let chain_pending = match pending_from_chain(&contracts).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Using in-memory pending students due to chain error: {}", e);
            Vec::new()
        }
    };

    let source = if chain_pending.is_empty() { "memory" } else { "blockchain" };
    let mut all = chain_pending;
    all.extend(queue.pending().await);

    Ok(Json(json!({
        "success": true,
        "data": {
            "pendingStudents": all,
            "totalPending": all.len(),
            "source": source,
        }
    })))
}

/// Moves a student from pending to completed once the admin has minted.
pub async fn complete_mint(
    State(queue): State<MintQueue>,
    Path(student_wallet): Path<String>,
    Json(payload): Json<CompleteMintRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (student, total_pending, total_completed) = queue
        .complete(&student_wallet, payload.token_id, payload.mint_date)
        .await
        .map_err(|_| {
            AppError::not_found(
                "Student not found in pending list",
                "This student is not in the pending mint list",
            )
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Student moved to completed mint list",
        "data": {
            "student": student,
            "totalPending": total_pending,
            "totalCompleted": total_completed,
        }
    })))
}

/// Minted certificates: chain state merged with the in-memory completed
/// list, same fallback policy as the pending read.
pub async fn list_completed_mint(
    State(queue): State<MintQueue>,
    State(contracts): State<Contracts>,
) -> Result<impl IntoResponse, AppError> {
    let chain_completed = match completed_from_chain(&contracts).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Using in-memory completed students due to chain error: {}", e);
            Vec::new()
        }
    };

    let source = if chain_completed.is_empty() { "memory" } else { "blockchain" };
    let mut all = chain_completed;
    all.extend(
        queue
            .completed()
            .await
            .into_iter()
            .map(|r| serde_json::to_value(r).unwrap_or(Value::Null)),
    );

    Ok(Json(json!({
        "success": true,
        "data": {
            "completedStudents": all,
            "totalCompleted": all.len(),
            "source": source,
        }
    })))
}

/// Mints a certificate NFT with the server signer.
pub async fn mint(
    State(contracts): State<Contracts>,
    headers: HeaderMap,
    Json(payload): Json<MintCertificateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing required fields",
            validation_errors.to_string(),
        ));
    }

    let existing = contracts
        .certificates
        .token_id_by_wallet(&payload.student_wallet)
        .await?;
    if existing > 0 {
        return Err(AppError::conflict(
            "NFT certificate already exists",
            "Student already has an NFT certificate",
        ));
    }

    let whitelisted = contracts
        .registration
        .is_whitelisted(&payload.student_wallet)
        .await?;
    if !whitelisted {
        return Err(AppError::conflict(
            "Student not whitelisted",
            "Student is not in the whitelist",
        ));
    }

    let exam_date = payload.exam_date.unwrap_or_else(Utc::now);
    let verification_time = payload.verification_time.unwrap_or_else(Utc::now);
    let ip_address = payload.ip_address.unwrap_or_else(|| client_ip(&headers));
    let image_hash = payload.image_hash.unwrap_or_else(|| random_hex(32));

    let metadata = NftMetadata::for_exam(
        &payload.student_id,
        &payload.subject,
        &payload.exam_session,
        exam_date,
        verification_time,
        &ip_address,
        &image_hash,
    );
    let token_uri = format!("https://ipfs.io/ipfs/{}", image_hash);

    tracing::info!("Minting certificate NFT for {}", payload.student_wallet);
    let receipt = contracts
        .certificates_write
        .mint_certificate(&MintCertificate {
            student_wallet: payload.student_wallet.clone(),
            student_id: payload.student_id,
            subject: payload.subject,
            exam_session: payload.exam_session,
            ip_address,
            token_uri,
        })
        .await?;

    let token_id = contracts.certificates.total_certificates().await?;

    Ok(Json(json!({
        "success": true,
        "message": "NFT certificate minted successfully on blockchain",
        "data": {
            "tokenId": token_id.to_string(),
            "studentWallet": payload.student_wallet,
            "transactionHash": receipt.tx_hash,
            "metadata": metadata,
            "mintDate": Utc::now(),
        }
    })))
}

/// Every certificate on chain; unreadable tokens are skipped with a warning.
pub async fn certificates(
    State(contracts): State<Contracts>,
) -> Result<impl IntoResponse, AppError> {
    let total = contracts.certificates.total_certificates().await?;
    let mut certificates = Vec::new();

    for token_id in 1..=total {
        match read_certificate(&contracts, token_id).await {
            Ok(cert) => certificates.push(cert),
            Err(e) => tracing::warn!("Error reading certificate {}: {}", token_id, e),
        }
    }

    let valid = certificates
        .iter()
        .filter(|c| c["isValid"] == json!(true))
        .count();

    Ok(Json(json!({
        "success": true,
        "data": {
            "certificates": certificates,
            "totalCertificates": certificates.len(),
            "validCertificates": valid,
            "revokedCertificates": certificates.len() - valid,
        }
    })))
}

/// Token existence check plus its URI.
pub async fn metadata(
    State(contracts): State<Contracts>,
    Path(token_id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let lookup = async {
        let owner = contracts.certificates.owner_of(token_id).await?;
        let token_uri = contracts.certificates.token_uri(token_id).await?;
        Ok::<_, ChainError>((owner, token_uri))
    };

    let (owner, token_uri) = lookup.await.map_err(|_| {
        AppError::not_found(
            "NFT certificate not found",
            "No NFT certificate found with this token ID",
        )
    })?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "tokenId": token_id.to_string(),
            "owner": owner,
            "tokenURI": token_uri,
            "isValid": true,
            "mintDate": Utc::now(),
        }
    })))
}

/// Marks an off-chain mint record revoked. The token itself stays on chain.
pub async fn revoke(
    State(queue): State<MintQueue>,
    Path(token_id): Path<String>,
    Json(payload): Json<RevokeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let reason = payload.reason.unwrap_or_else(|| "Admin revocation".to_string());
    let record = queue.revoke(&token_id, &reason).await.map_err(|_| {
        AppError::not_found(
            "NFT certificate not found",
            "No NFT certificate found with this token ID",
        )
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "NFT certificate revoked successfully (in-memory)",
        "data": {
            "tokenId": token_id,
            "revocationDate": record.revocation_date,
            "revocationReason": record.revocation_reason,
        }
    })))
}

/// Adds a wallet to the on-chain whitelist (server signer).
pub async fn whitelist_add(
    State(contracts): State<Contracts>,
    Json(payload): Json<WhitelistAddRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::validation(
            "Missing student address",
            validation_errors.to_string(),
        ));
    }

    let already = contracts
        .registration
        .is_whitelisted(&payload.student_address)
        .await?;
    if already {
        return Err(AppError::conflict(
            "Student already whitelisted",
            "This student is already in the whitelist",
        ));
    }

    tracing::info!("Adding student to whitelist: {}", payload.student_address);
    let receipt = contracts
        .registration_write
        .add_to_whitelist(&payload.student_address)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Student added to whitelist successfully on blockchain",
        "data": {
            "studentAddress": payload.student_address,
            "transactionHash": receipt.tx_hash,
            "addedAt": Utc::now(),
        }
    })))
}

pub async fn whitelist_status(
    State(contracts): State<Contracts>,
    Path(student_address): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let is_whitelisted = contracts
        .registration
        .is_whitelisted(&student_address)
        .await?;
    let whitelist_count = contracts.registration.whitelist_count().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "studentAddress": student_address,
            "isWhitelisted": is_whitelisted,
            "whitelistCount": whitelist_count.to_string(),
            "checkedAt": Utc::now(),
        }
    })))
}

/// Whitelisted students that do not hold a certificate yet.
///
/// Per-student read failures are logged and skipped so one bad entry does
/// not hide the rest.
async fn pending_from_chain(contracts: &Contracts) -> Result<Vec<MintRecord>, ChainError> {
    let count = contracts.registration.whitelist_count().await?;
    let mut pending = Vec::new();

    for index in 0..count {
        let result = async {
            let wallet = contracts.registration.whitelisted_student(index).await?;
            if !contracts.registration.is_whitelisted(&wallet).await? {
                return Ok::<_, ChainError>(None);
            }
            let token_id = contracts.certificates.token_id_by_wallet(&wallet).await?;
            Ok((token_id == 0).then_some(wallet))
        }
        .await;

        match result {
            Ok(Some(wallet)) => pending.push(MintRecord {
                student_wallet: wallet,
                // Registration details are not stored on the whitelist; the
                // placeholders match what the admin dashboard expects.
                student_id: format!("STU{}", index + 1),
                subject: "Blockchain Exam".to_string(),
                exam_session: "2024".to_string(),
                score: 0,
                exam_date: Utc::now(),
                ip_address: "Unknown".to_string(),
                status: MintStatus::Pending,
                added_at: Utc::now(),
                token_id: None,
                mint_date: None,
                is_valid: true,
                revocation_date: None,
                revocation_reason: None,
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!("Error reading whitelist entry {}: {}", index, e),
        }
    }

    Ok(pending)
}

/// Valid certificates on chain, shaped like completed mint records.
async fn completed_from_chain(contracts: &Contracts) -> Result<Vec<Value>, ChainError> {
    let total = contracts.certificates.total_certificates().await?;
    let mut completed = Vec::new();

    for token_id in 1..=total {
        let result = async {
            let owner = contracts.certificates.owner_of(token_id).await?;
            let token_uri = contracts.certificates.token_uri(token_id).await?;
            let info = contracts.certificates.exam_info(token_id).await?;
            let valid = contracts.certificates.is_valid(token_id).await?;
            Ok::<_, ChainError>((owner, token_uri, info, valid))
        }
        .await;

        match result {
            Ok((owner, token_uri, info, true)) => completed.push(json!({
                "tokenId": token_id.to_string(),
                "studentWallet": owner,
                "studentId": info.student_id,
                "subject": info.subject,
                "examSession": info.exam_session,
                "examDate": unix_to_datetime(info.exam_date),
                "ipAddress": info.ip_address,
                "mintDate": unix_to_datetime(info.verification_time),
                "status": "completed",
                "tokenURI": token_uri,
            })),
            Ok(_) => {}
            Err(e) => tracing::warn!("Error reading certificate {}: {}", token_id, e),
        }
    }

    Ok(completed)
}

async fn read_certificate(contracts: &Contracts, token_id: u64) -> Result<Value, ChainError> {
    let owner = contracts.certificates.owner_of(token_id).await?;
    let token_uri = contracts.certificates.token_uri(token_id).await?;
    let info = contracts.certificates.exam_info(token_id).await?;
    let valid = contracts.certificates.is_valid(token_id).await?;

    Ok(json!({
        "tokenId": token_id.to_string(),
        "owner": owner,
        "tokenURI": token_uri,
        "studentId": info.student_id,
        "subject": info.subject,
        "examSession": info.exam_session,
        "isValid": valid,
        "mintDate": unix_to_datetime(info.verification_time),
    }))
}

fn unix_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}
