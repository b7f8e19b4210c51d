// tests/nft_tests.rs

use examchain_backend::chain::{Contracts, ExamInfo, MemoryChain, MintCertificate};
use examchain_backend::clients::{FaceClient, IpfsClient};
use examchain_backend::config::Config;
use examchain_backend::routes;
use examchain_backend::state::AppState;
use examchain_backend::store::{MintQueue, NonceStore, RosterStore, SessionTracker};

async fn spawn_app() -> (String, MemoryChain) {
    let roster_path = std::env::temp_dir().join(format!(
        "student-addresses-{}.json",
        uuid::Uuid::new_v4()
    ));

    let config = Config {
        port: 0,
        rpc_url: "memory".to_string(),
        private_key: "test_key".to_string(),
        exam_registration_address: "0x7485b0810293AA7584b8A697e133A4F8785510fC".to_string(),
        exam_nft_registry_address: "0x11C8F8E97F0Ff1741Bf9B565BeDA91740cd8a8E7".to_string(),
        student_id_nft_address: String::new(),
        pinata_api_key: String::new(),
        pinata_api_secret: String::new(),
        ai_service_url: "http://127.0.0.1:1".to_string(),
        ipfs_gateway_url: "https://gateway.pinata.cloud/ipfs/".to_string(),
        student_addresses_path: roster_path.to_string_lossy().to_string(),
        rust_log: "error".to_string(),
    };

    let (contracts, chain) = Contracts::memory();

    let state = AppState {
        nonces: NonceStore::new(),
        sessions: SessionTracker::new(),
        mints: MintQueue::new(),
        roster: RosterStore::new(roster_path),
        face: FaceClient::new(&config.ai_service_url),
        ipfs: IpfsClient::new(
            &config.pinata_api_key,
            &config.pinata_api_secret,
            &config.ipfs_gateway_url,
        ),
        contracts,
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, chain)
}

fn wallet(tail: u8) -> String {
    format!("0xDeF00000000000000000000000000000000000{:02x}", tail)
}

fn pending_body(wallet: &str) -> serde_json::Value {
    serde_json::json!({
        "studentWallet": wallet,
        "studentId": "SV10",
        "subject": "Math",
        "examSession": "S1",
        "score": 8,
    })
}

#[tokio::test]
async fn pending_mint_lifecycle() {
    let (address, _chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let wallet = wallet(1);

    // 1. Queue the student
    let added: serde_json::Value = client
        .post(format!("{}/api/nft/pending-mint", address))
        .json(&pending_body(&wallet))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(added["data"]["totalPending"], 1);

    // 2. Case-insensitive duplicate is rejected
    let dup = client
        .post(format!("{}/api/nft/pending-mint", address))
        .json(&pending_body(&wallet.to_lowercase()))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status().as_u16(), 400);

    // 3. The queue lists them, memory-sourced
    let pending: serde_json::Value = client
        .get(format!("{}/api/nft/pending-mint", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending["data"]["totalPending"], 1);
    assert_eq!(pending["data"]["source"], "memory");

    // 4. Completing an unknown wallet is a 404
    let missing = client
        .post(format!(
            "{}/api/nft/complete-mint/{}",
            address,
            wallet.replace("01", "99")
        ))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    // 5. Complete the mint (case-folded wallet)
    let completed: serde_json::Value = client
        .post(format!(
            "{}/api/nft/complete-mint/{}",
            address,
            wallet.to_lowercase()
        ))
        .json(&serde_json::json!({ "tokenId": "7" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed["data"]["student"]["tokenId"], "7");
    assert_eq!(completed["data"]["totalPending"], 0);
    assert_eq!(completed["data"]["totalCompleted"], 1);

    // 6. Moved out of pending, into completed, exactly once
    let pending: serde_json::Value = client
        .get(format!("{}/api/nft/pending-mint", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending["data"]["totalPending"], 0);

    let completed: serde_json::Value = client
        .get(format!("{}/api/nft/completed-mint", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed["data"]["totalCompleted"], 1);

    // 7. Completing again fails: no longer pending
    let again = client
        .post(format!("{}/api/nft/complete-mint/{}", address, wallet))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);
}

#[tokio::test]
async fn pending_mint_merges_chain_derived_students() {
    let (address, chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let whitelisted = wallet(2);

    // Whitelisted on-chain, no certificate yet -> appears as chain-sourced.
    chain.seed_whitelisted(&whitelisted).await;

    let pending: serde_json::Value = client
        .get(format!("{}/api/nft/pending-mint", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending["data"]["source"], "blockchain");
    assert_eq!(
        pending["data"]["pendingStudents"][0]["studentWallet"],
        whitelisted.as_str()
    );
}

#[tokio::test]
async fn mint_enforces_whitelist_and_uniqueness() {
    let (address, chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let wallet = wallet(3);

    let mint_body = serde_json::json!({
        "studentWallet": wallet,
        "studentId": "SV11",
        "subject": "Math",
        "examSession": "S1",
    });

    // Not whitelisted yet
    let rejected = client
        .post(format!("{}/api/nft/mint", address))
        .json(&mint_body)
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status().as_u16(), 400);
    let rejected_body: serde_json::Value = rejected.json().await.unwrap();
    assert_eq!(rejected_body["error"], "Student not whitelisted");

    chain.seed_whitelisted(&wallet).await;

    // Mints once
    let minted: serde_json::Value = client
        .post(format!("{}/api/nft/mint", address))
        .json(&mint_body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(minted["data"]["tokenId"], "1");
    assert!(minted["data"]["transactionHash"].is_string());

    // The wallet now holds a certificate
    let dup = client
        .post(format!("{}/api/nft/mint", address))
        .json(&mint_body)
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status().as_u16(), 400);
    let dup_body: serde_json::Value = dup.json().await.unwrap();
    assert_eq!(dup_body["error"], "NFT certificate already exists");
}

#[tokio::test]
async fn certificates_and_metadata_reads() {
    let (address, chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = wallet(4);

    let now = chrono::Utc::now().timestamp();
    chain
        .seed_certificate(
            &MintCertificate {
                student_wallet: owner.clone(),
                student_id: "SV12".to_string(),
                subject: "History".to_string(),
                exam_session: "S2".to_string(),
                ip_address: "127.0.0.1".to_string(),
                token_uri: "ipfs://QmSeed".to_string(),
            },
            ExamInfo {
                student_id: "SV12".to_string(),
                subject: "History".to_string(),
                exam_session: "S2".to_string(),
                exam_date: now,
                ip_address: "127.0.0.1".to_string(),
                verification_time: now,
            },
        )
        .await;

    let certs: serde_json::Value = client
        .get(format!("{}/api/nft/certificates", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(certs["data"]["totalCertificates"], 1);
    assert_eq!(certs["data"]["validCertificates"], 1);
    assert_eq!(certs["data"]["certificates"][0]["owner"], owner.as_str());

    let metadata = client
        .get(format!("{}/api/nft/metadata/1", address))
        .send()
        .await
        .unwrap();
    assert_eq!(metadata.status().as_u16(), 200);
    let metadata_body: serde_json::Value = metadata.json().await.unwrap();
    assert_eq!(metadata_body["data"]["tokenURI"], "ipfs://QmSeed");

    let missing = client
        .get(format!("{}/api/nft/metadata/99", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn revoke_marks_off_chain_records() {
    let (address, _chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let wallet = wallet(5);

    client
        .post(format!("{}/api/nft/pending-mint", address))
        .json(&pending_body(&wallet))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/api/nft/complete-mint/{}", address, wallet))
        .json(&serde_json::json!({ "tokenId": "revme" }))
        .send()
        .await
        .unwrap();

    let revoked: serde_json::Value = client
        .post(format!("{}/api/nft/revoke/revme", address))
        .json(&serde_json::json!({ "reason": "Detected misconduct" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(revoked["data"]["revocationReason"], "Detected misconduct");

    let missing = client
        .post(format!("{}/api/nft/revoke/unknown", address))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn whitelist_add_and_status() {
    let (address, chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let existing = wallet(6);
    let fresh = wallet(7);

    chain.seed_whitelisted(&existing).await;

    // Already whitelisted -> conflict
    let conflict = client
        .post(format!("{}/api/nft/whitelist/add", address))
        .json(&serde_json::json!({ "studentAddress": existing }))
        .send()
        .await
        .unwrap();
    assert_eq!(conflict.status().as_u16(), 400);
    let conflict_body: serde_json::Value = conflict.json().await.unwrap();
    assert_eq!(conflict_body["error"], "Student already whitelisted");

    // Fresh wallet goes through
    let added: serde_json::Value = client
        .post(format!("{}/api/nft/whitelist/add", address))
        .json(&serde_json::json!({ "studentAddress": fresh }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(added["data"]["transactionHash"].is_string());

    let status: serde_json::Value = client
        .get(format!("{}/api/nft/whitelist/status/{}", address, fresh))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["data"]["isWhitelisted"], true);
    assert_eq!(status["data"]["whitelistCount"], "2");
}

#[tokio::test]
async fn roster_endpoints_round_trip() {
    let (address, _chain) = spawn_app().await;
    let client = reqwest::Client::new();
    let addr = "0x7485b0810293AA7584b8A697e133A4F8785510fC";

    // Empty roster to start
    let empty: serde_json::Value = client
        .get(format!("{}/api/admin/student-addresses", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty["data"]["studentAddresses"].as_array().unwrap().len(), 0);

    // Add, then reject the duplicate
    let added: serde_json::Value = client
        .post(format!("{}/api/admin/student-addresses/add", address))
        .json(&serde_json::json!({ "address": addr }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(added["data"]["studentAddresses"][0], addr);
    assert!(added["data"]["lastUpdated"].is_string());

    let dup = client
        .post(format!("{}/api/admin/student-addresses/add", address))
        .json(&serde_json::json!({ "address": addr.to_lowercase() }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status().as_u16(), 400);

    // Malformed addresses are rejected
    let malformed = client
        .post(format!("{}/api/admin/student-addresses/add", address))
        .json(&serde_json::json!({ "address": "0xnope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status().as_u16(), 400);

    // Remove, then removing again is a 404
    let removed = client
        .post(format!("{}/api/admin/student-addresses/remove", address))
        .json(&serde_json::json!({ "address": addr }))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status().as_u16(), 200);

    let gone = client
        .post(format!("{}/api/admin/student-addresses/remove", address))
        .json(&serde_json::json!({ "address": addr }))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn student_id_lookup_requires_wallet_param() {
    let (address, _chain) = spawn_app().await;
    let client = reqwest::Client::new();

    let missing = client
        .get(format!("{}/api/student/id-nft", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 400);

    // Unknown wallet -> 404 (no identity token).
    let unknown = client
        .get(format!(
            "{}/api/student/id-nft?walletAddress={}",
            address,
            wallet(8)
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);
}
