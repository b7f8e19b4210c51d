// src/config.rs

use std::env;

use dotenvy::dotenv;

/// Runtime configuration, loaded once at startup.
///
/// `RPC_URL` may be set to the literal value `memory` to run against the
/// in-process chain stub instead of a node (used in development).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rpc_url: String,
    pub private_key: String,
    pub exam_registration_address: String,
    pub exam_nft_registry_address: String,
    pub student_id_nft_address: String,
    pub pinata_api_key: String,
    pub pinata_api_secret: String,
    pub ai_service_url: String,
    pub ipfs_gateway_url: String,
    pub student_addresses_path: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| "http://localhost:7545".to_string());

        if rpc_url != "memory" {
            url::Url::parse(&rpc_url).expect("RPC_URL must be a valid URL");
        }

        let private_key = env::var("PRIVATE_KEY").expect("PRIVATE_KEY must be set");

        let exam_registration_address = env::var("EXAM_REGISTRATION_ADDRESS")
            .unwrap_or_else(|_| "0x7485b0810293AA7584b8A697e133A4F8785510fC".to_string());

        let exam_nft_registry_address = env::var("EXAM_NFT_REGISTRY_ADDRESS")
            .unwrap_or_else(|_| "0x11C8F8E97F0Ff1741Bf9B565BeDA91740cd8a8E7".to_string());

        let student_id_nft_address = env::var("STUDENT_ID_NFT_ADDRESS").unwrap_or_default();

        let pinata_api_key = env::var("PINATA_API_KEY").unwrap_or_default();
        let pinata_api_secret = env::var("PINATA_API_SECRET").unwrap_or_default();

        let ai_service_url =
            env::var("AI_SERVICE_URL").unwrap_or_else(|_| "http://localhost:5001".to_string());

        let ipfs_gateway_url = env::var("IPFS_GATEWAY_URL")
            .unwrap_or_else(|_| "https://gateway.pinata.cloud/ipfs/".to_string());

        let student_addresses_path = env::var("STUDENT_ADDRESSES_PATH")
            .unwrap_or_else(|_| "data/student-addresses.json".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            port,
            rpc_url,
            private_key,
            exam_registration_address,
            exam_nft_registry_address,
            student_id_nft_address,
            pinata_api_key,
            pinata_api_secret,
            ai_service_url,
            ipfs_gateway_url,
            student_addresses_path,
            rust_log,
        }
    }
}
