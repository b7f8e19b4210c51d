// src/clients/mod.rs

//! HTTP clients for the non-chain collaborators: the face-embedding AI
//! service and the IPFS pinning service.

pub mod face;
pub mod ipfs;

pub use face::FaceClient;
pub use ipfs::IpfsClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("{0}")]
    Service(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
