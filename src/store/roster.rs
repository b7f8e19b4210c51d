// src/store/roster.rs

//! File-backed roster of student wallet addresses.
//!
//! The JSON file is the source of truth; every mutation is a locked
//! read-modify-write so concurrent admin calls cannot clobber each other.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::roster::RosterFile;
use crate::utils::addr::normalize;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Student address already listed")]
    AlreadyListed,
    #[error("Student address not listed")]
    NotListed,
    #[error("Roster file error: {0}")]
    Io(String),
}

#[derive(Clone)]
pub struct RosterStore {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl RosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// Reads the roster; a missing file is an empty roster, not an error.
    pub async fn load(&self) -> Result<RosterFile, RosterError> {
        let _guard = self.lock.read().await;
        self.read_file().await
    }

    pub async fn contains(&self, address: &str) -> Result<bool, RosterError> {
        let roster = self.load().await?;
        let address = normalize(address);
        Ok(roster
            .student_addresses
            .iter()
            .any(|a| normalize(a) == address))
    }

    pub async fn add(&self, address: &str) -> Result<RosterFile, RosterError> {
        let _guard = self.lock.write().await;
        let mut roster = self.read_file().await?;

        let wanted = normalize(address);
        if roster
            .student_addresses
            .iter()
            .any(|a| normalize(a) == wanted)
        {
            return Err(RosterError::AlreadyListed);
        }

        roster.student_addresses.push(address.to_string());
        roster.last_updated = Some(Utc::now());
        self.write_file(&roster).await?;
        Ok(roster)
    }

    pub async fn remove(&self, address: &str) -> Result<RosterFile, RosterError> {
        let _guard = self.lock.write().await;
        let mut roster = self.read_file().await?;

        let wanted = normalize(address);
        let before = roster.student_addresses.len();
        roster.student_addresses.retain(|a| normalize(a) != wanted);
        if roster.student_addresses.len() == before {
            return Err(RosterError::NotListed);
        }

        roster.last_updated = Some(Utc::now());
        self.write_file(&roster).await?;
        Ok(roster)
    }

    async fn read_file(&self) -> Result<RosterFile, RosterError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| RosterError::Io(format!("invalid roster file: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RosterFile::default()),
            Err(e) => Err(RosterError::Io(e.to_string())),
        }
    }

    async fn write_file(&self, roster: &RosterFile) -> Result<(), RosterError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RosterError::Io(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(roster)
            .map_err(|e| RosterError::Io(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| RosterError::Io(e.to_string()))
    }
}
