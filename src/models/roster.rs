// src/models/roster.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// On-disk layout of the student address roster.
///
/// Mirrors the persisted JSON file: a flat address list plus bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterFile {
    #[serde(default)]
    pub student_addresses: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_description() -> String {
    "Student wallet addresses eligible for exam registration".to_string()
}

impl Default for RosterFile {
    fn default() -> Self {
        Self {
            student_addresses: Vec::new(),
            last_updated: None,
            description: default_description(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterAddressRequest {
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
}
