// src/utils/addr.rs

use std::sync::LazyLock;

use regex::Regex;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address regex"));

/// Checks the `0x` + 40-hex-digit wallet address format.
pub fn is_wallet_address(addr: &str) -> bool {
    ADDRESS_RE.is_match(addr)
}

/// Canonical form used wherever addresses are compared.
/// On-chain addresses are case-insensitive, so comparisons go through here.
pub fn normalize(addr: &str) -> String {
    addr.to_lowercase()
}
