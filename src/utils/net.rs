// src/utils/net.rs

use axum::http::{HeaderMap, header};

/// Best-effort client IP: first entry of `X-Forwarded-For` when present.
/// Falls back to "Unknown" rather than erroring; the address is recorded
/// on exam sessions for audit, not used for access control.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn missing_headers_fall_back_to_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "Unknown");
        assert_eq!(user_agent(&headers), "Unknown");
    }
}
