//! Request signing for the authenticated API surfaces
//!
//! Signatures are HMAC-SHA256 over `timestamp + METHOD + path + query + body`
//! with no delimiters. The two signed surfaces differ in how the secret is
//! interpreted and how the digest is encoded, so the mode is always selected
//! explicitly per surface, never inferred from the material.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// API version date sent with legacy-mode requests
pub const API_VERSION: &str = "2021-10-05";

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Missing API secret")]
    MissingSecret,

    #[error("Invalid API secret: {0}")]
    InvalidSecret(String),

    #[error("HMAC error: {0}")]
    Hmac(String),
}

pub type Result<T> = std::result::Result<T, SignError>;

/// How a surface expects its signature computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// Secret used as raw text, signature base64-encoded
    Primary,
    /// Secret base64-decoded first, signature hex-encoded, versioned headers
    LegacyHex,
}

/// Canonicalized request representation built per call
///
/// Path normalization: a path already carrying the surface prefix is used
/// as-is; otherwise the prefix is prepended after stripping leading slashes,
/// so `"orders"`, `"/orders"` and `"/api/v3/brokerage/orders"` all sign
/// identically. An embedded query string is split off before prefixing and
/// re-appended verbatim, so the signed message covers exactly the query
/// sent on the wire.
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
    pub timestamp: u64,
}

impl SigningContext {
    pub fn new(method: &str, path: &str, prefix: &str, body: &str, timestamp: u64) -> Self {
        let (path, query) = normalize_path(path, prefix);
        Self {
            method: method.to_uppercase(),
            path,
            query,
            body: body.to_string(),
            timestamp,
        }
    }

    /// Path plus query as sent on the wire
    pub fn request_path(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// The exact byte sequence the signature covers
    pub fn message(&self) -> String {
        format!(
            "{}{}{}{}",
            self.timestamp,
            self.method,
            self.request_path(),
            self.body
        )
    }
}

/// Split off the query string and apply the surface path prefix
fn normalize_path(path: &str, prefix: &str) -> (String, Option<String>) {
    let (raw_path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q.to_string())),
        None => (path, None),
    };

    let stripped = raw_path.trim_start_matches('/');
    let prefix_stripped = prefix.trim_start_matches('/');

    // Prefix detection is segment-boundary aware so "/api/v3/brokerageX"
    // does not count as already prefixed
    let already_prefixed = stripped == prefix_stripped
        || stripped
            .strip_prefix(prefix_stripped)
            .map_or(false, |rest| rest.starts_with('/'));

    let normalized = if prefix_stripped.is_empty() || already_prefixed {
        format!("/{}", stripped)
    } else {
        format!("/{}/{}", prefix_stripped, stripped)
    };

    (normalized, query)
}

/// Compute the request signature for a canonicalized context
pub fn sign(ctx: &SigningContext, secret: &str, mode: SigningMode) -> Result<String> {
    if secret.is_empty() {
        return Err(SignError::MissingSecret);
    }

    let key_bytes = match mode {
        SigningMode::Primary => secret.as_bytes().to_vec(),
        SigningMode::LegacyHex => STANDARD
            .decode(secret)
            .map_err(|e| SignError::InvalidSecret(e.to_string()))?,
    };

    let mut mac =
        HmacSha256::new_from_slice(&key_bytes).map_err(|e| SignError::Hmac(e.to_string()))?;
    mac.update(ctx.message().as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(match mode {
        SigningMode::Primary => STANDARD.encode(digest),
        SigningMode::LegacyHex => hex::encode(digest),
    })
}

/// Build the authentication header set for a signed request
pub fn auth_headers(
    ctx: &SigningContext,
    api_key: &str,
    secret: &str,
    mode: SigningMode,
) -> Result<HashMap<String, String>> {
    let signature = sign(ctx, secret, mode)?;

    let mut headers = HashMap::new();
    headers.insert("CB-ACCESS-KEY".to_string(), api_key.to_string());
    headers.insert("CB-ACCESS-SIGN".to_string(), signature);
    headers.insert("CB-ACCESS-TIMESTAMP".to_string(), ctx.timestamp.to_string());

    if mode == SigningMode::LegacyHex {
        headers.insert("CB-VERSION".to_string(), API_VERSION.to_string());
    }

    Ok(headers)
}

/// Sign an authenticated feed subscription
///
/// The message is `timestamp + channels + product_ids` with comma-joined
/// lists, hex digest over the raw-text secret.
pub fn sign_subscribe(
    channels: &[String],
    product_ids: &[String],
    secret: &str,
    timestamp: u64,
) -> Result<String> {
    if secret.is_empty() {
        return Err(SignError::MissingSecret);
    }

    let message = format!(
        "{}{}{}",
        timestamp,
        channels.join(","),
        product_ids.join(",")
    );

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignError::Hmac(e.to_string()))?;
    mac.update(message.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Current Unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/api/v3/brokerage";
    const SECRET: &str = "test_secret_123456";
    const TS: u64 = 1_700_000_000;

    #[test]
    fn message_layout_is_exact() {
        let ctx = SigningContext::new("get", "/orders", PREFIX, "", TS);
        assert_eq!(ctx.message(), "1700000000GET/api/v3/brokerage/orders");
    }

    #[test]
    fn signature_is_deterministic() {
        let ctx = SigningContext::new("GET", "/orders", PREFIX, "", TS);
        let first = sign(&ctx, SECRET, SigningMode::Primary).unwrap();
        let second = sign(&ctx, SECRET, SigningMode::Primary).unwrap();
        assert_eq!(first, second);

        let other_ts = SigningContext::new("GET", "/orders", PREFIX, "", TS + 1);
        assert_ne!(first, sign(&other_ts, SECRET, SigningMode::Primary).unwrap());
    }

    #[test]
    fn path_spellings_normalize_identically() {
        let bare = SigningContext::new("GET", "orders", PREFIX, "", TS);
        let slashed = SigningContext::new("GET", "/orders", PREFIX, "", TS);
        let prefixed = SigningContext::new("GET", "/api/v3/brokerage/orders", PREFIX, "", TS);

        assert_eq!(bare.path, "/api/v3/brokerage/orders");
        assert_eq!(bare.path, slashed.path);
        assert_eq!(bare.path, prefixed.path);

        // A lookalike segment is not the prefix
        let lookalike = SigningContext::new("GET", "/api/v3/brokerageX/orders", PREFIX, "", TS);
        assert_eq!(lookalike.path, "/api/v3/brokerage/api/v3/brokerageX/orders");

        let sig = |ctx: &SigningContext| sign(ctx, SECRET, SigningMode::Primary).unwrap();
        assert_eq!(sig(&bare), sig(&slashed));
        assert_eq!(sig(&bare), sig(&prefixed));
    }

    #[test]
    fn empty_prefix_keeps_path_at_root() {
        let ctx = SigningContext::new("GET", "accounts", "", "", TS);
        assert_eq!(ctx.path, "/accounts");
    }

    #[test]
    fn query_string_signed_exactly_once() {
        let ctx = SigningContext::new("GET", "orders?status=OPEN", PREFIX, "", TS);
        assert_eq!(ctx.path, "/api/v3/brokerage/orders");
        assert_eq!(ctx.query.as_deref(), Some("status=OPEN"));

        let message = ctx.message();
        assert_eq!(message.matches("status=OPEN").count(), 1);
        assert!(message.contains("/orders?status=OPEN"));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let ctx = SigningContext::new("GET", "/orders", PREFIX, "", TS);
        assert!(matches!(
            sign(&ctx, "", SigningMode::Primary),
            Err(SignError::MissingSecret)
        ));
    }

    #[test]
    fn legacy_mode_decodes_secret_and_emits_hex() {
        let ctx = SigningContext::new("GET", "/accounts", "", "", TS);

        // "dGVzdF9zZWNyZXRfMTIzNDU2" is base64 for "test_secret_123456"
        let sig = sign(&ctx, "dGVzdF9zZWNyZXRfMTIzNDU2", SigningMode::LegacyHex).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(matches!(
            sign(&ctx, "not-valid-base64!!!", SigningMode::LegacyHex),
            Err(SignError::InvalidSecret(_))
        ));
    }

    #[test]
    fn header_sets_differ_by_mode() {
        let ctx = SigningContext::new("GET", "/orders", PREFIX, "", TS);

        let primary = auth_headers(&ctx, "key-1", SECRET, SigningMode::Primary).unwrap();
        assert_eq!(primary.get("CB-ACCESS-KEY").map(String::as_str), Some("key-1"));
        assert_eq!(
            primary.get("CB-ACCESS-TIMESTAMP").map(String::as_str),
            Some("1700000000")
        );
        assert!(primary.contains_key("CB-ACCESS-SIGN"));
        assert!(!primary.contains_key("CB-VERSION"));

        let legacy_ctx = SigningContext::new("GET", "/accounts", "", "", TS);
        let legacy = auth_headers(
            &legacy_ctx,
            "key-1",
            "dGVzdF9zZWNyZXRfMTIzNDU2",
            SigningMode::LegacyHex,
        )
        .unwrap();
        assert_eq!(legacy.get("CB-VERSION").map(String::as_str), Some(API_VERSION));
    }

    #[test]
    fn subscribe_signature_is_stable_hex() {
        let channels = vec!["level2".to_string(), "ticker".to_string()];
        let products = vec!["BTC-USD".to_string()];

        let first = sign_subscribe(&channels, &products, SECRET, TS).unwrap();
        let second = sign_subscribe(&channels, &products, SECRET, TS).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        assert!(matches!(
            sign_subscribe(&channels, &products, "", TS),
            Err(SignError::MissingSecret)
        ));
    }

    #[test]
    fn body_participates_in_signature() {
        let no_body = SigningContext::new("POST", "/orders", PREFIX, "", TS);
        let with_body =
            SigningContext::new("POST", "/orders", PREFIX, r#"{"side":"BUY"}"#, TS);

        assert_ne!(
            sign(&no_body, SECRET, SigningMode::Primary).unwrap(),
            sign(&with_body, SECRET, SigningMode::Primary).unwrap()
        );
    }
}
