// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature verification.
//!
//! The messaging gateway signs each callback body with HMAC-SHA256 over the
//! raw bytes, delivered as `X-Signature-256: sha256=<hex>`. Verification is
//! constant-time via the hmac crate. Unsigned or badly-signed requests never
//! reach the ingestion handler.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use arrivo_core::ArrivoError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook body signature.
pub const SIGNATURE_HEADER: &str = "x-signature-256";

/// Verify `header` against the HMAC-SHA256 of `body` under `secret`.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), ArrivoError> {
    let header = header.ok_or(ArrivoError::SignatureInvalid)?;
    let hex_sig = header
        .strip_prefix("sha256=")
        .ok_or(ArrivoError::SignatureInvalid)?;
    let sig = hex::decode(hex_sig).map_err(|_| ArrivoError::SignatureInvalid)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ArrivoError::Internal(format!("hmac key: {e}")))?;
    mac.update(body);
    mac.verify_slice(&sig)
        .map_err(|_| ArrivoError::SignatureInvalid)
}

/// Produce the signature header value for `body`. Used by tests and by
/// gateway simulators.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"message_id":"wamid.1"}"#;
        let header = sign("topsecret", body);
        assert!(verify_signature("topsecret", body, Some(&header)).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let body = br#"{"message_id":"wamid.1"}"#;
        let header = sign("topsecret", body);
        let err = verify_signature("othersecret", body, Some(&header)).unwrap_err();
        assert!(matches!(err, ArrivoError::SignatureInvalid));
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign("topsecret", br#"{"message_id":"wamid.1"}"#);
        let err = verify_signature("topsecret", br#"{"message_id":"wamid.2"}"#, Some(&header))
            .unwrap_err();
        assert!(matches!(err, ArrivoError::SignatureInvalid));
    }

    #[test]
    fn missing_header_fails() {
        let err = verify_signature("topsecret", b"{}", None).unwrap_err();
        assert!(matches!(err, ArrivoError::SignatureInvalid));
    }

    #[test]
    fn malformed_header_fails() {
        assert!(verify_signature("topsecret", b"{}", Some("nonsense")).is_err());
        assert!(verify_signature("topsecret", b"{}", Some("sha256=zz-not-hex")).is_err());
    }
}
