//! Request signature verification for interactive callbacks.
//!
//! The signature is `v0=` followed by the hex HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}` keyed with the signing secret.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

const VERSION: &str = "v0";

/// Verifies callback signatures against one signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    tolerance: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, GatewayError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| GatewayError::Auth(format!("unusable signing secret: {e}")))?;
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }

    /// Signature header value for `body` sent at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] if the secret cannot key the MAC.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, GatewayError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{VERSION}={}", hex::encode(digest)))
    }

    /// Verify against the current wall clock.
    ///
    /// # Errors
    ///
    /// See [`SignatureVerifier::verify_at`].
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), GatewayError> {
        self.verify_at(timestamp, signature, body, chrono::Utc::now().timestamp())
    }

    /// Verify a callback as of `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] when either header is missing, the
    /// timestamp is unparsable or outside the tolerance window, or the
    /// signature does not match.
    pub fn verify_at(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), GatewayError> {
        let timestamp = timestamp
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Auth("missing request timestamp".into()))?;
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GatewayError::Auth("missing request signature".into()))?;

        let sent: i64 = timestamp
            .parse()
            .map_err(|_| GatewayError::Auth("malformed request timestamp".into()))?;
        if now.abs_diff(sent) > self.tolerance.as_secs() {
            return Err(GatewayError::Auth("stale request timestamp".into()));
        }

        let expected = signature
            .strip_prefix("v0=")
            .and_then(|h| hex::decode(h).ok())
            .ok_or_else(|| GatewayError::Auth("malformed request signature".into()))?;
        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| GatewayError::Auth("signature mismatch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new("8f742231b10e8888abcd99yyyzzz85a5", Duration::from_secs(300))
    }

    #[test]
    fn signs_in_v0_format() {
        let sig = verifier().sign("1700000000", b"payload=%7B%7D").unwrap();
        assert!(sig.starts_with("v0="));
        assert_eq!(sig.len(), 3 + 64);
    }

    #[test]
    fn accepts_own_signature() {
        let v = verifier();
        let body = b"payload=%7B%22type%22%3A%22block_actions%22%7D";
        let sig = v.sign("1700000000", body).unwrap();
        v.verify_at(Some("1700000000"), Some(&sig), body, NOW).unwrap();
    }

    #[test]
    fn rejects_tampered_body() {
        let v = verifier();
        let sig = v.sign("1700000000", b"payload=a").unwrap();
        let err = v
            .verify_at(Some("1700000000"), Some(&sig), b"payload=b", NOW)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(ref m) if m == "signature mismatch"));
    }

    #[test]
    fn rejects_tampered_signature() {
        let v = verifier();
        let mut sig = v.sign("1700000000", b"payload=a").unwrap();
        let last = if sig.ends_with('0') { "1" } else { "0" };
        sig.pop();
        sig.push_str(last);
        assert!(v.verify_at(Some("1700000000"), Some(&sig), b"payload=a", NOW).is_err());
    }

    #[rstest]
    #[case(-301, false)]
    #[case(-300, true)]
    #[case(0, true)]
    #[case(300, true)]
    #[case(301, false)]
    fn timestamp_tolerance(#[case] offset: i64, #[case] accepted: bool) {
        let v = verifier();
        let ts = (NOW + offset).to_string();
        let sig = v.sign(&ts, b"x").unwrap();
        let result = v.verify_at(Some(&ts), Some(&sig), b"x", NOW);
        assert_eq!(result.is_ok(), accepted);
        if let Err(err) = result {
            assert!(matches!(err, GatewayError::Auth(ref m) if m.contains("stale")));
        }
    }

    #[test]
    fn rejects_missing_headers() {
        let v = verifier();
        assert!(v.verify_at(None, Some("v0=00"), b"x", NOW).is_err());
        assert!(v.verify_at(Some("1700000000"), None, b"x", NOW).is_err());
        assert!(v.verify_at(Some("1700000000"), Some("nothex"), b"x", NOW).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", verifier());
        assert!(!rendered.contains("8f742231"));
    }
}
