//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1492774577,v1=5257a8...,v0=...`.
//! The expected `v1` value is the hex HMAC-SHA256 of `"{t}.{raw body}"` keyed
//! with the endpoint's signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::BillingError;

type HmacSha256 = Hmac<Sha256>;

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, BillingError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    BillingError::InvalidSignature("Malformed timestamp".into())
                })?)
            }
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| BillingError::InvalidSignature("Missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(BillingError::InvalidSignature(
            "No v1 signature in header".into(),
        ));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex `v1` signature for a payload signed at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(
        signed_payload_mac(secret, timestamp, payload)
            .finalize()
            .into_bytes(),
    )
}

/// Verify `header` against the raw request body.
///
/// Succeeds if any `v1` entry matches and the timestamp is within
/// `tolerance_secs` of `now` (unix seconds).
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), BillingError> {
    let parsed = parse_header(header)?;

    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(BillingError::InvalidSignature(
            "Timestamp outside the tolerance zone".into(),
        ));
    }

    for candidate in parsed.signatures {
        let Ok(bytes) = hex::decode(candidate) else {
            continue;
        };
        // Constant-time comparison.
        if signed_payload_mac(secret, parsed.timestamp, payload)
            .verify_slice(&bytes)
            .is_ok()
        {
            return Ok(());
        }
    }

    Err(BillingError::InvalidSignature(
        "No signature matches the payload".into(),
    ))
}
