//! Authentication of webhook deliveries
//!
//! Each delivery carries an HMAC-SHA256 of its exact body, keyed with the
//! endpoint's shared secret, in the [`SIGNATURE_HEADER`] header formatted as
//! `sha256=<hex digest>`.
//!
//! ```
//! use grantex::webhook;
//!
//! let body = br#"{"type":"grant.revoked"}"#;
//! let signature = webhook::sign_webhook_payload(body, "whsec_test");
//!
//! assert!(webhook::verify_webhook_signature(body, &signature, "whsec_test"));
//! assert!(!webhook::verify_webhook_signature(body, &signature, "whsec_other"));
//! ```

use ring::hmac;

/// The HTTP header a delivery's signature arrives in
pub const SIGNATURE_HEADER: &str = "X-Grantex-Signature";

const PREFIX: &str = "sha256=";

/// Checks that `signature` is the HMAC-SHA256 of `payload` under `secret`
///
/// Malformed signatures (a missing `sha256=` prefix, an empty or non-hex
/// digest) are simply not authentic; this never fails in any other way.
#[must_use]
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let digest = match signature.strip_prefix(PREFIX) {
        Some(d) if !d.is_empty() => d,
        _ => return false,
    };

    let Ok(provided) = hex::decode(digest) else {
        return false;
    };

    let expected = sign(payload, secret);
    constant_time_eq(&provided, expected.as_ref())
}

/// Produces the signature value a sender attaches to `payload`
#[must_use]
pub fn sign_webhook_payload(payload: &[u8], secret: &str) -> String {
    let mut signature = String::from(PREFIX);
    signature.push_str(&hex::encode(sign(payload, secret)));
    signature
}

fn sign(payload: &[u8], secret: &str) -> hmac::Tag {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::sign(&key, payload)
}

/// Compares two byte strings in time that depends only on their lengths
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let diff = a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const PAYLOAD: &[u8] = br#"{"type":"grant.created","data":{"grantId":"grant-abc"}}"#;

    fn reference_signature(payload: &[u8], secret: &str) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        format!("sha256={}", hex::encode(hmac::sign(&key, payload)))
    }

    #[test]
    fn accepts_valid_signature() {
        let signature = reference_signature(PAYLOAD, SECRET);
        assert_eq!(sign_webhook_payload(PAYLOAD, SECRET), signature);
        assert!(verify_webhook_signature(PAYLOAD, &signature, SECRET));
    }

    #[test]
    fn accepts_uppercase_hex() {
        let signature = reference_signature(PAYLOAD, SECRET);
        let upper = format!("sha256={}", signature[PREFIX.len()..].to_uppercase());
        assert!(verify_webhook_signature(PAYLOAD, &upper, SECRET));
    }

    #[test]
    fn matches_known_digest() {
        // RFC 4231 test case 2
        let signature = sign_webhook_payload(b"what do ya want for nothing?", "Jefe");
        assert_eq!(
            signature,
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn rejects_flipped_bit() {
        let signature = reference_signature(PAYLOAD, SECRET);
        let mut raw = hex::decode(&signature[PREFIX.len()..]).unwrap();
        raw[0] ^= 0x01;
        let tampered = format!("sha256={}", hex::encode(raw));
        assert!(!verify_webhook_signature(PAYLOAD, &tampered, SECRET));
    }

    #[test]
    fn rejects_changed_payload_or_secret() {
        let signature = reference_signature(PAYLOAD, SECRET);
        assert!(!verify_webhook_signature(b"{}", &signature, SECRET));
        assert!(!verify_webhook_signature(PAYLOAD, &signature, "other-secret"));
    }

    #[test]
    fn rejects_malformed_signatures() {
        for signature in [
            "",
            "sha256",
            "sha256=",
            "bad-format",
            "sha256=deadbeef",
            "sha256=not-hex-at-all!!!",
            "sha256=abc",
            "SHA256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843",
        ] {
            assert!(
                !verify_webhook_signature(PAYLOAD, signature, SECRET),
                "{signature:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bare_digest_without_prefix() {
        let signature = reference_signature(PAYLOAD, SECRET);
        assert!(!verify_webhook_signature(
            PAYLOAD,
            &signature[PREFIX.len()..],
            SECRET
        ));
    }

    #[test]
    fn constant_time_eq_compares_whole_buffers() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(!constant_time_eq(b"xbc", b"abc"));
    }
}
