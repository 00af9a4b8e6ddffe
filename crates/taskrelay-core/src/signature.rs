//! HMAC-SHA256 signature verification for signed deliveries.
//!
//! The sender signs the raw request body with the handshake secret and sends
//! the lowercase hex digest in `x-hook-signature`. Verification recomputes the
//! digest and compares the supplied header bytes against it without any early
//! exit, including when the lengths differ.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{RelayError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of `body` keyed with `secret`.
///
/// An empty secret is a valid (weak) key.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| RelayError::Internal(anyhow::anyhow!("invalid HMAC key: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time byte comparison
///
/// Both inputs are padded to the longer length with different filler bytes, so
/// the work done depends only on the longer input and a length mismatch is
/// folded into the result instead of short-circuiting.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let max_len = std::cmp::max(a.len(), b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a);
    b_padded[..b.len()].copy_from_slice(b);

    let lengths_equal = (a.len() as u64).ct_eq(&(b.len() as u64));
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

/// Check a supplied signature against the body and secret.
///
/// Returns `Ok(false)` on any mismatch; errors only if the digest itself
/// cannot be computed.
pub fn verify_signature(secret: &[u8], body: &[u8], supplied: &[u8]) -> Result<bool> {
    let expected = compute_signature(secret, body)?;
    Ok(constant_time_eq(supplied, expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"events":[]}"#;

    #[test]
    fn test_known_digest() {
        // RFC 4231 test case 2
        let digest = compute_signature(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let digest = compute_signature(b"secret", BODY).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_empty_secret_is_accepted() {
        let digest = compute_signature(b"", BODY).unwrap();
        assert!(verify_signature(b"", BODY, digest.as_bytes()).unwrap());
    }

    #[test]
    fn test_valid_signature() {
        let digest = compute_signature(b"secret", BODY).unwrap();
        assert!(verify_signature(b"secret", BODY, digest.as_bytes()).unwrap());
    }

    #[test]
    fn test_wrong_secret() {
        let digest = compute_signature(b"other", BODY).unwrap();
        assert!(!verify_signature(b"secret", BODY, digest.as_bytes()).unwrap());
    }

    #[test]
    fn test_every_single_bit_flip_is_rejected() {
        let digest = compute_signature(b"secret", BODY).unwrap();
        let bytes = digest.as_bytes();

        for i in 0..bytes.len() {
            for bit in 0..8 {
                let mut mutated = bytes.to_vec();
                mutated[i] ^= 1 << bit;
                assert!(
                    !verify_signature(b"secret", BODY, &mutated).unwrap(),
                    "flip of bit {} in byte {} was accepted",
                    bit,
                    i
                );
            }
        }
    }

    #[test]
    fn test_length_mismatch_does_not_error() {
        let digest = compute_signature(b"secret", BODY).unwrap();
        let truncated = &digest.as_bytes()[..10];
        let extended = format!("{}00", digest);

        assert!(!verify_signature(b"secret", BODY, truncated).unwrap());
        assert!(!verify_signature(b"secret", BODY, extended.as_bytes()).unwrap());
        assert!(!verify_signature(b"secret", BODY, b"").unwrap());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"secret", b"Secret"));
        assert!(!constant_time_eq(b"secret", b"secre"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
        // Padding bytes must not make a prefix compare equal
        assert!(!constant_time_eq(b"ab\xFF", b"ab"));
        assert!(!constant_time_eq(b"ab", b"ab\x00"));
    }
}
