//! Payment notification signature verification.
//!
//! The processor signs the exact raw request body with HMAC-SHA256 under a
//! pre-shared secret and sends the lowercase hex digest in a header. The
//! digest is compared in constant time before anything looks at the body.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "bitvora-signature";

/// Verifier for payment notification signatures.
#[derive(Clone)]
pub struct PaymentNotificationVerifier {
    secret: SecretString,
}

impl PaymentNotificationVerifier {
    /// Creates a new verifier with the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Returns true if `signature` is the hex HMAC-SHA256 of `payload`.
    ///
    /// Accepts either hex case and surrounding whitespace. Anything that does
    /// not decode as hex is treated as a mismatch.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let provided = match hex::decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let expected = self.compute(payload);
        constant_time_compare(&expected, &provided)
    }

    fn compute(&self, payload: &[u8]) -> Vec<u8> {
        mac_over(self.secret.expose_secret(), payload)
    }
}

/// Produces the hex signature the processor would send for `payload`.
///
/// Used by tests and by operators replaying captured notifications.
pub fn compute_signature(secret: &str, payload: &[u8]) -> String {
    hex::encode(mac_over(secret, payload))
}

fn mac_over(secret: &str, payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
