//! Signature computation and constant-time verification.
//!
//! | Variant | Digest | Encoding |
//! |---------|--------|----------|
//! | single-step | HMAC-SHA1 | base64 (standard alphabet) |
//! | scoped | HMAC-SHA256 | lowercase hex |

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::derive::DerivedKey;
use crate::variant::SignatureVariant;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Compute the signature token of `string_to_sign` under `key`.
///
/// # Examples
///
/// ```
/// use signet_auth::derive::derive;
/// use signet_auth::signer::sign;
/// use signet_auth::variant::SignatureVariant;
///
/// let variant = SignatureVariant::SingleStepHmacSha1Base64;
/// let key = derive(b"AWS_SECRET", None, variant).unwrap();
/// assert_eq!(sign(&key, "hello", variant), "HVEbt2rnzfpU/+l+8u9ANSQ0TnU=");
/// ```
#[must_use]
pub fn sign(key: &DerivedKey, string_to_sign: &str, variant: SignatureVariant) -> String {
    match variant {
        SignatureVariant::SingleStepHmacSha1Base64 => {
            BASE64.encode(hmac_sha1(key.as_bytes(), string_to_sign.as_bytes()).as_slice())
        }
        SignatureVariant::ScopedHmacSha256Hex => {
            hex::encode(hmac_sha256(key.as_bytes(), string_to_sign.as_bytes()).as_slice())
        }
    }
}

/// Recompute the token and compare it with `token` in constant time.
#[must_use]
pub fn verify(
    token: &str,
    key: &DerivedKey,
    string_to_sign: &str,
    variant: SignatureVariant,
) -> bool {
    let expected = sign(key, string_to_sign, variant);
    constant_time_eq(token.as_bytes(), expected.as_bytes())
}

/// Byte equality whose running time does not depend on where the inputs
/// first differ. Inputs of different length compare unequal.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Compute HMAC-SHA1 and return the raw bytes.
pub(crate) fn hmac_sha1(key: &[u8], data: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut mac =
        <HmacSha1 as KeyInit>::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    Zeroizing::new(mac.finalize().into_bytes().to_vec())
}

/// Compute HMAC-SHA256 and return the raw bytes.
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut mac =
        <HmacSha256 as KeyInit>::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    Zeroizing::new(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use std::hint::black_box;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::derive::derive;
    use crate::scope::Scope;

    const SECRET: &[u8] = b"AWS_SECRET";
    const SCOPED_STRING_TO_SIGN: &str = "AWS4-HMAC-SHA256\n\
        20230101T000000Z\n\
        20230101/us-east-1/s3/aws4_request\n\
        0a0dd95dbca79e124d33999cbb81b5758137ce46cf224b2b1b49de6e1b950026";

    fn scoped_key(secret: &[u8]) -> DerivedKey {
        let scope = Scope::new("20230101", "us-east-1", "s3", "aws4_request");
        derive(secret, Some(&scope), SignatureVariant::ScopedHmacSha256Hex).unwrap()
    }

    #[test]
    fn test_should_sign_single_step_known_vector() {
        let variant = SignatureVariant::SingleStepHmacSha1Base64;
        let key = derive(SECRET, None, variant).unwrap();
        assert_eq!(sign(&key, "hello", variant), "HVEbt2rnzfpU/+l+8u9ANSQ0TnU=");
    }

    #[test]
    fn test_should_sign_scoped_known_vector() {
        let signature = sign(
            &scoped_key(SECRET),
            SCOPED_STRING_TO_SIGN,
            SignatureVariant::ScopedHmacSha256Hex,
        );
        assert_eq!(
            signature,
            "de52d948efe86ade8e7345a97ece9fd1e23917f427095fcc7d99559595e3538e"
        );
    }

    #[test]
    fn test_should_compute_aws_published_signature() {
        let scope = Scope::new("20130524", "us-east-1", "s3", "aws4_request");
        let key = derive(
            b"wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
            Some(&scope),
            SignatureVariant::ScopedHmacSha256Hex,
        )
        .unwrap();

        let string_to_sign = "AWS4-HMAC-SHA256\n\
                              20130524T000000Z\n\
                              20130524/us-east-1/s3/aws4_request\n\
                              7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972";

        assert_eq!(
            sign(&key, string_to_sign, SignatureVariant::ScopedHmacSha256Hex),
            "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41"
        );
    }

    #[test]
    fn test_should_verify_round_trip_for_both_variants() {
        let single = SignatureVariant::SingleStepHmacSha1Base64;
        let key = derive(SECRET, None, single).unwrap();
        let token = sign(&key, "PUT\n\n\n\n/bucket/key", single);
        assert!(verify(&token, &key, "PUT\n\n\n\n/bucket/key", single));

        let scoped = SignatureVariant::ScopedHmacSha256Hex;
        let key = scoped_key(SECRET);
        let token = sign(&key, SCOPED_STRING_TO_SIGN, scoped);
        assert!(verify(&token, &key, SCOPED_STRING_TO_SIGN, scoped));
    }

    #[test]
    fn test_should_not_verify_with_key_from_other_secret() {
        let scoped = SignatureVariant::ScopedHmacSha256Hex;
        let secrets: [&[u8]; 4] = [b"secret-a", b"secret-b", b"AWS_SECRET", b"AWS_SECRET "];

        for signer_secret in secrets {
            let token = sign(&scoped_key(signer_secret), SCOPED_STRING_TO_SIGN, scoped);
            for verifier_secret in secrets.iter().filter(|s| **s != signer_secret) {
                assert!(!verify(
                    &token,
                    &scoped_key(verifier_secret),
                    SCOPED_STRING_TO_SIGN,
                    scoped
                ));
            }
        }
    }

    #[test]
    fn test_should_not_verify_tampered_string_to_sign() {
        let scoped = SignatureVariant::ScopedHmacSha256Hex;
        let key = scoped_key(SECRET);
        let token = sign(&key, SCOPED_STRING_TO_SIGN, scoped);
        let tampered = SCOPED_STRING_TO_SIGN.replace("us-east-1", "us-east-2");
        assert!(!verify(&token, &key, &tampered, scoped));
    }

    #[test]
    fn test_should_reject_tokens_of_different_length() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    /// Best-effort check: comparing against a token that differs in its first
    /// byte must not be measurably faster than one differing in its last byte.
    #[test]
    fn test_should_compare_in_time_independent_of_mismatch_position() {
        const ROUNDS: usize = 15;
        const ITERATIONS: u32 = 20_000;

        let expected = [0x5a_u8; 64];
        let mut first = expected;
        first[0] ^= 0xff;
        let mut last = expected;
        last[63] ^= 0xff;

        let measure = |candidate: &[u8; 64]| -> Duration {
            (0..ROUNDS)
                .map(|_| {
                    let start = Instant::now();
                    for _ in 0..ITERATIONS {
                        black_box(constant_time_eq(black_box(candidate), black_box(&expected)));
                    }
                    start.elapsed()
                })
                .min()
                .unwrap_or_default()
        };

        // Interleave to spread scheduler noise over both samples.
        let (mut early, mut late) = (Duration::MAX, Duration::MAX);
        for _ in 0..3 {
            early = early.min(measure(&first));
            late = late.min(measure(&last));
        }

        let ratio = early.as_secs_f64() / late.as_secs_f64().max(f64::EPSILON);
        assert!(
            (0.33..3.0).contains(&ratio),
            "first-byte mismatch took {early:?}, last-byte mismatch took {late:?}"
        );
    }
}
