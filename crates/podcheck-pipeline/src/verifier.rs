//! Verifier: one-way comparison of a claimed value against an attested
//! digest.
//!
//! The authority publishes only `md5(value)`, never the value itself.
//! Because dates and scores have little entropy, the published digest can
//! be inverted by enumeration; treat a match as "the authority agrees", not
//! as a secret-preserving proof.

use podcheck_core::{Verdict, VerificationRequest};
use podcheck_crypto::matches_digest;

/// Compare `claimed` against the attested digest, byte-for-byte.
pub fn verify(claimed: &str, attested: &str) -> Verdict {
    if matches_digest(claimed, attested) {
        Verdict::Match
    } else {
        Verdict::Mismatch
    }
}

/// [`verify`] over a request pair.
pub fn verify_request(request: &VerificationRequest) -> Verdict {
    let verdict = verify(&request.claimed, &request.attested);
    tracing::debug!(kind = %request.kind, ?verdict, "compared claim with attestation");
    verdict
}
