//! MD5 digests rendered as lowercase hex.
//!
//! MD5 is used here for deterministic, pseudonymous addressing and for
//! compatibility with attestations already published by authorities. It is
//! not a commitment scheme: a low-entropy input such as a birth date can be
//! recovered from its digest by enumeration.

use md5::{Digest as _, Md5};

/// Raw MD5 output (16 bytes).
pub type Digest = [u8; 16];

/// Length of a digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 32;

/// Digest arbitrary UTF-8 text.
pub fn digest(input: &str) -> Digest {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(input.as_bytes()));
    out
}

/// Digest UTF-8 text and format it as lowercase hex.
pub fn digest_hex(input: &str) -> String {
    hex::encode(digest(input))
}

/// Whether `expected_hex` is exactly the hex digest of `input`.
///
/// The comparison is byte-for-byte and case-sensitive: an uppercase digest
/// does not match.
pub fn matches_digest(input: &str, expected_hex: &str) -> bool {
    digest_hex(input).as_bytes() == expected_hex.as_bytes()
}
