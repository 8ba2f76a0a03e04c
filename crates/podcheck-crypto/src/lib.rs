//! Podcheck Crypto: the deterministic digest shared by authority
//! resolution and claim verification.

pub mod digest;

pub use digest::{digest_hex, matches_digest, Digest, DIGEST_HEX_LEN};
