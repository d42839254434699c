//! Prototype data: codes, receipt fallbacks and stand-in palm templates.
//!
//! None of this is security relevant. Callers pass their own RNG so tests
//! can seed it.

use crate::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

const UPPER_ALNUM: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Size of a mock template, matching the capture client's output
pub const TEMPLATE_LENGTH: usize = 256;

fn random_chars<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| UPPER_ALNUM[rng.gen_range(0, UPPER_ALNUM.len())] as char)
        .collect()
}

/// `V` followed by 8 upper-case alphanumerics
pub fn voter_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("V{}", random_chars(rng, 8))
}

/// `VT` followed by 12 upper-case alphanumerics
pub fn vote_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("VT{}", random_chars(rng, 12))
}

/// Receipt ballot ID used when the backend response carried none
pub fn ballot_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("BLT-{}", random_chars(rng, 9))
}

/// Receipt audit hash used when the backend response carried none
pub fn audit_hash<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("SHA256:{}", random_chars(rng, 16))
}

/// 256 random bytes, base64
pub fn palm_template<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; TEMPLATE_LENGTH];
    rng.fill_bytes(&mut bytes);
    base64::encode(&bytes[..])
}

/// A stand-in template that is stable per voter and hand, so a mock
/// registration and a later mock scan of the same hand match.
pub fn palm_template_for(voter_code: &str, hand: Hand) -> String {
    let mut seed = [0u8; 32];
    let digest = Sha256::new()
        .chain(voter_code.trim().as_bytes())
        .chain(b"|")
        .chain(hand.as_str().as_bytes())
        .finalize();
    seed.copy_from_slice(&digest);

    let mut rng = ChaCha20Rng::from_seed(seed);
    palm_template(&mut rng)
}
