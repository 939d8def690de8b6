//! String hash functions used to place records in an [`OpenTable`](crate::OpenTable).
//!
//! Both functions consume the key byte by byte and carry no state between calls,
//! so the same key and seed always produce the same value.

/// Seed shared by every table for both hash functions.
pub const SEED: u32 = 0x1234_5678;

/// Multiplier of the primary mixing step.
const MIX: u32 = 0x5bd1_e995;

/// Modulus that bounds the secondary hash; steps fall in `1..=STEP_MODULUS`.
const STEP_MODULUS: u32 = 97;

/// Primary hash: a Murmur-style avalanche over the key bytes.
///
/// Bytes are mixed in as unsigned values. Keys with bytes above `0x7f` therefore
/// hash differently than under a signed-`char` C implementation of the same mix;
/// ASCII keys are unaffected.
///
/// The base slot of a key is `primary_hash(key, SEED) % capacity`.
#[must_use]
pub fn primary_hash(key: &str, seed: u32) -> u32 {
    key.bytes().fold(seed, |mut h, byte| {
        h ^= u32::from(byte);
        h = h.wrapping_mul(MIX);
        h ^ (h >> 15)
    })
}

/// Secondary hash used as the probe step in double-hashing mode.
///
/// Never returns 0, the result is always within `[1, 97]`.
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn secondary_hash(key: &str, seed: u32) -> u32 {
    let h = key.bytes().fold(seed, |h, byte| h.wrapping_mul(31).wrapping_add(u32::from(byte)));
    h % STEP_MODULUS + 1
}
