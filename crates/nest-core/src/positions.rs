//! Deterministic pseudorandom placement of payload bits.
//!
//! Candidates come from hashing `key || counter` (counter as big-endian u64) with SHA-256,
//! every digest yields eight big-endian `u32` chunks, each reduced modulo the unit count.
//! A candidate is accepted only once, the output keeps acceptance order.
//!
//! Because candidates are consumed strictly in order, the first `b` positions for a key
//! are the same no matter how many positions are drawn in total. Extraction relies on
//! that to read the container header before it knows the full container length.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::error::NestError;
use crate::result::Result;
use crate::StegoKey;

const CHUNK_LEN: usize = 4;
const DIGEST_LEN: usize = 32;

/// Endless stream of candidate indices in `0..units`, duplicates included.
#[derive(Debug, Clone)]
pub struct Candidates<'k> {
    key: &'k [u8],
    units: u64,
    counter: u64,
    digest: [u8; DIGEST_LEN],
    offset: usize,
}

impl<'k> Candidates<'k> {
    pub fn new(key: &'k StegoKey, units: usize) -> Self {
        Self {
            key: key.as_bytes(),
            units: units as u64,
            counter: 0,
            digest: [0; DIGEST_LEN],
            offset: DIGEST_LEN,
        }
    }

    fn rehash(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(self.counter.to_be_bytes());
        self.digest = hasher.finalize().into();
        self.counter += 1;
        self.offset = 0;
    }
}

impl Iterator for Candidates<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.units == 0 {
            return None;
        }
        if self.offset >= DIGEST_LEN {
            self.rehash();
        }
        let mut chunk = [0u8; CHUNK_LEN];
        chunk.copy_from_slice(&self.digest[self.offset..self.offset + CHUNK_LEN]);
        self.offset += CHUNK_LEN;

        Some((u32::from_be_bytes(chunk) as u64 % self.units) as usize)
    }
}

/// Distinct positions in acceptance order, ends once every unit has been handed out.
#[derive(Debug, Clone)]
pub struct Positions<'k> {
    candidates: Candidates<'k>,
    seen: HashSet<usize>,
    units: usize,
}

impl<'k> Positions<'k> {
    pub fn new(key: &'k StegoKey, units: usize) -> Self {
        Self {
            candidates: Candidates::new(key, units),
            seen: HashSet::new(),
            units,
        }
    }
}

impl Iterator for Positions<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.seen.len() >= self.units {
            return None;
        }
        let seen = &mut self.seen;
        self.candidates.by_ref().find(|idx| seen.insert(*idx))
    }
}

/// The first `bits` distinct positions over `units` addressable units.
pub fn generate(key: &StegoKey, units: usize, bits: usize) -> Result<Vec<usize>> {
    if bits > units {
        return Err(NestError::PositionCapacity {
            requested: bits,
            available: units,
        });
    }

    Ok(Positions::new(key, units).take(bits).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> StegoKey {
        StegoKey::from([seed; 32])
    }

    #[test]
    fn should_be_reproducible() {
        let a = generate(&key(1), 10_000, 500).unwrap();
        let b = generate(&key(1), 10_000, 500).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
    }

    #[test]
    fn should_depend_on_the_key() {
        let a = generate(&key(1), 10_000, 64).unwrap();
        let b = generate(&key(2), 10_000, 64).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn should_yield_distinct_in_range_positions() {
        let positions = generate(&key(3), 300, 300).unwrap();
        let distinct: HashSet<_> = positions.iter().copied().collect();

        assert_eq!(distinct.len(), 300);
        assert!(positions.iter().all(|p| *p < 300));
    }

    #[test]
    fn should_be_prefix_stable() {
        let short = generate(&key(4), 5_000, 72).unwrap();
        let long = generate(&key(4), 5_000, 1_000).unwrap();

        assert_eq!(&long[..72], &short[..]);
    }

    #[test]
    fn should_follow_the_hash_counter_construction() {
        let k = key(5);
        let mut hasher = Sha256::new();
        hasher.update(k.as_bytes());
        hasher.update(0u64.to_be_bytes());
        let digest = hasher.finalize();
        let first = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize;

        let positions = generate(&k, 1_000_003, 1).unwrap();
        assert_eq!(positions, vec![first % 1_000_003]);
    }

    #[test]
    fn should_refuse_more_bits_than_units() {
        let result = generate(&key(6), 10, 11);

        assert!(matches!(
            result,
            Err(NestError::PositionCapacity {
                requested: 11,
                available: 10
            })
        ));
    }

    #[test]
    fn should_end_when_all_units_are_used() {
        let stego_key = key(7);
        let mut positions = Positions::new(&stego_key, 4);
        let drawn: Vec<_> = positions.by_ref().take(10).collect();

        assert_eq!(drawn.len(), 4);
        assert_eq!(positions.next(), None);
        assert!(generate(&key(7), 0, 0).unwrap().is_empty());
    }
}
