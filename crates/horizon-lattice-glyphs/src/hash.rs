//! DJB2 hashing for cache keys.
//!
//! Cell contents are a handful of bytes, so the multiply-add hash described
//! by Daniel J. Bernstein is both cheap and good enough. Collisions are
//! resolved by the map through full content equality.

use std::hash::{BuildHasherDefault, Hasher};

/// Initial value of the DJB2 hash.
pub const DJB2_SEED: u32 = 5381;

/// Hash `bytes` with DJB2: `h = h * 33 + byte`, starting at [`DJB2_SEED`].
pub fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(DJB2_SEED, |h, &b| {
        h.wrapping_mul(33).wrapping_add(u32::from(b))
    })
}

/// Odd 64-bit multiplier (2^64 / golden ratio) used to widen a DJB2 value.
const SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Widen a 32-bit DJB2 value to the 64 bits a `HashMap` consumes.
///
/// The map takes its per-slot tag from the top bits, which a plain
/// zero-extension leaves at zero. Multiplying by an odd constant is a
/// bijection, so equal DJB2 values still map to equal map hashes.
pub fn spread(hash: u32) -> u64 {
    u64::from(hash).wrapping_mul(SPREAD)
}

/// Streaming [`Hasher`] accumulating the same state as [`djb2`].
///
/// [`finish`](Hasher::finish) returns the [`spread`] of that state.
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher {
    state: u32,
}

impl Djb2Hasher {
    /// The 32-bit DJB2 value of everything written so far.
    pub fn value(&self) -> u32 {
        self.state
    }
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { state: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = self.state.wrapping_mul(33).wrapping_add(u32::from(b));
        }
    }

    fn finish(&self) -> u64 {
        spread(self.state)
    }
}

/// `BuildHasher` for maps keyed by [`CharacterBuffer`](crate::CharacterBuffer).
pub type BuildDjb2Hasher = BuildHasherDefault<Djb2Hasher>;

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasher, Hash};

    use super::*;
    use crate::CharacterBuffer;

    #[test]
    fn empty_input_is_seed() {
        assert_eq!(djb2(b""), 5381);
    }

    #[test]
    fn known_values() {
        assert_eq!(djb2(b"a"), 5381 * 33 + 97);
        assert_eq!(djb2(b"ab"), (5381 * 33 + 97) * 33 + 98);
    }

    #[test]
    fn wraps_modulo_2_pow_32() {
        let long = [0xFFu8; 64];
        let expected = long
            .iter()
            .fold(5381u64, |h, &b| (h * 33 + u64::from(b)) % (1u64 << 32));
        assert_eq!(u64::from(djb2(&long)), expected);
    }

    #[test]
    fn hasher_matches_function() {
        let mut hasher = Djb2Hasher::default();
        hasher.write(b"he");
        hasher.write(b"llo");
        assert_eq!(hasher.value(), djb2(b"hello"));
        assert_eq!(hasher.finish(), spread(djb2(b"hello")));
    }

    #[test]
    fn finish_fills_the_top_bits() {
        let mut tags = std::collections::HashSet::new();
        for byte in 0..127u8 {
            let mut hasher = Djb2Hasher::default();
            hasher.write(&[byte]);
            tags.insert(hasher.finish() >> 57);
        }
        assert!(tags.len() > 64, "only {} distinct tags", tags.len());
        assert_ne!(spread(djb2(b"A")) >> 57, 0);
    }

    #[test]
    fn spread_keeps_collisions() {
        assert_eq!(djb2(b"Ab"), djb2(b"BA"));
        assert_eq!(spread(djb2(b"Ab")), spread(djb2(b"BA")));
        assert_ne!(spread(1), spread(2));
    }

    #[test]
    fn character_buffer_hashes_content_only() {
        let build = BuildDjb2Hasher::default();
        let a = CharacterBuffer::new_from_bytes(b"x").unwrap();
        let mut b = CharacterBuffer::new_from_bytes(b"a much longer buffer").unwrap();
        b.set_bytes(b"x").unwrap();

        let mut ha = build.build_hasher();
        a.hash(&mut ha);
        let mut hb = build.build_hasher();
        b.hash(&mut hb);

        assert_eq!(ha.finish(), hb.finish());
        assert_eq!(ha.finish(), spread(djb2(b"x")));
    }
}
