//! Xorshift+ pseudo-random source
//!
//! A single stateful, non-reentrant 64-bit generator. Every other component
//! in this crate draws its randomness from exactly one `Prng`, owned by the
//! [`crate::scheduler::World`] and threaded through by `&mut` — there is no
//! free-standing global RNG.

use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Primary seed used when no override is supplied (see `Config::random_seed`).
pub const DEFAULT_SEED: u64 = 13;

/// Two-word xorshift+ generator state.
///
/// `state[0]` is always seeded to the caller's chosen seed (`13` by default,
/// per the reference behavior); `state[1]` is derived from a secondary seeded
/// source so that two runs with the same primary seed produce the same
/// stream without requiring bit-for-bit parity with any other implementation.
#[derive(Debug, Clone)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    /// Seed the generator from a single primary seed.
    ///
    /// `state[1]` is derived via `rand::rngs::StdRng::seed_from_u64(seed)`,
    /// which is already part of this crate's dependency stack; the exact
    /// derivation is not required to match any other implementation, only
    /// to be deterministic given `seed`.
    pub fn seeded(seed: u64) -> Self {
        let mut secondary = StdRng::seed_from_u64(seed);
        Prng {
            state: [seed, secondary.next_u64()],
        }
    }

    /// Draw the next 64-bit word and advance the state.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state[0];
        let y = self.state[1];
        self.state[0] = y;
        x ^= x << 23;
        x ^= x >> 17;
        x ^= y ^ (y >> 26);
        self.state[1] = x;
        x.wrapping_add(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_seed() {
        let mut a = Prng::seeded(13);
        let mut b = Prng::seeded(13);
        for _ in 0..64 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Prng::seeded(13);
        let mut b = Prng::seeded(14);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn state0_starts_at_seed() {
        let prng = Prng::seeded(13);
        assert_eq!(prng.state[0], 13);
    }

    #[test]
    fn not_constant() {
        let mut p = Prng::seeded(13);
        let first = p.next_u64();
        let mut saw_different = false;
        for _ in 0..16 {
            if p.next_u64() != first {
                saw_different = true;
                break;
            }
        }
        assert!(saw_different);
    }
}
