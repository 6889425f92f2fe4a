//! The similarity-gated access check shared by KILL, SHARE, and offspring
//! placement.

use crate::cell::Cell;
use crate::prng::Prng;

/// Sense of an interaction: negative (KILL-like) or positive (SHARE-like).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Negative,
    Positive,
}

/// Stochastic, asymmetric access gate.
///
/// Draws exactly one 4-bit random value. Freshly seeded or killed cells
/// (`parent_id == 0`) are always accessible, independent of `sense` or the
/// draw. Otherwise compares the draw `r` against the Hamming distance `d`
/// between `target`'s first codon and `guess`'s low 4 bits: negative senses
/// are more permissive the more dissimilar the guess, positive senses the
/// more similar.
pub fn access_allowed(target: &Cell, guess: u8, sense: Sense, prng: &mut Prng) -> bool {
    if target.parent_id == 0 {
        return true;
    }
    let d = (target.genome.first_codon() ^ (guess & 0xf)).count_ones();
    let r = (prng.next_u64() & 0xf) as u32;
    match sense {
        Sense::Negative => r <= d,
        Sense::Positive => r >= d,
    }
}
