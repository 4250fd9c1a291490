//! Shuffling for question selection and option ordering.
//!
//! Every call draws from the supplied RNG; nothing is seeded here, so two
//! rounds built from the same pool are independent.

use rand::Rng;

use crate::model::{Category, Question, OPTION_COUNT};

/// In-place Fisher–Yates shuffle.
///
/// Walks from the last index down to 1, swapping each element with a
/// uniformly chosen index in `0..=i`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Return a shuffled copy, leaving the input untouched.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut copy = items.to_vec();
    shuffle(&mut copy, rng);
    copy
}

/// Maps on-screen option positions back to the stored option order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionOrder {
    /// `presentation_to_original[p]` is the stored index shown at position `p`.
    presentation_to_original: [usize; OPTION_COUNT],
}

impl OptionOrder {
    /// The unshuffled order.
    pub fn identity() -> Self {
        let mut order = [0; OPTION_COUNT];
        for (i, slot) in order.iter_mut().enumerate() {
            *slot = i;
        }
        Self {
            presentation_to_original: order,
        }
    }

    /// A fresh uniformly random order.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut order = Self::identity();
        shuffle(&mut order.presentation_to_original, rng);
        order
    }

    /// Build from an explicit permutation. Returns `None` if `order` is not
    /// a permutation of `0..OPTION_COUNT`.
    pub fn from_permutation(order: [usize; OPTION_COUNT]) -> Option<Self> {
        let mut seen = [false; OPTION_COUNT];
        for &i in &order {
            if i >= OPTION_COUNT || seen[i] {
                return None;
            }
            seen[i] = true;
        }
        Some(Self {
            presentation_to_original: order,
        })
    }

    pub fn to_original(&self, presentation_index: usize) -> Option<usize> {
        self.presentation_to_original.get(presentation_index).copied()
    }

    pub fn to_presentation(&self, original_index: usize) -> Option<usize> {
        self.presentation_to_original
            .iter()
            .position(|&o| o == original_index)
    }

    /// Options in on-screen order.
    pub fn present<'a>(&self, options: &'a [String; OPTION_COUNT]) -> [&'a str; OPTION_COUNT] {
        self.presentation_to_original.map(|o| options[o].as_str())
    }
}

/// Pick the questions for one round.
///
/// Filters the pool by category (`General` keeps everything). If fewer
/// than `round_size` questions match, the whole pool is used instead. The
/// result is the first `round_size` entries of a shuffled copy.
pub fn select_round<R: Rng + ?Sized>(
    pool: &[Question],
    category: Category,
    round_size: usize,
    rng: &mut R,
) -> Vec<Question> {
    let filtered: Vec<Question> = if category == Category::General {
        pool.to_vec()
    } else {
        pool.iter()
            .filter(|q| q.category == category)
            .cloned()
            .collect()
    };

    let candidates = if filtered.len() < round_size {
        tracing::debug!(
            "only {} questions in '{category}', falling back to the full pool of {}",
            filtered.len(),
            pool.len()
        );
        pool.to_vec()
    } else {
        filtered
    };

    let mut round = shuffled(&candidates, rng);
    round.truncate(round_size);
    round
}
