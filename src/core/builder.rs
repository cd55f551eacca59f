// File: src/core/builder.rs
use crate::core::count::Count;
use crate::core::lm_state::{GeneralLmState, IntLmState};
use crate::core::types::Symbol;
use crate::error::{LmStateError, LmStateResult};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Merges count contributions for a single history into one sorted list.
///
/// Words map to a dense slot in `counts`; sorting is deferred to `output()`,
/// so each contribution is O(1) amortized. `clear()` keeps the allocations,
/// so one builder can be reused across every history in a stream.
#[derive(Debug, Clone, Default)]
pub struct GeneralLmStateBuilder {
    word_to_pos: HashMap<Symbol, usize>,
    counts: Vec<Count>,
}

impl GeneralLmStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct words seen since construction or the last `clear()`.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.word_to_pos.clear();
        self.counts.clear();
    }

    /// Finds the slot for `word`, opening an empty count if the word is new,
    /// and hands it to `merge`. First and later contributions take the same path.
    fn upsert(&mut self, word: Symbol, merge: impl FnOnce(&mut Count)) {
        let pos = match self.word_to_pos.entry(word) {
            Entry::Vacant(slot) => {
                slot.insert(self.counts.len());
                self.counts.push(Count::default());
                self.counts.len() - 1
            }
            Entry::Occupied(slot) => *slot.get(),
        };
        debug_assert!(pos < self.counts.len());
        merge(&mut self.counts[pos]);
    }

    pub fn add_count(&mut self, word: Symbol, value: f32) {
        self.upsert(word, |c| c.add(value));
    }

    /// Adds `num_pieces` pieces of size `scale`.
    pub fn add_scaled_count(&mut self, word: Symbol, scale: f32, num_pieces: i32) {
        self.upsert(word, |c| c.add_pieces(scale, num_pieces));
    }

    pub fn add_count_from(&mut self, word: Symbol, count: &Count) {
        self.upsert(word, |c| c.merge(count));
    }

    /// Folds in an integer state, each of its counts becoming that many pieces of size `scale`.
    pub fn add_int_counts(&mut self, lm_state: &IntLmState, scale: f32) {
        for &(word, count) in &lm_state.counts {
            self.add_scaled_count(word, scale, count);
        }
    }

    pub fn add_general_counts(&mut self, lm_state: &GeneralLmState) {
        for (word, count) in &lm_state.counts {
            self.add_count_from(*word, count);
        }
    }

    /// The merged counts, sorted by word.
    pub fn output(&self) -> LmStateResult<Vec<(Symbol, Count)>> {
        if self.counts.is_empty() {
            return Err(LmStateError::EmptyBuilder);
        }
        debug_assert_eq!(self.counts.len(), self.word_to_pos.len());
        let mut pairs: Vec<(Symbol, usize)> = self
            .word_to_pos
            .iter()
            .map(|(&word, &pos)| (word, pos))
            .collect();
        pairs.sort_unstable();
        Ok(pairs
            .into_iter()
            .map(|(word, pos)| (word, self.counts[pos]))
            .collect())
    }

    /// `output()` wrapped up as a state for `history`.
    pub fn finish(&self, history: Vec<Symbol>) -> LmStateResult<GeneralLmState> {
        Ok(GeneralLmState {
            history,
            counts: self.output()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(out: &[(Symbol, Count)]) -> Vec<(Symbol, f32)> {
        out.iter().map(|(w, c)| (*w, c.total)).collect()
    }

    #[test]
    fn worked_example() {
        let mut b = GeneralLmStateBuilder::new();
        b.add_count(5, 2.0);
        b.add_count(5, 3.0);
        b.add_count(7, 1.0);
        let out = b.output().unwrap();
        assert_eq!(totals(&out), vec![(5, 5.0), (7, 1.0)]);
        assert_eq!((out[0].1.top1, out[0].1.top2), (3.0, 2.0));
    }

    #[test]
    fn empty_builder_is_an_error() {
        let b = GeneralLmStateBuilder::new();
        assert!(b.is_empty());
        assert!(matches!(b.output(), Err(LmStateError::EmptyBuilder)));
        assert!(matches!(b.finish(vec![3]), Err(LmStateError::EmptyBuilder)));
    }

    #[test]
    fn output_is_sorted_and_unique() {
        let mut b = GeneralLmStateBuilder::new();
        for &w in &[40, 3, 17, 3, 99, 40, 5, 17] {
            b.add_count(w, 1.0);
        }
        let words: Vec<Symbol> = b.output().unwrap().into_iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec![3, 5, 17, 40, 99]);
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn clear_returns_to_empty() {
        let mut b = GeneralLmStateBuilder::new();
        b.add_count(4, 1.0);
        b.clear();
        assert!(b.is_empty());
        assert!(b.output().is_err());
    }

    #[test]
    fn int_counts_are_scaled_pieces() {
        let state = IntLmState {
            history: vec![3],
            counts: vec![(4, 2), (6, 5)],
        };
        let mut via_state = GeneralLmStateBuilder::new();
        via_state.add_int_counts(&state, 0.5);
        let mut direct = GeneralLmStateBuilder::new();
        direct.add_scaled_count(4, 0.5, 2);
        direct.add_scaled_count(6, 0.5, 5);
        assert_eq!(via_state.output().unwrap(), direct.output().unwrap());
        assert_eq!(totals(&via_state.output().unwrap()), vec![(4, 1.0), (6, 2.5)]);
    }

    #[test]
    fn negative_then_positive_equals_reverse() {
        let mut a = GeneralLmStateBuilder::new();
        a.add_count(5, -1.0);
        a.add_count(5, 2.0);
        let mut b = GeneralLmStateBuilder::new();
        b.add_count(5, 2.0);
        b.add_count(5, -1.0);
        assert_eq!(a.output().unwrap(), b.output().unwrap());
    }

    #[test]
    fn general_counts_merge_unscaled() {
        let mut first = GeneralLmStateBuilder::new();
        first.add_count(8, 2.0);
        first.add_count(9, 1.0);
        let state = first.finish(vec![5]).unwrap();

        let mut b = GeneralLmStateBuilder::new();
        b.add_count(8, 1.0);
        b.add_general_counts(&state);
        assert_eq!(totals(&b.output().unwrap()), vec![(8, 3.0), (9, 1.0)]);
    }
}
