// File: src/core/lm_state.rs
use crate::config::reserved_symbols;
use crate::core::count::Count;
use crate::core::types::Symbol;
use crate::error::{LmStateError, LmStateResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer counts for one history: `counts` is sorted by word, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntLmState {
    pub history: Vec<Symbol>,
    pub counts: Vec<(Symbol, i32)>,
}

/// Float counts for one history, plus the total mass and the discounted
/// mass reserved for backoff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatLmState {
    pub history: Vec<Symbol>,
    pub total: f32,
    pub discount: f32,
    pub counts: Vec<(Symbol, f32)>,
}

/// `Count`-valued statistics for one history. The values may be derivatives,
/// so unlike the other two states they are not required to be positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralLmState {
    pub history: Vec<Symbol>,
    pub counts: Vec<(Symbol, Count)>,
}

fn check_history(history: &[Symbol]) -> LmStateResult<()> {
    let eos = reserved_symbols().eos;
    for (i, &word) in history.iter().enumerate() {
        if word <= 0 || word == eos {
            return Err(LmStateError::Invariant(format!(
                "history[{}] = {} is not a valid history symbol",
                i, word
            )));
        }
    }
    Ok(())
}

/// Checks the predicted words: non-empty, positive, not BOS, strictly increasing.
fn check_words<V>(counts: &[(Symbol, V)]) -> LmStateResult<()> {
    if counts.is_empty() {
        return Err(LmStateError::Invariant("state has no counts".to_string()));
    }
    let bos = reserved_symbols().bos;
    for (i, &(word, _)) in counts.iter().enumerate() {
        if word <= 0 || word == bos {
            return Err(LmStateError::Invariant(format!(
                "counts[{}] has invalid predicted word {}",
                i, word
            )));
        }
    }
    for pair in counts.windows(2) {
        if pair[0].0 >= pair[1].0 {
            return Err(LmStateError::Invariant(format!(
                "counts not strictly increasing: {} then {}",
                pair[0].0, pair[1].0
            )));
        }
    }
    Ok(())
}

impl IntLmState {
    pub fn validate(&self) -> LmStateResult<()> {
        check_history(&self.history)?;
        check_words(&self.counts)?;
        if let Some(&(word, count)) = self.counts.iter().find(|&&(_, c)| c <= 0) {
            return Err(LmStateError::Invariant(format!(
                "word {} has non-positive count {}",
                word, count
            )));
        }
        Ok(())
    }
}

impl FloatLmState {
    pub fn validate(&self) -> LmStateResult<()> {
        check_history(&self.history)?;
        check_words(&self.counts)?;
        // `!(c > 0.0)` so that NaN fails too.
        if let Some(&(word, count)) = self.counts.iter().find(|&&(_, c)| !(c > 0.0)) {
            return Err(LmStateError::Invariant(format!(
                "word {} has non-positive count {}",
                word, count
            )));
        }
        Ok(())
    }
}

impl GeneralLmState {
    pub fn validate(&self) -> LmStateResult<()> {
        check_history(&self.history)?;
        check_words(&self.counts)
    }
}

fn write_history(f: &mut fmt::Formatter<'_>, history: &[Symbol]) -> fmt::Result {
    write!(f, " [ ")?;
    for word in history {
        write!(f, "{} ", word)?;
    }
    write!(f, "]: ")
}

fn write_counts<V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    counts: &[(Symbol, V)],
) -> fmt::Result {
    for (word, value) in counts {
        write!(f, "{}->{} ", word, value)?;
    }
    writeln!(f)
}

impl fmt::Display for IntLmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_history(f, &self.history)?;
        write_counts(f, &self.counts)?;
        if cfg!(debug_assertions) {
            if let Err(e) = self.validate() {
                debug_assert!(false, "rendered an invalid IntLmState: {}", e);
            }
        }
        Ok(())
    }
}

impl fmt::Display for FloatLmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_history(f, &self.history)?;
        write!(f, "total={} discount={} ", self.total, self.discount)?;
        write_counts(f, &self.counts)
    }
}

impl fmt::Display for GeneralLmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_history(f, &self.history)?;
        write_counts(f, &self.counts)
    }
}
