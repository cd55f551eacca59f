// src/core/types.rs

/// An integer vocabulary id. Valid symbols are strictly positive.
pub type Symbol = i32;

/// Default begin-of-sentence symbol; it may appear in a history but is never predicted.
pub const DEFAULT_BOS_SYMBOL: Symbol = 1;
/// Default end-of-sentence symbol; it may be predicted but never appears in a history.
pub const DEFAULT_EOS_SYMBOL: Symbol = 2;

/// Longest history a reader will accept before deciding the stream is not an lm-state stream.
pub const MAX_HISTORY_LEN: i32 = 10000;

/// Width in bytes of every scalar header and history field.
pub const SCALAR_BYTES: usize = 4;
