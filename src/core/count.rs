// File: src/core/count.rs
use crate::error::LmStateResult;
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Encoded width of one `Count`: four native-endian `f32`s.
pub const COUNT_BYTES: usize = 16;

/// A weighted, possibly fractional count.
///
/// `total` is the sum of every piece merged in. `top1 >= top2 >= top3` are the
/// three largest of the pieces seen plus three zero pieces, so a negative piece
/// never displaces a zero slot. This is what absolute discounting needs
/// downstream. Both parts are independent of merge order, so merging is
/// associative and commutative up to float rounding.
///
/// On disk the fields are written in declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Count {
    pub total: f32,
    pub top1: f32,
    pub top2: f32,
    pub top3: f32,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_native_endian()
}

impl Count {
    /// A single piece of size `value`.
    pub fn new(value: f32) -> Self {
        let mut count = Self::default();
        count.add(value);
        count
    }

    /// `num_pieces` pieces, each of size `scale`.
    pub fn from_pieces(scale: f32, num_pieces: i32) -> Self {
        let mut count = Self::default();
        count.add_pieces(scale, num_pieces);
        count
    }

    pub fn add(&mut self, value: f32) {
        self.total += value;
        self.insert_piece(value);
    }

    pub fn add_pieces(&mut self, scale: f32, num_pieces: i32) {
        self.total += scale * num_pieces as f32;
        // Only three pieces can ever land in the top slots.
        for _ in 0..num_pieces.clamp(0, 3) {
            self.insert_piece(scale);
        }
    }

    pub fn merge(&mut self, other: &Count) {
        self.total += other.total;
        for piece in [other.top1, other.top2, other.top3] {
            self.insert_piece(piece);
        }
    }

    fn insert_piece(&mut self, piece: f32) {
        if piece > self.top1 {
            self.top3 = self.top2;
            self.top2 = self.top1;
            self.top1 = piece;
        } else if piece > self.top2 {
            self.top3 = self.top2;
            self.top2 = piece;
        } else if piece > self.top3 {
            self.top3 = piece;
        }
    }

    pub fn write_to<W: Write>(&self, sink: &mut W) -> LmStateResult<()> {
        codec().serialize_into(sink, self)?;
        Ok(())
    }

    /// Decodes exactly `COUNT_BYTES` bytes.
    pub fn from_bytes(bytes: &[u8]) -> LmStateResult<Self> {
        Ok(codec().deserialize(&bytes[..COUNT_BYTES.min(bytes.len())])?)
    }
}

impl From<f32> for Count {
    fn from(value: f32) -> Self {
        Count::new(value)
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.total, self.top1, self.top2, self.top3)
    }
}
