// File: src/codec.rs
//! Binary layouts for the three lm-state kinds.
//!
//! All scalars are 4 bytes in native byte order, packed with no padding:
//!
//! ```text
//! int:     history_len:i32 num_counts:i32 history:[i32] (word:i32 count:i32)*
//! float:   history_len:i32 num_counts:i32 total:f32 discount:f32
//!          history:[i32] (word:i32 count:f32)*
//! general: history_len:i32 num_counts:i32 history:[i32] (word:i32 count:Count)*
//! ```
//!
//! `Count` is `COUNT_BYTES` wide. These files are intermediate artifacts for a
//! single machine; nothing here is portable across architectures.

use crate::core::count::{Count, COUNT_BYTES};
use crate::core::lm_state::{FloatLmState, GeneralLmState, IntLmState};
use crate::core::types::{Symbol, MAX_HISTORY_LEN, SCALAR_BYTES};
use crate::error::{LmStateError, LmStateResult};
use crate::verify::{Verifier, VerifyPolicy};
use std::io::{Read, Write};

/// Stream encoding shared by every lm-state kind.
pub trait LmStateCodec: Sized {
    /// Name used in error messages.
    const KIND: &'static str;

    fn validate(&self) -> LmStateResult<()>;

    /// Write-side sampling rate used when the config does not set one.
    fn reference_write_policy() -> VerifyPolicy {
        VerifyPolicy::reference_read()
    }

    /// Appends the encoded record to `buf`. Nothing is appended on error.
    fn encode(&self, buf: &mut Vec<u8>) -> LmStateResult<()>;

    /// Reads one record, or `None` if the stream ends cleanly before it starts.
    fn decode_next<R: Read>(source: &mut R) -> LmStateResult<Option<Self>>;

    fn write_to<W: Write>(&self, sink: &mut W, verifier: &mut Verifier) -> LmStateResult<()> {
        if verifier.should_verify() {
            self.validate()?;
        }
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        sink.write_all(&buf).map_err(|source| {
            tracing::error!("Failure writing {} to stream: {}", Self::KIND, source);
            LmStateError::Write { what: Self::KIND, source }
        })
    }

    fn read_next<R: Read>(source: &mut R, verifier: &mut Verifier) -> LmStateResult<Option<Self>> {
        let state = match Self::decode_next(source)? {
            Some(state) => state,
            None => return Ok(None),
        };
        if verifier.should_verify() {
            state.validate()?;
        }
        Ok(Some(state))
    }

    /// Like `read_next`, but a stream that is already exhausted is an error.
    fn read_from<R: Read>(source: &mut R, verifier: &mut Verifier) -> LmStateResult<Self> {
        Self::read_next(source, verifier)?.ok_or(LmStateError::Truncated {
            what: Self::KIND,
            expected: SCALAR_BYTES,
            got: 0,
        })
    }
}

/// Reads up to `expected` bytes; fewer means the stream ended early.
fn read_bytes<R: Read>(
    source: &mut R,
    expected: usize,
    what: &'static str,
) -> LmStateResult<Vec<u8>> {
    // Grows with the data actually present rather than trusting `expected` up front.
    let mut buf = Vec::new();
    let got = source.by_ref().take(expected as u64).read_to_end(&mut buf)?;
    if got != expected {
        tracing::error!("Failure reading {}, expected {} bytes, got {}", what, expected, got);
        return Err(LmStateError::Truncated { what, expected, got });
    }
    Ok(buf)
}

fn ne_i32(bytes: &[u8]) -> i32 {
    let mut word = [0u8; SCALAR_BYTES];
    word.copy_from_slice(&bytes[..SCALAR_BYTES]);
    i32::from_ne_bytes(word)
}

fn ne_f32(bytes: &[u8]) -> f32 {
    let mut word = [0u8; SCALAR_BYTES];
    word.copy_from_slice(&bytes[..SCALAR_BYTES]);
    f32::from_ne_bytes(word)
}

/// Reads and sanity-checks `history_len` and `num_counts`, each before the next
/// read. `None` if the stream is at a clean end.
fn read_header<R: Read>(
    source: &mut R,
    what: &'static str,
) -> LmStateResult<Option<(usize, usize)>> {
    let mut first = Vec::with_capacity(SCALAR_BYTES);
    let got = source.by_ref().take(SCALAR_BYTES as u64).read_to_end(&mut first)?;
    if got == 0 {
        return Ok(None);
    }
    if got != SCALAR_BYTES {
        tracing::error!("Failure reading {}, expected {} bytes, got {}", what, SCALAR_BYTES, got);
        return Err(LmStateError::Truncated { what, expected: SCALAR_BYTES, got });
    }
    let history_len = ne_i32(&first);
    if !(0..=MAX_HISTORY_LEN).contains(&history_len) {
        tracing::error!("Reading {}: implausible history length {}", what, history_len);
        return Err(LmStateError::Implausible { what, value: history_len as i64 });
    }
    let num_counts = ne_i32(&read_bytes(source, SCALAR_BYTES, what)?);
    if num_counts <= 0 {
        tracing::error!("Reading {}: implausible number of counts {}", what, num_counts);
        return Err(LmStateError::Implausible { what, value: num_counts as i64 });
    }
    Ok(Some((history_len as usize, num_counts as usize)))
}

fn read_history<R: Read>(
    source: &mut R,
    history_len: usize,
    what: &'static str,
) -> LmStateResult<Vec<Symbol>> {
    if history_len == 0 {
        return Ok(Vec::new());
    }
    let bytes = read_bytes(source, history_len * SCALAR_BYTES, what)?;
    Ok(bytes.chunks_exact(SCALAR_BYTES).map(ne_i32).collect())
}

/// Refuses to encode what the reader would refuse to decode.
fn encode_header(
    buf: &mut Vec<u8>,
    history_len: usize,
    num_counts: usize,
    what: &'static str,
) -> LmStateResult<()> {
    if num_counts == 0 {
        return Err(LmStateError::Invariant(format!("cannot write {} with no counts", what)));
    }
    if history_len > MAX_HISTORY_LEN as usize || num_counts > i32::MAX as usize {
        return Err(LmStateError::Invariant(format!(
            "cannot write {}: history length {} / {} counts out of range",
            what, history_len, num_counts
        )));
    }
    buf.extend_from_slice(&(history_len as i32).to_ne_bytes());
    buf.extend_from_slice(&(num_counts as i32).to_ne_bytes());
    Ok(())
}

fn encode_history(buf: &mut Vec<u8>, history: &[Symbol]) {
    for word in history {
        buf.extend_from_slice(&word.to_ne_bytes());
    }
}

const INT_ENTRY_BYTES: usize = 2 * SCALAR_BYTES;
const FLOAT_ENTRY_BYTES: usize = 2 * SCALAR_BYTES;
const GENERAL_ENTRY_BYTES: usize = SCALAR_BYTES + COUNT_BYTES;

impl LmStateCodec for IntLmState {
    const KIND: &'static str = "IntLmState";

    fn validate(&self) -> LmStateResult<()> {
        IntLmState::validate(self)
    }

    fn reference_write_policy() -> VerifyPolicy {
        VerifyPolicy::reference_write_int()
    }

    fn encode(&self, buf: &mut Vec<u8>) -> LmStateResult<()> {
        let mut out = Vec::with_capacity(
            2 * SCALAR_BYTES
                + self.history.len() * SCALAR_BYTES
                + self.counts.len() * INT_ENTRY_BYTES,
        );
        encode_header(&mut out, self.history.len(), self.counts.len(), Self::KIND)?;
        encode_history(&mut out, &self.history);
        for &(word, count) in &self.counts {
            out.extend_from_slice(&word.to_ne_bytes());
            out.extend_from_slice(&count.to_ne_bytes());
        }
        buf.append(&mut out);
        Ok(())
    }

    fn decode_next<R: Read>(source: &mut R) -> LmStateResult<Option<Self>> {
        let (history_len, num_counts) = match read_header(source, Self::KIND)? {
            Some(header) => header,
            None => return Ok(None),
        };
        let history = read_history(source, history_len, "IntLmState history")?;
        let bytes = read_bytes(source, num_counts * INT_ENTRY_BYTES, "IntLmState counts")?;
        let counts = bytes
            .chunks_exact(INT_ENTRY_BYTES)
            .map(|entry| (ne_i32(entry), ne_i32(&entry[SCALAR_BYTES..])))
            .collect();
        Ok(Some(IntLmState { history, counts }))
    }
}

impl LmStateCodec for FloatLmState {
    const KIND: &'static str = "FloatLmState";

    fn validate(&self) -> LmStateResult<()> {
        FloatLmState::validate(self)
    }

    fn encode(&self, buf: &mut Vec<u8>) -> LmStateResult<()> {
        let mut out = Vec::with_capacity(
            4 * SCALAR_BYTES
                + self.history.len() * SCALAR_BYTES
                + self.counts.len() * FLOAT_ENTRY_BYTES,
        );
        encode_header(&mut out, self.history.len(), self.counts.len(), Self::KIND)?;
        out.extend_from_slice(&self.total.to_ne_bytes());
        out.extend_from_slice(&self.discount.to_ne_bytes());
        encode_history(&mut out, &self.history);
        for &(word, count) in &self.counts {
            out.extend_from_slice(&word.to_ne_bytes());
            out.extend_from_slice(&count.to_ne_bytes());
        }
        buf.append(&mut out);
        Ok(())
    }

    fn decode_next<R: Read>(source: &mut R) -> LmStateResult<Option<Self>> {
        let (history_len, num_counts) = match read_header(source, Self::KIND)? {
            Some(header) => header,
            None => return Ok(None),
        };
        let scalars = read_bytes(source, 2 * SCALAR_BYTES, "FloatLmState total/discount")?;
        let total = ne_f32(&scalars);
        let discount = ne_f32(&scalars[SCALAR_BYTES..]);
        let history = read_history(source, history_len, "FloatLmState history")?;
        let bytes = read_bytes(source, num_counts * FLOAT_ENTRY_BYTES, "FloatLmState counts")?;
        let counts = bytes
            .chunks_exact(FLOAT_ENTRY_BYTES)
            .map(|entry| (ne_i32(entry), ne_f32(&entry[SCALAR_BYTES..])))
            .collect();
        Ok(Some(FloatLmState { history, total, discount, counts }))
    }
}

impl LmStateCodec for GeneralLmState {
    const KIND: &'static str = "GeneralLmState";

    fn validate(&self) -> LmStateResult<()> {
        GeneralLmState::validate(self)
    }

    fn encode(&self, buf: &mut Vec<u8>) -> LmStateResult<()> {
        let mut out = Vec::with_capacity(
            2 * SCALAR_BYTES
                + self.history.len() * SCALAR_BYTES
                + self.counts.len() * GENERAL_ENTRY_BYTES,
        );
        encode_header(&mut out, self.history.len(), self.counts.len(), Self::KIND)?;
        encode_history(&mut out, &self.history);
        for (word, count) in &self.counts {
            out.extend_from_slice(&word.to_ne_bytes());
            count.write_to(&mut out)?;
        }
        buf.append(&mut out);
        Ok(())
    }

    fn decode_next<R: Read>(source: &mut R) -> LmStateResult<Option<Self>> {
        let (history_len, num_counts) = match read_header(source, Self::KIND)? {
            Some(header) => header,
            None => return Ok(None),
        };
        let history = read_history(source, history_len, "GeneralLmState history")?;
        let bytes = read_bytes(source, num_counts * GENERAL_ENTRY_BYTES, "GeneralLmState counts")?;
        let counts = bytes
            .chunks_exact(GENERAL_ENTRY_BYTES)
            .map(|entry| Ok((ne_i32(entry), Count::from_bytes(&entry[SCALAR_BYTES..])?)))
            .collect::<LmStateResult<Vec<_>>>()?;
        Ok(Some(GeneralLmState { history, counts }))
    }
}
