//! # Codec Tests: lm-state streams
//!
//! Round-trips each state kind through its binary layout, checks that
//! implausible headers are rejected before any entry bytes are read, and
//! exercises multi-record streams on disk.

use lm_state_core::persistence::{load_states, save_states, StateReader};
use lm_state_core::{
    Count, FloatLmState, GeneralLmState, IntLmState, LmStateCodec, LmStateError, Verifier,
};
use std::io::{Cursor, Read};

fn int_state() -> IntLmState {
    IntLmState {
        history: vec![1, 14, 3],
        counts: vec![(2, 7), (5, 1), (300, 12)],
    }
}

fn float_state() -> FloatLmState {
    FloatLmState {
        history: vec![9],
        total: 4.75,
        discount: 0.625,
        counts: vec![(2, 0.125), (4, 3.0), (11, 1.625)],
    }
}

fn general_state() -> GeneralLmState {
    GeneralLmState {
        history: vec![],
        counts: vec![
            (
                3,
                Count {
                    total: 6.0,
                    top1: 3.0,
                    top2: 2.0,
                    top3: 1.0,
                },
            ),
            (8, Count::new(-0.5)),
        ],
    }
}

fn round_trip<S: LmStateCodec>(state: &S) -> S {
    let mut buf = Vec::new();
    state.write_to(&mut buf, &mut Verifier::always()).unwrap();
    let mut src = Cursor::new(buf);
    let back = S::read_from(&mut src, &mut Verifier::always()).unwrap();
    assert_eq!(src.position() as usize, src.get_ref().len(), "trailing bytes left unread");
    back
}

/// Every kind decodes to exactly what was encoded, extra scalars included.
#[test]
fn test_round_trip_all_kinds() {
    assert_eq!(round_trip(&int_state()), int_state());
    assert_eq!(round_trip(&float_state()), float_state());
    assert_eq!(round_trip(&general_state()), general_state());
}

/// A history of the maximum plausible length still round-trips.
#[test]
fn test_round_trip_longest_history() {
    let state = IntLmState {
        history: vec![7; 10000],
        counts: vec![(3, 1)],
    };
    assert_eq!(round_trip(&state), state);

    let too_long = IntLmState {
        history: vec![7; 10001],
        counts: vec![(3, 1)],
    };
    let mut buf = Vec::new();
    assert!(too_long.write_to(&mut buf, &mut Verifier::never()).is_err());
    assert!(buf.is_empty());
}

/// Reader that counts how many bytes were pulled from it.
struct CountingReader<R> {
    inner: R,
    consumed: usize,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n;
        Ok(n)
    }
}

/// Negative or oversized history lengths and non-positive entry counts fail
/// as implausible data without consuming anything past the header.
#[test]
fn test_boundary_rejection() {
    let cases: [(i32, i32, usize); 4] = [(-1, 3, 4), (10001, 3, 4), (2, 0, 8), (2, -4, 8)];
    for (history_len, num_counts, header_bytes) in cases {
        let mut bytes = history_len.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&num_counts.to_ne_bytes());
        bytes.extend_from_slice(&[0xAB; 64]);

        let mut src = CountingReader {
            inner: Cursor::new(bytes),
            consumed: 0,
        };
        let err = GeneralLmState::read_from(&mut src, &mut Verifier::always()).unwrap_err();
        assert!(matches!(err, LmStateError::Implausible { .. }), "{:?}", err);
        assert!(err.is_corruption());
        assert_eq!(src.consumed, header_bytes);
    }
}

/// A stream cut mid-record produces an error and no record.
#[test]
fn test_truncated_stream_yields_nothing() {
    let mut buf = Vec::new();
    float_state().write_to(&mut buf, &mut Verifier::always()).unwrap();
    for cut in [3, 8, 12, 17, buf.len() - 1] {
        let mut src = Cursor::new(buf[..cut].to_vec());
        let err = FloatLmState::read_from(&mut src, &mut Verifier::always()).unwrap_err();
        assert!(matches!(err, LmStateError::Truncated { .. }), "cut at {}: {:?}", cut, err);
    }
}

/// A reader over several concatenated records yields them in order, then stops.
#[test]
fn test_state_reader_iterates_stream() {
    let states = vec![
        int_state(),
        IntLmState {
            history: vec![4],
            counts: vec![(6, 2)],
        },
        IntLmState {
            history: vec![],
            counts: vec![(2, 1), (3, 1)],
        },
    ];
    let mut buf = Vec::new();
    let mut verifier = Verifier::always();
    for s in &states {
        s.write_to(&mut buf, &mut verifier).unwrap();
    }
    let read: Vec<IntLmState> =
        StateReader::<_, IntLmState>::new(Cursor::new(buf.clone()), Verifier::always())
            .collect::<Result<_, _>>()
            .unwrap();
    assert_eq!(read, states);

    // Chop the last record: the first two still come back, then one error.
    buf.truncate(buf.len() - 3);
    let results: Vec<_> =
        StateReader::<_, IntLmState>::new(Cursor::new(buf), Verifier::always()).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert!(results[2].is_err());
}

/// Atomic save followed by load returns the same records.
#[test]
fn test_save_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("stats.general");
    let states = vec![general_state(), general_state()];

    save_states(&states, &path, &mut Verifier::always()).unwrap();
    let loaded: Vec<GeneralLmState> = load_states(&path, Verifier::always()).unwrap();
    assert_eq!(loaded, states);
}

/// Verification off lets an invalid state through; sampling at rate 1 catches it.
#[test]
fn test_verification_policy_is_caller_selected() {
    let bad = FloatLmState {
        counts: vec![(3, -1.0)],
        ..float_state()
    };
    let mut buf = Vec::new();
    assert!(matches!(
        bad.write_to(&mut buf, &mut Verifier::always()),
        Err(LmStateError::Invariant(_))
    ));
    assert!(buf.is_empty());

    bad.write_to(&mut buf, &mut Verifier::never()).unwrap();
    let mut src = Cursor::new(buf);
    let err = FloatLmState::read_from(&mut src, &mut Verifier::sampled(1.0)).unwrap_err();
    assert!(matches!(err, LmStateError::Invariant(_)));
    assert!(!err.is_corruption());
}
