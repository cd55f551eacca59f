// src/lib.rs

pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod persistence;
pub mod verify;

pub use crate::codec::LmStateCodec;
pub use crate::core::builder::GeneralLmStateBuilder;
pub use crate::core::count::Count;
pub use crate::core::lm_state::{FloatLmState, GeneralLmState, IntLmState};
pub use crate::error::{LmStateError, LmStateResult};
pub use crate::verify::{VerifyPolicy, Verifier};
