// src/core/mod.rs

pub mod builder;
pub mod count;
pub mod lm_state;
pub mod types;
