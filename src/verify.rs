// File: src/verify.rs
use crate::error::{LmStateError, LmStateResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How often the codec runs `validate()` on the records passing through it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyPolicy {
    Always,
    Sampled { rate: f64 },
    Never,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        VerifyPolicy::Always
    }
}

impl VerifyPolicy {
    /// One record in ten, the rate used for reads and for general-state writes.
    pub fn reference_read() -> Self {
        VerifyPolicy::Sampled { rate: 0.1 }
    }

    /// One record in two, the rate used when writing integer states.
    pub fn reference_write_int() -> Self {
        VerifyPolicy::Sampled { rate: 0.5 }
    }

    pub fn check(&self) -> LmStateResult<()> {
        match *self {
            VerifyPolicy::Sampled { rate } if !(0.0..=1.0).contains(&rate) => Err(
                LmStateError::Config(format!("sampling rate must be in [0, 1], got {}", rate)),
            ),
            _ => Ok(()),
        }
    }
}

/// Decides, call by call, whether a record gets validated. Holds the only
/// randomness on the codec path.
#[derive(Debug, Clone)]
pub struct Verifier {
    policy: VerifyPolicy,
    rng: Option<StdRng>,
}

impl Verifier {
    pub fn always() -> Self {
        Self {
            policy: VerifyPolicy::Always,
            rng: None,
        }
    }

    pub fn never() -> Self {
        Self {
            policy: VerifyPolicy::Never,
            rng: None,
        }
    }

    pub fn sampled(rate: f64) -> Self {
        Self::from_policy(VerifyPolicy::Sampled { rate }, None)
    }

    /// `seed` only matters for `Sampled`; without one the generator is seeded from entropy.
    pub fn from_policy(policy: VerifyPolicy, seed: Option<u64>) -> Self {
        let rng = match policy {
            VerifyPolicy::Sampled { .. } => Some(match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            }),
            _ => None,
        };
        Self { policy, rng }
    }

    pub fn policy(&self) -> VerifyPolicy {
        self.policy
    }

    pub fn should_verify(&mut self) -> bool {
        match (self.policy, self.rng.as_mut()) {
            (VerifyPolicy::Always, _) => true,
            (VerifyPolicy::Never, _) => false,
            (VerifyPolicy::Sampled { rate }, Some(rng)) => {
                let p = if rate.is_nan() { 1.0 } else { rate.clamp(0.0, 1.0) };
                let hit = rng.gen_bool(p);
                tracing::debug!("sampled verification (rate {}): {}", rate, hit);
                hit
            }
            (VerifyPolicy::Sampled { .. }, None) => true,
        }
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::always()
    }
}
