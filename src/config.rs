// File: src/config.rs
use crate::codec::LmStateCodec;
use crate::core::types::{Symbol, DEFAULT_BOS_SYMBOL, DEFAULT_EOS_SYMBOL};
use crate::error::{LmStateError, LmStateResult};
use crate::verify::{VerifyPolicy, Verifier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// The two reserved symbols with positional restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedSymbols {
    pub bos: Symbol,
    pub eos: Symbol,
}

impl Default for ReservedSymbols {
    fn default() -> Self {
        Self {
            bos: DEFAULT_BOS_SYMBOL,
            eos: DEFAULT_EOS_SYMBOL,
        }
    }
}

static RESERVED: OnceLock<ReservedSymbols> = OnceLock::new();

/// Installs the process-wide reserved symbols. Installing the same pair twice is
/// fine; a different pair after the first install is an error.
pub fn install_reserved_symbols(symbols: ReservedSymbols) -> LmStateResult<()> {
    if symbols.bos <= 0 || symbols.eos <= 0 || symbols.bos == symbols.eos {
        return Err(LmStateError::Config(format!(
            "reserved symbols must be distinct and positive, got bos={} eos={}",
            symbols.bos, symbols.eos
        )));
    }
    let installed = RESERVED.get_or_init(|| symbols);
    if *installed != symbols {
        tracing::warn!(
            "Reserved symbols already installed as bos={} eos={}; refusing bos={} eos={}",
            installed.bos, installed.eos, symbols.bos, symbols.eos
        );
        return Err(LmStateError::Config("reserved symbols already installed".to_string()));
    }
    Ok(())
}

/// The installed reserved symbols, or the defaults if nothing was installed.
pub fn reserved_symbols() -> ReservedSymbols {
    RESERVED.get().copied().unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LmStateConfig {
    pub bos_symbol: Symbol,
    pub eos_symbol: Symbol,
    pub read_verify: VerifyPolicy,
    /// `None` writes each kind at its own reference rate.
    pub write_verify: Option<VerifyPolicy>,
    /// Fixes the sampling sequence, mostly for tests.
    pub seed: Option<u64>,
}

impl Default for LmStateConfig {
    fn default() -> Self {
        Self {
            bos_symbol: DEFAULT_BOS_SYMBOL,
            eos_symbol: DEFAULT_EOS_SYMBOL,
            read_verify: VerifyPolicy::reference_read(),
            write_verify: None,
            seed: None,
        }
    }
}

impl LmStateConfig {
    pub fn from_json_str(json: &str) -> LmStateResult<Self> {
        let config: LmStateConfig = serde_json::from_str(json)?;
        config.read_verify.check()?;
        if let Some(policy) = config.write_verify {
            policy.check()?;
        }
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> LmStateResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn reserved(&self) -> ReservedSymbols {
        ReservedSymbols {
            bos: self.bos_symbol,
            eos: self.eos_symbol,
        }
    }

    /// Installs this config's reserved symbols process-wide.
    pub fn install(&self) -> LmStateResult<()> {
        install_reserved_symbols(self.reserved())
    }

    pub fn read_verifier(&self) -> Verifier {
        Verifier::from_policy(self.read_verify, self.seed)
    }

    /// Verifier for writing records of kind `S`.
    pub fn write_verifier<S: LmStateCodec>(&self) -> Verifier {
        let policy = self.write_verify.unwrap_or_else(S::reference_write_policy);
        // Different stream from the reader when seeded, so the two don't sample in lockstep.
        Verifier::from_policy(policy, self.seed.map(|s| s.wrapping_add(1)))
    }
}
