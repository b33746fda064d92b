//! Tunable scan parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scan::{FuzzyParams, DEFAULT_CONTEXT_WINDOW};

/// Parameters for matching and context extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Characters of context on each side of a mention (default: 50)
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Fraction of a multi-token name required for a fuzzy match (default: 0.6)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Fuzzy window length as a multiple of the name's token count (default: 2)
    #[serde(default = "default_fuzzy_window_factor")]
    pub fuzzy_window_factor: usize,
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}
fn default_fuzzy_threshold() -> f64 {
    0.6
}
fn default_fuzzy_window_factor() -> usize {
    2
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            fuzzy_threshold: default_fuzzy_threshold(),
            fuzzy_window_factor: default_fuzzy_window_factor(),
        }
    }
}

impl ScanSettings {
    /// Reject values the matcher cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(SettingsError::FuzzyThreshold {
                value: self.fuzzy_threshold,
            });
        }
        if self.fuzzy_window_factor < 1 {
            return Err(SettingsError::WindowFactor {
                value: self.fuzzy_window_factor,
            });
        }
        Ok(())
    }

    pub fn fuzzy(&self) -> FuzzyParams {
        FuzzyParams {
            threshold: self.fuzzy_threshold,
            window_factor: self.fuzzy_window_factor,
        }
    }
}

/// Invalid scan settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("Fuzzy threshold must be in (0, 1]: {value}")]
    FuzzyThreshold { value: f64 },

    #[error("Fuzzy window factor must be at least 1: {value}")]
    WindowFactor { value: usize },
}
