//! Accuracy tiers and the tolerances they imply.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute/relative thresholds applied when validating a returned point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Absolute tolerance
    pub eps_abs: f64,
    /// Relative tolerance (scaled by the magnitude of the checked terms)
    pub eps_rel: f64,
}

impl Tolerances {
    /// `eps_abs + eps_rel * scale`
    #[inline]
    pub fn threshold(&self, scale: f64) -> f64 {
        self.eps_abs + self.eps_rel * scale
    }
}

/// Named tolerance bundle applied uniformly to every solver in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// eps_abs = 1e-3, eps_rel = 1e-4
    #[default]
    Low,
    /// eps_abs = 1e-8, eps_rel = 1e-9
    High,
}

impl Accuracy {
    pub fn tolerances(self) -> Tolerances {
        match self {
            Accuracy::Low => Tolerances {
                eps_abs: 1e-3,
                eps_rel: 1e-4,
            },
            Accuracy::High => Tolerances {
                eps_abs: 1e-8,
                eps_rel: 1e-9,
            },
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accuracy::Low => write!(f, "low"),
            Accuracy::High => write!(f, "high"),
        }
    }
}
