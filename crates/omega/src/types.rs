//! Value types for Ω scoring.
//!
//! A [`MetricRecord`] carries the raw inputs for one shard, an [`OmegaScore`]
//! carries a computed result in `[0.0, 1.0]`, and [`OmegaWeights`] fixes how
//! the inputs are combined.

use serde::{Deserialize, Serialize};

use crate::{scoring, MetricField, OmegaError};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The five metric inputs to the Ω formula.
///
/// Records are plain values. [`MetricRecord::clamped`] and
/// [`MetricRecord::with_auxiliary`] return new records; nothing mutates a
/// record after construction.
///
/// Raw records may hold any `f64`. Only after [`MetricRecord::validate`] and
/// [`MetricRecord::clamped`] is every field guaranteed to lie in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Ψ — coherence.
    pub psi: f64,
    /// Θ — stability.
    pub theta: f64,
    /// CVaR — risk. Higher values lower the score.
    pub cvar: f64,
    /// PoLE — auxiliary signal, `0.0` when absent.
    #[serde(default)]
    pub pole: f64,
    /// COG — auxiliary signal, `0.0` when absent.
    #[serde(default)]
    pub cog: f64,
}

impl MetricRecord {
    /// Creates a record from the three core metrics; `pole` and `cog` are `0.0`.
    pub fn new(psi: f64, theta: f64, cvar: f64) -> Self {
        Self {
            psi,
            theta,
            cvar,
            pole: 0.0,
            cog: 0.0,
        }
    }

    /// Returns a copy of this record with the auxiliary signals set.
    #[must_use]
    pub fn with_auxiliary(self, pole: f64, cog: f64) -> Self {
        Self { pole, cog, ..self }
    }

    /// Returns the value of `field`.
    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Psi => self.psi,
            MetricField::Theta => self.theta,
            MetricField::Cvar => self.cvar,
            MetricField::Pole => self.pole,
            MetricField::Cog => self.cog,
        }
    }

    /// See [`scoring::validate`].
    pub fn validate(&self) -> Result<(), OmegaError> {
        scoring::validate(self)
    }

    /// See [`scoring::clamp`].
    #[must_use]
    pub fn clamped(&self) -> Self {
        scoring::clamp(self)
    }

    /// Validates the record and returns its score.
    pub fn omega(&self) -> Result<OmegaScore, OmegaError> {
        self.validate()?;
        Ok(scoring::score(&self.clamped()))
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Coefficients of the Ω formula.
///
/// `omega = psi·Ψ + theta·Θ + risk·(1 − CVaR) + pole·PoLE + cog·COG`
///
/// The coefficients sum to `1.0`, which keeps the score of a clamped record
/// inside `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OmegaWeights {
    /// Weight of coherence.
    pub psi: f64,
    /// Weight of stability.
    pub theta: f64,
    /// Weight of the inverted risk term `1 − cvar`.
    pub risk: f64,
    /// Weight of PoLE.
    pub pole: f64,
    /// Weight of COG.
    pub cog: f64,
}

impl OmegaWeights {
    /// The standard weighting.
    pub const STANDARD: OmegaWeights = OmegaWeights {
        psi: 0.4,
        theta: 0.3,
        risk: 0.2,
        pole: 0.05,
        cog: 0.05,
    };

    /// Sum of all coefficients.
    pub fn total(&self) -> f64 {
        self.psi + self.theta + self.risk + self.pole + self.cog
    }
}

impl Default for OmegaWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// A computed Ω score in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OmegaScore(f64);

impl OmegaScore {
    /// Creates an [`OmegaScore`], returning `None` if `value` is outside
    /// the valid range `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the score as an `f64` in `[0.0, 1.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    // Only `scoring::score` builds scores this way; its inputs are clamped and
    // its weights are convex.
    pub(crate) fn from_convex(value: f64) -> Self {
        Self(value.min(1.0).max(0.0))
    }
}

impl std::fmt::Display for OmegaScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}
