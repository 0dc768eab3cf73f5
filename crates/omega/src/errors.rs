//! Error types for scoring and aggregation.
//!
//! Every failure is raised at the point of detection and propagated to the
//! caller unchanged. Nothing in this crate retries or substitutes a default
//! value: an empty or corrupt input must never turn into a plausible-looking
//! score.
//!
//! [`ErrorKind`] groups the variants of [`OmegaError`] into the five classes
//! callers dispatch on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MetricField, ShardName};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Coarse classification of an [`OmegaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A metric field holds something other than a number.
    Type,
    /// A metric field is NaN or infinite.
    Range,
    /// A mean or aggregate was requested over zero values.
    EmptyInput,
    /// A summary was requested from a layer holding no shards.
    EmptyCollection,
    /// External records are not shaped as a list of shard objects.
    Format,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the scoring engine and the aggregation layer.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum OmegaError {
    /// A metric field is present but is not numeric.
    ///
    /// Only reachable through ingestion of untyped records; typed
    /// [`crate::MetricRecord`]s always hold numbers.
    #[error("Metric '{field}' must be a number, found {found}")]
    NonNumeric {
        /// The offending field.
        field: MetricField,
        /// JSON type of the value that was found (e.g. `"string"`, `"null"`).
        found: String,
    },

    /// A metric field is NaN or ±infinity.
    #[error("Metric '{field}' must be finite, got {value}")]
    NonFinite {
        /// The offending field.
        field: MetricField,
        /// The rejected value.
        value: f64,
    },

    /// A mean was requested over an empty sequence.
    #[error("No values received for {what}")]
    EmptyInput {
        /// Description of the sequence that was empty.
        what: String,
    },

    /// `summarize` was called on a layer with no shards.
    #[error("No shards registered for summarisation")]
    EmptyCollection,

    /// External records could not be interpreted as a shard list.
    #[error("Malformed shard records: {message}")]
    Format {
        /// Description of the structural problem.
        message: String,
    },

    /// A specific shard failed validation or ingestion.
    #[error("Shard '{shard}' is invalid: {source}")]
    InvalidShard {
        /// Name of the shard that failed.
        shard: ShardName,
        /// The underlying failure.
        #[source]
        source: Box<OmegaError>,
    },
}

impl OmegaError {
    /// Returns the classification of this error.
    ///
    /// [`OmegaError::InvalidShard`] reports the kind of the failure it wraps.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OmegaError::NonNumeric { .. } => ErrorKind::Type,
            OmegaError::NonFinite { .. } => ErrorKind::Range,
            OmegaError::EmptyInput { .. } => ErrorKind::EmptyInput,
            OmegaError::EmptyCollection => ErrorKind::EmptyCollection,
            OmegaError::Format { .. } => ErrorKind::Format,
            OmegaError::InvalidShard { source, .. } => source.kind(),
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        OmegaError::Format {
            message: message.into(),
        }
    }

    pub(crate) fn in_shard(self, shard: &ShardName) -> Self {
        OmegaError::InvalidShard {
            shard: shard.clone(),
            source: Box::new(self),
        }
    }
}
