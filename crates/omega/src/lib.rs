//! Ω scoring and cross-shard aggregation.
//!
//! This crate turns normalised metric records into a single health/risk score
//! (Ω) and summarises that score across a set of named shards. It works on
//! parsed, in-memory values only; reading files and printing results belong to
//! the `cli` crate.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `ShardName` and the `MetricField` enumeration |
//! | [`types`] | Value types (`MetricRecord`, `OmegaScore`, `OmegaWeights`) |
//! | [`scoring`] | `validate`, `clamp`, `score`, `mean` |
//! | [`aggregation`] | `ShardRecord`, `AggregationLayer`, `SummaryResult` |
//! | [`errors`] | `OmegaError` and its `ErrorKind` classification |
//!
//! ## Example
//!
//! ```
//! use omega::{AggregationLayer, MetricRecord, ShardName, ShardRecord};
//!
//! let mut layer = AggregationLayer::new();
//! layer.add_shard(ShardRecord::new(
//!     ShardName::new("eu-1").unwrap(),
//!     MetricRecord::new(0.9, 0.9, 0.05).with_auxiliary(0.8, 0.75),
//! ));
//!
//! let summary = layer.summarize().unwrap();
//! assert_eq!(summary.shard_count, 1);
//! assert_eq!(summary.omega_global.as_f64(), 0.8975);
//! ```

pub mod aggregation;
pub mod errors;
pub mod identifiers;
pub mod scoring;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use aggregation::{render_summary_json, AggregationLayer, ShardRecord, SummaryResult};
pub use errors::{ErrorKind, OmegaError};
pub use identifiers::{MetricField, ShardName};
pub use scoring::{clamp, mean, score, validate, validate_value};
pub use types::{MetricRecord, OmegaScore, OmegaWeights};
