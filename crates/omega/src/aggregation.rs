//! Cross-shard aggregation.
//!
//! An [`AggregationLayer`] owns a list of [`ShardRecord`]s and reduces them to a
//! [`SummaryResult`]. The global score is the score *of the per-field means*,
//! not the mean of the per-shard scores: it answers "how would a shard with
//! average characteristics score". Because every per-shard score is rounded
//! on its own, the two are not interchangeable.
//!
//! The layer is not synchronised. Callers sharing one across threads must wrap
//! it in their own lock.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::scoring::{self, json_type_name};
use crate::{MetricField, MetricRecord, OmegaError, OmegaScore, ShardName};

// ---------------------------------------------------------------------------
// Shards
// ---------------------------------------------------------------------------

/// Metrics collected from one named shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardRecord {
    /// Where the metrics came from.
    pub name: ShardName,
    /// Raw, unvalidated metric values.
    #[serde(flatten)]
    pub metrics: MetricRecord,
}

impl ShardRecord {
    /// Creates a shard record.
    pub fn new(name: ShardName, metrics: MetricRecord) -> Self {
        Self { name, metrics }
    }

    /// Returns the validated and clamped metrics of this shard.
    ///
    /// Failures are wrapped in [`OmegaError::InvalidShard`] naming this shard.
    pub fn inputs(&self) -> Result<MetricRecord, OmegaError> {
        self.metrics
            .validate()
            .map_err(|e| e.in_shard(&self.name))?;
        Ok(self.metrics.clamped())
    }

    /// Returns the Ω score of this shard.
    pub fn omega(&self) -> Result<OmegaScore, OmegaError> {
        Ok(scoring::score(&self.inputs()?))
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Aggregate statistics over every shard in a layer.
///
/// Fields are declared in alphabetical order so that serialising this type
/// yields key-sorted output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Mean of the clamped `cvar` values.
    pub cvar_mean: f64,
    /// Score of the record built from the per-field means.
    pub omega_global: OmegaScore,
    /// Highest per-shard score.
    pub omega_max: OmegaScore,
    /// Lowest per-shard score.
    pub omega_min: OmegaScore,
    /// Mean of the clamped `psi` values.
    pub psi_mean: f64,
    /// Number of shards summarised. Always at least one.
    pub shard_count: usize,
    /// Mean of the clamped `theta` values.
    pub theta_mean: f64,
}

/// Renders `summary` as JSON with sorted keys and two-space indentation.
pub fn render_summary_json(summary: &SummaryResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// An owned collection of shards that can be summarised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationLayer {
    shards: Vec<ShardRecord>,
}

impl AggregationLayer {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layer holding `shards`.
    pub fn with_shards(shards: Vec<ShardRecord>) -> Self {
        Self { shards }
    }

    /// Appends a shard. Duplicate names are kept.
    pub fn add_shard(&mut self, shard: ShardRecord) {
        self.shards.push(shard);
    }

    /// Returns the shards in insertion order.
    pub fn shards(&self) -> &[ShardRecord] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Summarises every shard in the layer.
    ///
    /// Fails with [`OmegaError::EmptyCollection`] when the layer is empty, and
    /// with [`OmegaError::InvalidShard`] for the first shard holding a NaN or
    /// infinite metric. The layer is not modified, so this may be called
    /// repeatedly.
    #[tracing::instrument(level = "debug", skip_all, fields(shard_count = self.shards.len()))]
    pub fn summarize(&self) -> Result<SummaryResult, OmegaError> {
        if self.shards.is_empty() {
            return Err(OmegaError::EmptyCollection);
        }

        let inputs = self
            .shards
            .iter()
            .map(ShardRecord::inputs)
            .collect::<Result<Vec<_>, _>>()?;

        let scores: Vec<OmegaScore> = self
            .shards
            .iter()
            .zip(&inputs)
            .map(|(shard, record)| {
                let omega = scoring::score(record);
                debug!(shard = %shard.name, omega = omega.as_f64(), "Scored shard");
                omega
            })
            .collect();

        let omega_min = extreme(&scores, |candidate, best| candidate < best)?;
        let omega_max = extreme(&scores, |candidate, best| candidate > best)?;

        let field_mean = |field: MetricField| scoring::mean(inputs.iter().map(|r| r.get(field)));
        let mean_record = MetricRecord {
            psi: field_mean(MetricField::Psi)?,
            theta: field_mean(MetricField::Theta)?,
            cvar: field_mean(MetricField::Cvar)?,
            pole: field_mean(MetricField::Pole)?,
            cog: field_mean(MetricField::Cog)?,
        };
        let omega_global = scoring::score(&mean_record);

        info!(
            shard_count = self.shards.len(),
            omega_global = omega_global.as_f64(),
            omega_min = omega_min.as_f64(),
            omega_max = omega_max.as_f64(),
            "Summarised shards"
        );

        Ok(SummaryResult {
            cvar_mean: mean_record.cvar,
            omega_global,
            omega_max,
            omega_min,
            psi_mean: mean_record.psi,
            shard_count: self.shards.len(),
            theta_mean: mean_record.theta,
        })
    }

    /// Builds a layer from external records shaped as
    /// `[{"name": .., "psi": .., "theta": .., "cvar": .., "pole"?: .., "cog"?: ..}, ..]`.
    ///
    /// Every record is parsed up front. Fails with
    ///
    /// - [`OmegaError::Format`] if `records` is not an array, an element is not
    ///   an object, or `name` or a required metric is missing;
    /// - [`OmegaError::EmptyInput`] if the array is empty;
    /// - [`OmegaError::NonNumeric`] (wrapped with the shard name) if a metric is
    ///   present but is not a number.
    ///
    /// Keys other than the six listed are ignored.
    pub fn from_records(records: &Value) -> Result<Self, OmegaError> {
        let items = records.as_array().ok_or_else(|| {
            OmegaError::format(format!(
                "expected a list of shard records, found {}",
                json_type_name(records)
            ))
        })?;
        if items.is_empty() {
            return Err(OmegaError::EmptyInput {
                what: "shard record list".to_string(),
            });
        }

        let shards = items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_shard(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(shard_count = shards.len(), "Loaded shard records");
        Ok(Self::with_shards(shards))
    }
}

// Picks the score for which `better(candidate, best)` never holds against any
// other score.
fn extreme(
    scores: &[OmegaScore],
    better: impl Fn(OmegaScore, OmegaScore) -> bool,
) -> Result<OmegaScore, OmegaError> {
    scores
        .iter()
        .copied()
        .reduce(|best, candidate| if better(candidate, best) { candidate } else { best })
        .ok_or(OmegaError::EmptyCollection)
}

fn parse_shard(index: usize, item: &Value) -> Result<ShardRecord, OmegaError> {
    let object = item.as_object().ok_or_else(|| {
        OmegaError::format(format!(
            "record {index} must be an object, found {}",
            json_type_name(item)
        ))
    })?;

    let name = match object.get("name") {
        Some(Value::String(s)) => ShardName::new(s.as_str())
            .ok_or_else(|| OmegaError::format(format!("record {index} has an empty 'name'")))?,
        Some(other) => {
            return Err(OmegaError::format(format!(
                "record {index} 'name' must be a string, found {}",
                json_type_name(other)
            )))
        }
        None => return Err(OmegaError::format(format!("record {index} is missing 'name'"))),
    };

    let metric = |field: MetricField| metric_value(object, field).map_err(|e| e.in_shard(&name));
    let metrics = MetricRecord {
        psi: metric(MetricField::Psi)?,
        theta: metric(MetricField::Theta)?,
        cvar: metric(MetricField::Cvar)?,
        pole: metric(MetricField::Pole)?,
        cog: metric(MetricField::Cog)?,
    };

    Ok(ShardRecord::new(name, metrics))
}

fn metric_value(object: &Map<String, Value>, field: MetricField) -> Result<f64, OmegaError> {
    match object.get(field.as_str()) {
        Some(value) => scoring::validate_value(field, value),
        None if field.is_optional() => Ok(0.0),
        None => Err(OmegaError::format(format!(
            "missing required field '{field}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use serde_json::json;

    fn shard(name: &str, metrics: MetricRecord) -> ShardRecord {
        ShardRecord::new(ShardName::new(name).unwrap(), metrics)
    }

    fn two_shard_layer() -> AggregationLayer {
        AggregationLayer::with_shards(vec![
            shard("a", MetricRecord::new(0.9, 0.88, 0.07).with_auxiliary(0.8, 0.79)),
            shard("b", MetricRecord::new(0.92, 0.91, 0.06).with_auxiliary(0.82, 0.8)),
        ])
    }

    #[test]
    fn summary_from_two_shards() {
        let summary = two_shard_layer().summarize().unwrap();

        assert_eq!(summary.shard_count, 2);
        assert_relative_eq!(summary.omega_min.as_f64(), 0.8895, epsilon = 1e-9);
        assert_relative_eq!(summary.omega_max.as_f64(), 0.91, epsilon = 1e-9);
        assert!(summary.omega_min <= summary.omega_global);
        assert!(summary.omega_global <= summary.omega_max);
        assert_abs_diff_eq!(summary.omega_global.as_f64(), 0.89975, epsilon = 1e-4);
        assert_abs_diff_eq!(summary.psi_mean, 0.91, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.theta_mean, 0.895, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.cvar_mean, 0.065, epsilon = 1e-9);
    }

    #[test]
    fn global_score_is_score_of_field_means() {
        let layer = two_shard_layer();
        let summary = layer.summarize().unwrap();

        let field_mean = |field: MetricField| {
            scoring::mean(layer.shards().iter().map(|s| s.metrics.get(field))).unwrap()
        };
        let means = MetricRecord::new(
            field_mean(MetricField::Psi),
            field_mean(MetricField::Theta),
            field_mean(MetricField::Cvar),
        )
        .with_auxiliary(field_mean(MetricField::Pole), field_mean(MetricField::Cog));

        assert_eq!(summary.omega_global, scoring::score(&means));
    }

    #[test]
    fn summary_uses_clamped_values() {
        let layer = AggregationLayer::with_shards(vec![
            shard("over", MetricRecord::new(3.0, 2.0, -4.0)),
            shard("under", MetricRecord::new(-1.0, -2.0, 9.0)),
        ]);
        let summary = layer.summarize().unwrap();

        assert_relative_eq!(summary.psi_mean, 0.5);
        assert_relative_eq!(summary.theta_mean, 0.5);
        assert_relative_eq!(summary.cvar_mean, 0.5);
        assert_relative_eq!(summary.omega_max.as_f64(), 0.9);
        assert_relative_eq!(summary.omega_min.as_f64(), 0.0);
    }

    #[test]
    fn empty_layer_cannot_be_summarised() {
        let layer = AggregationLayer::new();
        assert!(layer.is_empty());
        let err = layer.summarize().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCollection);
    }

    #[test]
    fn add_shard_moves_layer_out_of_empty_state() {
        let mut layer = AggregationLayer::new();
        layer.add_shard(shard("only", MetricRecord::new(0.9, 0.9, 0.05).with_auxiliary(0.8, 0.75)));

        let summary = layer.summarize().unwrap();
        assert_eq!(summary.shard_count, 1);
        assert_eq!(summary.omega_global.as_f64(), 0.8975);
        assert_eq!(summary.omega_min, summary.omega_max);
        assert_eq!(layer.summarize().unwrap(), summary);
    }

    #[test]
    fn duplicate_names_are_kept() {
        let mut layer = AggregationLayer::new();
        layer.add_shard(shard("dup", MetricRecord::new(0.1, 0.1, 0.1)));
        layer.add_shard(shard("dup", MetricRecord::new(0.9, 0.9, 0.9)));
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.summarize().unwrap().shard_count, 2);
    }

    #[test]
    fn invalid_shard_is_named_in_error() {
        let layer = AggregationLayer::with_shards(vec![
            shard("fine", MetricRecord::new(0.5, 0.5, 0.5)),
            shard("broken", MetricRecord::new(0.5, f64::NAN, 0.5)),
            shard("also-broken", MetricRecord::new(f64::INFINITY, 0.5, 0.5)),
        ]);
        let err = layer.summarize().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Range);
        match err {
            OmegaError::InvalidShard { shard, source } => {
                assert_eq!(shard.as_str(), "broken");
                assert!(matches!(
                    *source,
                    OmegaError::NonFinite {
                        field: MetricField::Theta,
                        ..
                    }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_records_defaults_optional_fields() {
        let records = json!([
            {"name": "x", "psi": 0.9, "theta": 0.9, "cvar": 0.05},
            {"name": "y", "psi": 0.8, "theta": 0.85, "cvar": 0.1, "pole": 0.7, "cog": 0.6}
        ]);
        let layer = AggregationLayer::from_records(&records).unwrap();

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.shards()[0].metrics.pole, 0.0);
        assert_eq!(layer.shards()[0].metrics.cog, 0.0);
        assert_eq!(layer.shards()[1].name.as_str(), "y");

        let summary = layer.summarize().unwrap();
        assert_eq!(summary.shard_count, 2);
        assert_relative_eq!(summary.omega_global.as_f64(), 0.82, epsilon = 1e-9);
    }

    #[test]
    fn from_records_rejects_non_list() {
        for payload in [json!({"name": "x"}), json!("shards"), json!(null), json!(3)] {
            let err = AggregationLayer::from_records(&payload).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{payload}");
        }
    }

    #[test]
    fn from_records_rejects_empty_list() {
        let err = AggregationLayer::from_records(&json!([])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn from_records_rejects_malformed_entries() {
        let cases = [
            json!([42]),
            json!([{"psi": 0.9, "theta": 0.9, "cvar": 0.1}]),
            json!([{"name": "", "psi": 0.9, "theta": 0.9, "cvar": 0.1}]),
            json!([{"name": 7, "psi": 0.9, "theta": 0.9, "cvar": 0.1}]),
            json!([{"name": "x", "psi": 0.9, "cvar": 0.1}]),
        ];
        for case in cases {
            let err = AggregationLayer::from_records(&case).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{case}");
        }
    }

    #[test]
    fn from_records_rejects_non_numeric_metrics() {
        let records = json!([
            {"name": "ok", "psi": 0.9, "theta": 0.9, "cvar": 0.1},
            {"name": "bad", "psi": 0.9, "theta": "high", "cvar": 0.1}
        ]);
        let err = AggregationLayer::from_records(&records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("'bad'"));

        let null_aux = json!([{"name": "n", "psi": 0.9, "theta": 0.9, "cvar": 0.1, "cog": null}]);
        let err = AggregationLayer::from_records(&null_aux).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn rendered_summary_has_sorted_keys_and_two_space_indent() {
        let summary = two_shard_layer().summarize().unwrap();
        let rendered = render_summary_json(&summary).unwrap();

        let keys: Vec<&str> = rendered
            .lines()
            .filter_map(|line| line.strip_prefix("  \""))
            .filter_map(|rest| rest.split('"').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "cvar_mean",
                "omega_global",
                "omega_max",
                "omega_min",
                "psi_mean",
                "shard_count",
                "theta_mean"
            ]
        );
        assert!(rendered.contains("\n  \"shard_count\": 2,"));

        let parsed: SummaryResult = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, summary);
    }
}
