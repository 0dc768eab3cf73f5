//! Scoring engine: validation, clamping, the Ω formula and the mean helper.
//!
//! The pipeline for a single record is always `validate` → `clamp` → `score`.
//! Validation rejects values that would poison later arithmetic (NaN, ±∞);
//! clamping maps every finite value into `[0.0, 1.0]`; scoring applies
//! [`OmegaWeights::STANDARD`] and rounds to four decimals.
//!
//! `clamp` treats all five fields the same way, `cvar` included.

use serde_json::Value;

use crate::{MetricField, MetricRecord, OmegaError, OmegaScore, OmegaWeights};

/// Number of decimal digits kept by [`score`].
pub const SCORE_DECIMALS: i32 = 4;

/// Rejects any field that is NaN or infinite.
///
/// The `[0.0, 1.0]` bound is not checked here; out-of-range finite values are
/// legal and are handled by [`clamp`].
pub fn validate(record: &MetricRecord) -> Result<(), OmegaError> {
    for field in MetricField::ALL {
        ensure_finite(field, record.get(field))?;
    }
    Ok(())
}

/// Converts an untyped JSON value into a finite metric value.
///
/// Fails with [`OmegaError::NonNumeric`] when `value` is not a JSON number and
/// with [`OmegaError::NonFinite`] when it cannot be represented as a finite
/// `f64`.
pub fn validate_value(field: MetricField, value: &Value) -> Result<f64, OmegaError> {
    let number = match value {
        Value::Number(n) => n.as_f64().ok_or(OmegaError::NonFinite {
            field,
            value: f64::NAN,
        })?,
        other => {
            return Err(OmegaError::NonNumeric {
                field,
                found: json_type_name(other).to_string(),
            })
        }
    };
    ensure_finite(field, number)?;
    Ok(number)
}

/// Returns a copy of `record` with every field limited to `[0.0, 1.0]`.
///
/// Total: a NaN field maps to `1.0` rather than propagating, but callers are
/// expected to [`validate`] first.
#[must_use]
pub fn clamp(record: &MetricRecord) -> MetricRecord {
    MetricRecord {
        psi: clamp01(record.psi),
        theta: clamp01(record.theta),
        cvar: clamp01(record.cvar),
        pole: clamp01(record.pole),
        cog: clamp01(record.cog),
    }
}

/// Computes Ω for `record`.
///
/// The record is clamped before weighting, so the result is the same whether
/// or not the caller already clamped it. The weighted sum is rounded to
/// [`SCORE_DECIMALS`] places with ties going to the even digit.
pub fn score(record: &MetricRecord) -> OmegaScore {
    let v = clamp(record);
    let w = OmegaWeights::STANDARD;
    let omega = w.psi * v.psi
        + w.theta * v.theta
        + w.risk * (1.0 - v.cvar)
        + w.pole * v.pole
        + w.cog * v.cog;
    OmegaScore::from_convex(round_half_even(omega, SCORE_DECIMALS))
}

/// Arithmetic mean of `values`.
///
/// An empty sequence is an error, never `0.0`.
pub fn mean<I>(values: I) -> Result<f64, OmegaError>
where
    I: IntoIterator<Item = f64>,
{
    let (total, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(total, count), v| (total + v, count + 1));
    if count == 0 {
        return Err(OmegaError::EmptyInput {
            what: "mean".to_string(),
        });
    }
    Ok(total / count as f64)
}

fn ensure_finite(field: MetricField, value: f64) -> Result<(), OmegaError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OmegaError::NonFinite { field, value })
    }
}

fn clamp01(value: f64) -> f64 {
    // f64::min returns the non-NaN operand, so this never yields NaN.
    value.min(1.0).max(0.0)
}

fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
