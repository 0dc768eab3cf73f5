//! Domain identifiers.
//!
//! [`ShardName`] labels the origin of a metric record; [`MetricField`] names one
//! of the five metric slots so errors and ingestion can refer to fields without
//! passing raw strings around.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shard names
// ---------------------------------------------------------------------------

/// Identifies the shard a [`crate::ShardRecord`] was collected from.
///
/// Names are free-form labels. They are not required to be unique within an
/// [`crate::AggregationLayer`]; duplicates are kept as separate shards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShardName(String);

impl ShardName {
    /// Creates a new shard name, returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShardName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ShardName {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or("shard name must not be empty")
    }
}

impl From<ShardName> for String {
    fn from(name: ShardName) -> Self {
        name.0
    }
}

// ---------------------------------------------------------------------------
// Metric fields
// ---------------------------------------------------------------------------

/// One of the five inputs to the Ω formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    /// Ψ — coherence. Contributes positively.
    Psi,
    /// Θ — stability. Contributes positively.
    Theta,
    /// CVaR — conditional value-at-risk. Contributes through `1 - cvar`.
    Cvar,
    /// PoLE — optional auxiliary signal.
    Pole,
    /// COG — optional auxiliary signal.
    Cog,
}

impl MetricField {
    /// All fields in formula order.
    pub const ALL: [MetricField; 5] = [
        MetricField::Psi,
        MetricField::Theta,
        MetricField::Cvar,
        MetricField::Pole,
        MetricField::Cog,
    ];

    /// Returns the key used for this field in external records.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricField::Psi => "psi",
            MetricField::Theta => "theta",
            MetricField::Cvar => "cvar",
            MetricField::Pole => "pole",
            MetricField::Cog => "cog",
        }
    }

    /// Returns `true` for fields that default to `0.0` when absent.
    pub fn is_optional(self) -> bool {
        matches!(self, MetricField::Pole | MetricField::Cog)
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_shard_name_is_rejected() {
        assert!(ShardName::new("").is_none());
        assert_eq!(ShardName::new("eu-west").unwrap().as_str(), "eu-west");
    }

    #[test]
    fn shard_name_deserialisation_enforces_non_empty() {
        let ok: ShardName = serde_json::from_str("\"a\"").unwrap();
        assert_eq!(ok.to_string(), "a");
        assert!(serde_json::from_str::<ShardName>("\"\"").is_err());
    }

    #[test]
    fn only_auxiliary_fields_are_optional() {
        let optional: Vec<_> = MetricField::ALL
            .iter()
            .filter(|f| f.is_optional())
            .map(|f| f.as_str())
            .collect();
        assert_eq!(optional, vec!["pole", "cog"]);
    }
}
