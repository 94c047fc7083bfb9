use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::row::LedgerRow;

/// Anomaly tier. Only `High` drives forced inclusion in a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(label)
    }
}

/// Heuristic that contributed to a row's severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyRule {
    /// |z| above 3.
    ExtremeZScore,
    /// |z| above 2.
    ElevatedZScore,
    OutsideIqrBounds,
    /// More than ten times the mean.
    LargeRatio,
    /// Equal to the population maximum, which exceeds five times the mean.
    DominantMaximum,
}

/// Per-row anomaly classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub row_id: Uuid,
    pub amount: f64,
    /// `None` when the population has zero spread.
    pub z_score: Option<f64>,
    pub severity: Severity,
    pub rules: Vec<AnomalyRule>,
}

impl AnomalyFlag {
    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    #[default]
    Random,
    Systematic,
    Mus,
}

impl SamplingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SamplingMethod::Random => "random",
            SamplingMethod::Systematic => "systematic",
            SamplingMethod::Mus => "mus",
        }
    }

    /// Human-readable name used in exports.
    pub fn label(self) -> &'static str {
        match self {
            SamplingMethod::Random => "Random Sampling",
            SamplingMethod::Systematic => "Systematic Sampling",
            SamplingMethod::Mus => "Monetary Unit Sampling",
        }
    }
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(SamplingMethod::Random),
            "systematic" => Ok(SamplingMethod::Systematic),
            "mus" | "monetary" => Ok(SamplingMethod::Mus),
            other => Err(format!(
                "unknown sampling method `{other}` (expected random, systematic or mus)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleOrigin {
    Anomaly,
    Sampling,
}

/// A row selected for audit testing, tagged with how it got there.
///
/// Built only by the allocation coordinator; fields are read-only by convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledRow {
    pub row: LedgerRow,
    pub origin: SampleOrigin,
    pub method: SamplingMethod,
}

impl SampledRow {
    pub(crate) fn new(row: LedgerRow, origin: SampleOrigin, method: SamplingMethod) -> Self {
        Self {
            row,
            origin,
            method,
        }
    }

    pub fn id(&self) -> Uuid {
        self.row.id
    }

    pub fn is_anomaly(&self) -> bool {
        self.origin == SampleOrigin::Anomaly
    }
}
