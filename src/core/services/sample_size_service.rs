//! Statistical sample size from materiality and confidence.
//!
//! `size = ceil(population_value * risk_factor / materiality)`, floored at 1.
//! The result is never clamped to the population here; the allocation
//! coordinator owns clamping.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConfidenceLevel {
    Ninety,
    #[default]
    NinetyFive,
    NinetyNine,
}

impl ConfidenceLevel {
    pub fn from_percent(percent: u32) -> Option<Self> {
        match percent {
            90 => Some(ConfidenceLevel::Ninety),
            95 => Some(ConfidenceLevel::NinetyFive),
            99 => Some(ConfidenceLevel::NinetyNine),
            _ => None,
        }
    }

    pub fn percent(self) -> u32 {
        match self {
            ConfidenceLevel::Ninety => 90,
            ConfidenceLevel::NinetyFive => 95,
            ConfidenceLevel::NinetyNine => 99,
        }
    }

    /// Reliability factor for zero expected misstatements.
    pub fn risk_factor(self) -> f64 {
        match self {
            ConfidenceLevel::Ninety => 2.31,
            ConfidenceLevel::NinetyFive => 3.00,
            ConfidenceLevel::NinetyNine => 4.61,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecommendationWarning {
    UnrecognizedConfidence(u32),
    NonPositiveMateriality(f64),
}

impl fmt::Display for RecommendationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationWarning::UnrecognizedConfidence(level) => write!(
                f,
                "confidence level {level}% is not supported; using 95% (factor 3.00)"
            ),
            RecommendationWarning::NonPositiveMateriality(value) => write!(
                f,
                "materiality {value} must be positive; using 95% (factor 3.00) and the minimum size"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_size: usize,
    pub confidence: ConfidenceLevel,
    pub risk_factor: f64,
    pub used_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RecommendationWarning>,
}

pub struct SampleSizeService;

impl SampleSizeService {
    /// Recommends a sample count. Pure: identical inputs give identical output.
    ///
    /// Unsupported confidence levels and non-positive materiality fall back to
    /// the 95% factor and are reported through `warnings`, never as errors.
    pub fn recommend(
        population_value: f64,
        materiality: f64,
        confidence_percent: u32,
    ) -> Recommendation {
        let mut warnings = Vec::new();

        let confidence = ConfidenceLevel::from_percent(confidence_percent).unwrap_or_else(|| {
            warnings.push(RecommendationWarning::UnrecognizedConfidence(
                confidence_percent,
            ));
            ConfidenceLevel::default()
        });

        if !(materiality.is_finite() && materiality > 0.0) {
            warnings.push(RecommendationWarning::NonPositiveMateriality(materiality));
            for warning in &warnings {
                tracing::warn!("{warning}");
            }
            return Recommendation {
                recommended_size: 1,
                confidence: ConfidenceLevel::default(),
                risk_factor: ConfidenceLevel::default().risk_factor(),
                used_default: true,
                warnings,
            };
        }

        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        let population_value = if population_value.is_finite() {
            population_value.max(0.0)
        } else {
            0.0
        };
        let factor = confidence.risk_factor();
        let raw = population_value * factor / materiality;
        let recommended_size = (ceil_tolerant(raw) as usize).max(1);
        tracing::debug!(population_value, materiality, factor, recommended_size, "sample size");

        Recommendation {
            recommended_size,
            confidence,
            risk_factor: factor,
            used_default: !warnings.is_empty(),
            warnings,
        }
    }
}

// The factors are not exact in binary; 2.31 * 1e8 / 1e6 must give 231, not 232.
fn ceil_tolerant(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= 1e-9 * value.abs().max(1.0) {
        rounded
    } else {
        value.ceil()
    }
}
