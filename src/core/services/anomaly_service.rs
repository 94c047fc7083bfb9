//! Outlier classification over the eligible population.
//!
//! Three independent heuristics escalate a row from `Low`:
//! z-score (population standard deviation), the 1.5 x IQR fence, and a
//! magnitude ratio against the mean. A row equal to the population maximum is
//! forced to `High` when that maximum exceeds five times the mean. Every row
//! sharing the maximum is flagged, not only the first.

use serde::{Deserialize, Serialize};

use crate::domain::{AmountPolicy, AnomalyFlag, AnomalyRule, LedgerRow, Severity};

const Z_HIGH: f64 = 3.0;
const Z_MEDIUM: f64 = 2.0;
const IQR_FENCE: f64 = 1.5;
const RATIO_MEDIUM: f64 = 10.0;
const RATIO_DOMINANT_MAX: f64 = 5.0;

/// Population statistics plus one flag per assessed row, in input order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub population: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub maximum: f64,
    pub flags: Vec<AnomalyFlag>,
}

impl AnomalyReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.flags
            .iter()
            .filter(|flag| flag.severity == severity)
            .count()
    }
}

pub struct AnomalyService;

impl AnomalyService {
    /// Classifies every row with a positive amount under `policy`.
    ///
    /// Rows without a positive amount are not part of the population and get
    /// no flag.
    pub fn assess(rows: &[&LedgerRow], policy: AmountPolicy) -> AnomalyReport {
        let assessed: Vec<(&LedgerRow, f64)> = rows
            .iter()
            .map(|row| (*row, row.amount(policy)))
            .filter(|(_, amount)| *amount > 0.0)
            .collect();
        if assessed.is_empty() {
            return AnomalyReport::default();
        }

        let amounts: Vec<f64> = assessed.iter().map(|(_, amount)| *amount).collect();
        let n = amounts.len() as f64;
        let mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts
            .iter()
            .map(|amount| (amount - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        let mut sorted = amounts.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q1 = sorted[(n * 0.25).floor() as usize];
        let q3 = sorted[(n * 0.75).floor() as usize];
        let iqr = q3 - q1;
        let lower_bound = q1 - IQR_FENCE * iqr;
        let upper_bound = q3 + IQR_FENCE * iqr;
        let maximum = sorted[sorted.len() - 1];
        let dominant_max = maximum > mean * RATIO_DOMINANT_MAX;

        tracing::debug!(
            population = amounts.len(),
            mean,
            std_dev,
            q1,
            q3,
            maximum,
            "anomaly statistics"
        );

        let flags = assessed
            .iter()
            .map(|(row, amount)| {
                let amount = *amount;
                let mut severity = Severity::Low;
                let mut rules = Vec::new();

                // Zero spread: skip the z-score test instead of dividing by zero.
                let z_score = (std_dev > 0.0).then(|| (amount - mean) / std_dev);
                if let Some(z) = z_score {
                    if z.abs() > Z_HIGH {
                        severity = Severity::High;
                        rules.push(AnomalyRule::ExtremeZScore);
                    } else if z.abs() > Z_MEDIUM {
                        severity = Severity::Medium;
                        rules.push(AnomalyRule::ElevatedZScore);
                    }
                }

                if amount < lower_bound || amount > upper_bound {
                    rules.push(AnomalyRule::OutsideIqrBounds);
                    if severity == Severity::Low {
                        severity = Severity::Medium;
                    }
                }

                if amount > mean * RATIO_MEDIUM {
                    rules.push(AnomalyRule::LargeRatio);
                    if severity == Severity::Low {
                        severity = Severity::Medium;
                    }
                }

                if dominant_max && amount == maximum {
                    rules.push(AnomalyRule::DominantMaximum);
                    severity = Severity::High;
                }

                AnomalyFlag {
                    row_id: row.id,
                    amount,
                    z_score,
                    severity,
                    rules,
                }
            })
            .collect();

        AnomalyReport {
            population: amounts.len(),
            mean,
            std_dev,
            q1,
            q3,
            iqr,
            lower_bound,
            upper_bound,
            maximum,
            flags,
        }
    }

    /// Rows classified `High`, in original row order.
    pub fn high_severity<'a>(rows: &[&'a LedgerRow], policy: AmountPolicy) -> Vec<&'a LedgerRow> {
        let report = Self::assess(rows, policy);
        // Flags follow the assessed rows one to one, so pair them by position.
        rows.iter()
            .copied()
            .filter(|row| row.amount(policy) > 0.0)
            .zip(report.flags.iter())
            .filter(|(_, flag)| flag.is_high())
            .map(|(row, _)| row)
            .collect()
    }
}
