//! Allocation coordinator: reserves anomaly slots, then fills the remaining
//! budget with the configured sampling strategy.
//!
//! Output invariants: at most `requested_size` rows, no source row twice,
//! and every anomaly-origin row is classified `High`. The requested size is
//! clamped to the eligible population here and nowhere else.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::sampling::{strategy_for, RandomSource};
use crate::core::services::{AnomalyService, PopulationService};
use crate::domain::{AmountPolicy, LedgerRow, SampleOrigin, SampledRow, SamplingMethod};
use crate::errors::SamplingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub requested_size: usize,
    pub method: SamplingMethod,
    pub policy: AmountPolicy,
    pub include_anomalies: bool,
}

impl AllocationRequest {
    pub fn new(requested_size: usize, method: SamplingMethod, policy: AmountPolicy) -> Self {
        Self {
            requested_size,
            method,
            policy,
            include_anomalies: false,
        }
    }

    pub fn with_anomalies(mut self, include: bool) -> Self {
        self.include_anomalies = include;
        self
    }
}

/// Why a sample differs from what was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleNote {
    /// No row has a positive amount under the active policy.
    EmptyPopulation,
    ClampedToPopulation { requested: usize, available: usize },
    /// Fewer unique rows than the effective size; expected for MUS on
    /// concentrated populations.
    UnderYield { requested: usize, returned: usize },
    NoEligibleAmount,
    StrategyFailed { reason: String },
}

impl fmt::Display for SampleNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleNote::EmptyPopulation => f.write_str("no eligible rows under the active amount type"),
            SampleNote::ClampedToPopulation {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} rows but only {available} are eligible; sample clamped"
            ),
            SampleNote::UnderYield {
                requested,
                returned,
            } => write!(
                f,
                "returned {returned} of {requested} rows; large transactions absorbed several selections"
            ),
            SampleNote::NoEligibleAmount => f.write_str("no eligible amount to sample"),
            SampleNote::StrategyFailed { reason } => write!(f, "sampling failed: {reason}"),
        }
    }
}

/// Final sample plus the metadata callers need to explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReport {
    pub rows: Vec<SampledRow>,
    pub method: SamplingMethod,
    pub include_anomalies: bool,
    pub requested_size: usize,
    /// Requested size after clamping to the eligible population.
    pub effective_size: usize,
    pub anomaly_count: usize,
    pub sampling_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<SampleNote>,
}

impl SampleReport {
    fn empty(request: &AllocationRequest) -> Self {
        Self {
            rows: Vec::new(),
            method: request.method,
            include_anomalies: request.include_anomalies,
            requested_size: request.requested_size,
            effective_size: 0,
            anomaly_count: 0,
            sampling_count: 0,
            notes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct AllocationService;

impl AllocationService {
    /// Draws the audit sample from `pool`.
    ///
    /// Never fails: empty populations, clamping and MUS shortfalls are
    /// reported through [`SampleReport::notes`].
    pub fn allocate(
        pool: &[LedgerRow],
        request: &AllocationRequest,
        rng: &mut dyn RandomSource,
    ) -> SampleReport {
        let mut report = SampleReport::empty(request);
        let policy = request.policy;

        let eligible = PopulationService::eligible_rows(pool, policy);
        if eligible.is_empty() {
            report.notes.push(SampleNote::EmptyPopulation);
            return report;
        }

        let effective = request.requested_size.min(eligible.len());
        if request.requested_size > eligible.len() {
            tracing::warn!(
                requested = request.requested_size,
                available = eligible.len(),
                "sample size clamped to eligible population"
            );
            report.notes.push(SampleNote::ClampedToPopulation {
                requested: request.requested_size,
                available: eligible.len(),
            });
        }
        report.effective_size = effective;
        if effective == 0 {
            return report;
        }

        let anomalies: Vec<&LedgerRow> = if request.include_anomalies {
            AnomalyService::high_severity(&eligible, policy)
                .into_iter()
                .take(effective)
                .collect()
        } else {
            Vec::new()
        };
        let reserved: HashSet<usize> = anomalies.iter().map(|row| position_key(row)).collect();

        // Removing anomalies keeps order; re-check eligibility for the strategy.
        let remaining_pool: Vec<&LedgerRow> = eligible
            .iter()
            .copied()
            .filter(|row| !reserved.contains(&position_key(row)) && row.is_eligible(policy))
            .collect();
        let remaining_budget = effective.saturating_sub(anomalies.len());

        let strategy = strategy_for(request.method);
        let sampled = if remaining_budget == 0 {
            Vec::new()
        } else {
            match strategy.select(&remaining_pool, remaining_budget, policy, rng) {
                Ok(rows) => rows,
                Err(SamplingError::NoEligibleAmount) => {
                    report.notes.push(SampleNote::NoEligibleAmount);
                    Vec::new()
                }
                Err(err) => {
                    tracing::warn!("sampling strategy `{}` failed: {err}", request.method);
                    report.notes.push(SampleNote::StrategyFailed {
                        reason: err.to_string(),
                    });
                    Vec::new()
                }
            }
        };

        let mut seen = HashSet::with_capacity(effective);
        let tagged = anomalies
            .into_iter()
            .map(|row| (row, SampleOrigin::Anomaly))
            .chain(sampled.into_iter().map(|row| (row, SampleOrigin::Sampling)));
        for (row, origin) in tagged {
            if report.rows.len() == request.requested_size {
                break;
            }
            if seen.insert(position_key(row)) {
                report
                    .rows
                    .push(SampledRow::new(row.clone(), origin, request.method));
            }
        }

        report.anomaly_count = report.rows.iter().filter(|row| row.is_anomaly()).count();
        report.sampling_count = report.rows.len() - report.anomaly_count;

        if report.rows.len() < effective {
            report.notes.push(SampleNote::UnderYield {
                requested: effective,
                returned: report.rows.len(),
            });
        }

        tracing::info!(
            method = %request.method,
            requested = request.requested_size,
            selected = report.rows.len(),
            anomalies = report.anomaly_count,
            "sample allocated"
        );
        report
    }
}

/// Identity of a row by its slot in the caller's pool.
///
/// Every row handed to the strategies is borrowed from the same `pool`
/// slice, so two distinct source rows never share an address even when
/// their `id`s collide.
fn position_key(row: &LedgerRow) -> usize {
    row as *const LedgerRow as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampling::rng::{RngSource, ScriptedSource};
    use crate::core::sampling::test_support::rows_with_amounts;
    use crate::domain::Severity;

    fn with_one_anomaly() -> Vec<LedgerRow> {
        let mut amounts = vec![1_000.0; 99];
        amounts.push(50_000.0);
        rows_with_amounts(&amounts)
    }

    #[test]
    fn reserves_anomaly_then_fills_with_strategy() {
        let rows = with_one_anomaly();
        for method in [
            SamplingMethod::Random,
            SamplingMethod::Systematic,
            SamplingMethod::Mus,
        ] {
            let request = AllocationRequest::new(3, method, AmountPolicy::Debit).with_anomalies(true);
            let mut rng = RngSource::seeded(17);
            let report = AllocationService::allocate(&rows, &request, &mut rng);

            assert_eq!(report.len(), 3, "method {method}");
            assert_eq!(report.anomaly_count, 1);
            assert_eq!(report.sampling_count, 2);
            assert_eq!(report.rows[0].id(), rows[99].id);
            assert!(report.rows[0].is_anomaly());
            let unique: HashSet<_> = report.rows.iter().map(SampledRow::id).collect();
            assert_eq!(unique.len(), 3);
            assert!(report.rows.iter().all(|row| row.method == method));
        }
    }

    #[test]
    fn anomaly_rows_are_always_high_severity() {
        let rows = with_one_anomaly();
        let request =
            AllocationRequest::new(10, SamplingMethod::Random, AmountPolicy::Debit).with_anomalies(true);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(4));
        let eligible = PopulationService::eligible_rows(&rows, AmountPolicy::Debit);
        let assessment = AnomalyService::assess(&eligible, AmountPolicy::Debit);
        for sampled in report.rows.iter().filter(|row| row.is_anomaly()) {
            let flag = assessment
                .flags
                .iter()
                .find(|flag| flag.row_id == sampled.id())
                .unwrap();
            assert_eq!(flag.severity, Severity::High);
        }
    }

    #[test]
    fn anomalies_are_ignored_unless_requested() {
        let rows = with_one_anomaly();
        let request = AllocationRequest::new(5, SamplingMethod::Systematic, AmountPolicy::Debit);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(1));
        assert_eq!(report.anomaly_count, 0);
        assert_eq!(report.len(), 5);
    }

    #[test]
    fn anomaly_slots_never_exceed_request() {
        let mut amounts = vec![10.0; 30];
        amounts.extend([900.0, 900.0, 900.0]);
        let rows = rows_with_amounts(&amounts);
        let request =
            AllocationRequest::new(2, SamplingMethod::Random, AmountPolicy::Debit).with_anomalies(true);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(9));
        assert_eq!(report.len(), 2);
        assert_eq!(report.anomaly_count, 2);
        assert_eq!(report.rows[0].id(), rows[30].id);
        assert_eq!(report.rows[1].id(), rows[31].id);
    }

    #[test]
    fn oversized_request_is_clamped() {
        let rows = rows_with_amounts(&[5.0, 6.0, 7.0, 0.0]);
        let request = AllocationRequest::new(10, SamplingMethod::Random, AmountPolicy::Debit);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(2));
        assert_eq!(report.len(), 3);
        assert_eq!(report.effective_size, 3);
        assert!(report.notes.contains(&SampleNote::ClampedToPopulation {
            requested: 10,
            available: 3
        }));
    }

    #[test]
    fn empty_population_is_reported() {
        let rows = rows_with_amounts(&[0.0, 0.0]);
        let request = AllocationRequest::new(4, SamplingMethod::Mus, AmountPolicy::Debit);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(2));
        assert!(report.is_empty());
        assert_eq!(report.notes, vec![SampleNote::EmptyPopulation]);
    }

    #[test]
    fn mus_shortfall_is_reported() {
        let rows =
            rows_with_amounts(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 1_000.0]);
        let request = AllocationRequest::new(3, SamplingMethod::Mus, AmountPolicy::Debit);
        let report =
            AllocationService::allocate(&rows, &request, &mut ScriptedSource::new(vec![0.0]));
        assert_eq!(report.len(), 2);
        assert!(report.notes.contains(&SampleNote::UnderYield {
            requested: 3,
            returned: 2
        }));
    }

    #[test]
    fn zero_request_returns_nothing() {
        let rows = rows_with_amounts(&[1.0, 2.0]);
        let request = AllocationRequest::new(0, SamplingMethod::Random, AmountPolicy::Both)
            .with_anomalies(true);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(2));
        assert!(report.is_empty());
        assert!(report.notes.is_empty());
    }

    fn sharing_one_id(amounts: &[f64]) -> Vec<LedgerRow> {
        let mut rows = rows_with_amounts(amounts);
        let shared = rows[0].id;
        for row in &mut rows {
            row.id = shared;
        }
        rows
    }

    #[test]
    fn rows_with_colliding_ids_stay_distinct() {
        let rows = sharing_one_id(&[10.0; 10]);
        for method in [SamplingMethod::Random, SamplingMethod::Systematic] {
            let request = AllocationRequest::new(5, method, AmountPolicy::Debit);
            let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(6));
            assert_eq!(report.len(), 5, "method {method}");
            assert!(report.notes.is_empty(), "method {method}: {:?}", report.notes);
        }
    }

    #[test]
    fn reserving_an_anomaly_keeps_rows_that_share_its_id() {
        let mut amounts = vec![1_000.0; 9];
        amounts.push(50_000.0);
        let rows = sharing_one_id(&amounts);
        let request =
            AllocationRequest::new(4, SamplingMethod::Random, AmountPolicy::Debit).with_anomalies(true);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(3));
        assert_eq!(report.len(), 4);
        assert_eq!(report.anomaly_count, 1);
        assert_eq!(report.rows[0].row.debit_amount, 50_000.0);
        assert!(report.rows[1..].iter().all(|row| row.row.debit_amount == 1_000.0));
    }

    #[test]
    fn non_finite_total_is_reported_as_strategy_failure() {
        let rows = rows_with_amounts(&[f64::MAX, f64::MAX]);
        let request = AllocationRequest::new(1, SamplingMethod::Mus, AmountPolicy::Debit);
        let report = AllocationService::allocate(&rows, &request, &mut RngSource::seeded(2));
        assert!(report.is_empty());
        assert!(report
            .notes
            .iter()
            .any(|note| matches!(note, SampleNote::StrategyFailed { .. })));
        assert!(!report.notes.contains(&SampleNote::NoEligibleAmount));
    }
}
