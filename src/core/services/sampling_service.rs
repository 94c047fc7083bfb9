//! End-to-end sampling run driven by a [`SamplingConfig`].

use serde::{Deserialize, Serialize};

use crate::config::{SampleSizeMode, SamplingConfig};
use crate::core::sampling::RandomSource;
use crate::core::services::{
    AllocationService, PopulationMetrics, PopulationService, Recommendation, SampleReport,
    SampleSizeService,
};
use crate::domain::LedgerRow;

/// Everything a caller needs to present one sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingRun {
    pub metrics: PopulationMetrics,
    pub recommendation: Recommendation,
    pub size_mode: SampleSizeMode,
    /// Size handed to the coordinator, before any clamping.
    pub requested_size: usize,
    pub report: SampleReport,
}

pub struct SamplingService;

impl SamplingService {
    /// Sample size the configuration asks for, unclamped.
    pub fn requested_size(config: &SamplingConfig, recommendation: &Recommendation) -> usize {
        match config.sample_size_mode {
            SampleSizeMode::Manual => config.manual_size,
            SampleSizeMode::Formula => recommendation.recommended_size,
        }
    }

    pub fn recommend(rows: &[LedgerRow], config: &SamplingConfig) -> Recommendation {
        let metrics = PopulationService::metrics(rows, config.amount_type);
        SampleSizeService::recommend(
            metrics.total_amount,
            config.materiality,
            config.confidence_level,
        )
    }

    /// Computes metrics and the recommendation, then allocates the sample.
    pub fn run(
        rows: &[LedgerRow],
        config: &SamplingConfig,
        rng: &mut dyn RandomSource,
    ) -> SamplingRun {
        let metrics = PopulationService::metrics(rows, config.amount_type);
        let recommendation = SampleSizeService::recommend(
            metrics.total_amount,
            config.materiality,
            config.confidence_level,
        );
        let requested_size = Self::requested_size(config, &recommendation);
        let request = config.allocation_request(requested_size);
        let report = AllocationService::allocate(rows, &request, rng);

        SamplingRun {
            metrics,
            recommendation,
            size_mode: config.sample_size_mode,
            requested_size,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampling::rng::RngSource;
    use crate::core::sampling::test_support::rows_with_amounts;
    use crate::core::services::SampleNote;
    use crate::domain::{AmountPolicy, SamplingMethod};

    #[test]
    fn manual_mode_uses_configured_size() {
        let rows = rows_with_amounts(&[100.0; 40]);
        let config = SamplingConfig {
            manual_size: 7,
            include_anomalies: false,
            ..SamplingConfig::default()
        };
        let run = SamplingService::run(&rows, &config, &mut RngSource::seeded(1));
        assert_eq!(run.requested_size, 7);
        assert_eq!(run.report.len(), 7);
        assert_eq!(run.metrics.eligible_row_count, 40);
        assert_eq!(run.metrics.total_amount, 4_000.0);
    }

    #[test]
    fn formula_mode_clamps_only_at_allocation() {
        let rows = rows_with_amounts(&[1_000.0; 20]);
        let config = SamplingConfig {
            sample_size_mode: SampleSizeMode::Formula,
            materiality: 100.0,
            sampling_method: SamplingMethod::Systematic,
            amount_type: AmountPolicy::Debit,
            ..SamplingConfig::default()
        };
        let run = SamplingService::run(&rows, &config, &mut RngSource::seeded(1));
        assert_eq!(run.recommendation.recommended_size, 600);
        assert_eq!(run.requested_size, 600);
        assert_eq!(run.report.len(), 20);
        assert!(run.report.notes.contains(&SampleNote::ClampedToPopulation {
            requested: 600,
            available: 20
        }));
    }

    #[test]
    fn empty_rows_produce_zero_metrics_and_empty_sample() {
        let run = SamplingService::run(&[], &SamplingConfig::default(), &mut RngSource::seeded(1));
        assert_eq!(run.metrics, PopulationMetrics::default());
        assert!(run.report.is_empty());
        assert_eq!(run.report.notes, vec![SampleNote::EmptyPopulation]);
    }
}
