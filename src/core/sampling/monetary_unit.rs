use std::collections::HashSet;

use super::{RandomSource, SamplingStrategy};
use crate::domain::{AmountPolicy, LedgerRow, SamplingMethod};
use crate::errors::{Result, SamplingError};

/// Monetary Unit Sampling: probability proportional to size.
///
/// Each currency unit is a sampling unit. One random offset `r` in
/// `[0, total / size)` fixes the targets `r + i * interval`; each target hits
/// the first row whose running total reaches it, located by binary search
/// over the cumulative sums (O(size log n)).
///
/// A row larger than the interval absorbs several targets, so the result can
/// hold fewer than `size` rows. That under-yield is the expected behaviour of
/// the method; callers must treat the returned length as authoritative.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonetaryUnitStrategy;

impl MonetaryUnitStrategy {
    /// Running totals over `pool` in its original order.
    pub fn cumulative_amounts(pool: &[&LedgerRow], policy: AmountPolicy) -> Vec<f64> {
        let mut running = 0.0;
        pool.iter()
            .map(|row| {
                running += row.amount(policy);
                running
            })
            .collect()
    }
}

impl SamplingStrategy for MonetaryUnitStrategy {
    fn method(&self) -> SamplingMethod {
        SamplingMethod::Mus
    }

    fn select<'a>(
        &self,
        pool: &[&'a LedgerRow],
        size: usize,
        policy: AmountPolicy,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<&'a LedgerRow>> {
        // Zero-value rows hold no monetary units.
        let eligible: Vec<&'a LedgerRow> = pool
            .iter()
            .copied()
            .filter(|row| row.is_eligible(policy))
            .collect();

        if size == 0 {
            return Ok(Vec::new());
        }
        if eligible.is_empty() {
            return Err(SamplingError::NoEligibleAmount);
        }
        let size = size.min(eligible.len());

        let cumulative = Self::cumulative_amounts(&eligible, policy);
        let total = cumulative.last().copied().unwrap_or(0.0);
        if !total.is_finite() {
            return Err(SamplingError::InvalidInput(format!(
                "population total under `{policy}` is not finite"
            )));
        }
        if total <= 0.0 {
            return Err(SamplingError::NoEligibleAmount);
        }

        let interval = total / size as f64;
        let offset = rng.next_unit() * interval;
        tracing::debug!(total, interval, offset, size, "monetary unit selection");

        let last = eligible.len() - 1;
        let mut seen = HashSet::with_capacity(size);
        let mut selected = Vec::with_capacity(size);
        for step in 0..size {
            let target = offset + step as f64 * interval;
            let hit = cumulative
                .partition_point(|running| *running < target)
                .min(last);
            if seen.insert(hit) {
                selected.push(eligible[hit]);
            }
        }

        if selected.len() < size {
            tracing::debug!(
                requested = size,
                returned = selected.len(),
                "monetary unit sampling absorbed targets into large rows"
            );
        }
        Ok(selected)
    }
}
