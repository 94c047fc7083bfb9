use super::{RandomSource, SamplingStrategy};
use crate::domain::{AmountPolicy, LedgerRow, SamplingMethod};
use crate::errors::Result;

/// Simple random sampling without replacement.
///
/// Uses a partial Fisher-Yates shuffle over positions, so each draw costs
/// O(1) and no rejection loop is needed. Selected rows are returned in pool
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomStrategy;

impl SamplingStrategy for RandomStrategy {
    fn method(&self) -> SamplingMethod {
        SamplingMethod::Random
    }

    fn select<'a>(
        &self,
        pool: &[&'a LedgerRow],
        size: usize,
        _policy: AmountPolicy,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<&'a LedgerRow>> {
        let size = size.min(pool.len());
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut positions: Vec<usize> = (0..pool.len()).collect();
        for step in 0..size {
            let pick = step + rng.next_index(pool.len() - step);
            positions.swap(step, pick);
        }

        let mut chosen = positions[..size].to_vec();
        chosen.sort_unstable();
        Ok(chosen.into_iter().map(|idx| pool[idx]).collect())
    }
}
