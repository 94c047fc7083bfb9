use super::{RandomSource, SamplingStrategy};
use crate::domain::{AmountPolicy, LedgerRow, SamplingMethod};
use crate::errors::Result;

/// Every k-th row from one random start, with `k = floor(n / size)`.
///
/// Since the start lies in `[0, k)` and `size * k <= n`, no index wraps and
/// the selection is always `size` distinct rows. The modulo is kept so a
/// caller-supplied interval of 1 still stays in bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystematicStrategy;

impl SystematicStrategy {
    pub fn interval(pool_len: usize, size: usize) -> usize {
        if size == 0 {
            return 1;
        }
        (pool_len / size).max(1)
    }
}

impl SamplingStrategy for SystematicStrategy {
    fn method(&self) -> SamplingMethod {
        SamplingMethod::Systematic
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

        let interval = Self::interval(pool.len(), size);
        let start = rng.next_index(interval);
        tracing::debug!(interval, start, size, "systematic selection");

        Ok((0..size)
            .map(|step| pool[(start + step * interval) % pool.len()])
            .collect())
    }
}
