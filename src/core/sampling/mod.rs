//! Interchangeable selection strategies over an eligible row pool.

pub mod monetary_unit;
pub mod random;
pub mod rng;
pub mod systematic;

pub use monetary_unit::MonetaryUnitStrategy;
pub use random::RandomStrategy;
pub use rng::{RandomSource, RngSource, ScriptedSource};
pub use systematic::SystematicStrategy;

use crate::domain::{AmountPolicy, LedgerRow, SamplingMethod};
use crate::errors::Result;

/// Selects up to `size` rows from `pool`.
///
/// Implementations clamp `size` to `pool.len()` first and never return the
/// same row twice.
pub trait SamplingStrategy {
    fn method(&self) -> SamplingMethod;

    fn select<'a>(
        &self,
        pool: &[&'a LedgerRow],
        size: usize,
        policy: AmountPolicy,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<&'a LedgerRow>>;
}

/// Returns the strategy implementing `method`.
pub fn strategy_for(method: SamplingMethod) -> Box<dyn SamplingStrategy> {
    match method {
        SamplingMethod::Random => Box::new(RandomStrategy),
        SamplingMethod::Systematic => Box::new(SystematicStrategy),
        SamplingMethod::Mus => Box::new(MonetaryUnitStrategy),
    }
}
