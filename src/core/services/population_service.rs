//! Population size and monetary total under an amount-selection policy.

use serde::{Deserialize, Serialize};

use crate::domain::{AmountPolicy, LedgerRow};

/// Snapshot of the sampling population. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationMetrics {
    pub eligible_row_count: usize,
    pub total_amount: f64,
}

impl PopulationMetrics {
    pub fn is_empty(&self) -> bool {
        self.eligible_row_count == 0
    }
}

pub struct PopulationService;

impl PopulationService {
    /// Counts rows with a strictly positive amount under `policy` and sums them.
    ///
    /// Summary and subtotal rows must already be removed upstream.
    pub fn metrics(rows: &[LedgerRow], policy: AmountPolicy) -> PopulationMetrics {
        rows.iter()
            .map(|row| row.amount(policy))
            .filter(|amount| *amount > 0.0)
            .fold(PopulationMetrics::default(), |mut acc, amount| {
                acc.eligible_row_count += 1;
                acc.total_amount += amount;
                acc
            })
    }

    /// Borrowed view of the rows that [`metrics`](Self::metrics) counts, in input order.
    pub fn eligible_rows(rows: &[LedgerRow], policy: AmountPolicy) -> Vec<&LedgerRow> {
        rows.iter().filter(|row| row.is_eligible(policy)).collect()
    }
}
