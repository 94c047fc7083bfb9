//! Ledger rows and sampling output types shared by services, config and CLI.

pub mod row;
pub mod sample;

pub use row::{AmountPolicy, LedgerRow};
pub use sample::{AnomalyFlag, AnomalyRule, SampleOrigin, SampledRow, SamplingMethod, Severity};
