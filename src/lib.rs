#![doc(test(attr(deny(warnings))))]

//! Ledger Sampling selects audit samples from normalized journal rows:
//! population metrics, a materiality-based sample size, anomaly detection,
//! and random, systematic or monetary unit sampling.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Ledger Sampling tracing initialized.");
    });
}
