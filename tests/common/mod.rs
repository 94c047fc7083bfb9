#![allow(dead_code)]

use std::sync::Mutex;

use chrono::{Duration, NaiveDate};
use ledger_sampling::domain::LedgerRow;
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh directory that outlives the calling test.
pub fn temp_dir() -> std::path::PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn rows_with_amounts(amounts: &[f64]) -> Vec<LedgerRow> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    amounts
        .iter()
        .enumerate()
        .map(|(idx, amount)| {
            LedgerRow::debit(start + Duration::days((idx % 365) as i64), *amount)
                .with_entry_number(format!("JE-{idx:05}"))
                .with_account(if idx % 2 == 0 { "Expenses" } else { "Payables" })
        })
        .collect()
}

/// Heavy-tailed ledger: mostly small postings, a few very large ones, some
/// credit-side and zero lines.
pub fn skewed_ledger(len: usize, seed: u64) -> Vec<LedgerRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..len)
        .map(|idx| {
            let date = start + Duration::days((idx % 365) as i64);
            let amount = match rng.gen_range(0..100) {
                0 => rng.gen_range(50_000.0..500_000.0),
                1..=9 => 0.0,
                _ => rng.gen_range(10.0..2_000.0),
            };
            let row = if rng.gen_bool(0.3) {
                LedgerRow::credit(date, amount)
            } else {
                LedgerRow::debit(date, amount)
            };
            row.with_entry_number(format!("V{:04}", idx / 2))
        })
        .collect()
}
