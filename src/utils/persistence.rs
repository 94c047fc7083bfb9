use std::{collections::HashSet, fs, path::Path};

use serde::Serialize;
use uuid::Uuid;

use crate::{domain::LedgerRow, errors::SamplingError};

/// Loads normalized ledger rows from a JSON array.
///
/// Each source position is its own row: a row whose `id` repeats an earlier
/// one gets a fresh id.
pub fn load_rows_from_file(path: &Path) -> Result<Vec<LedgerRow>, SamplingError> {
    let data = fs::read_to_string(path)?;
    let mut rows: Vec<LedgerRow> = serde_json::from_str(&data)?;

    let mut seen = HashSet::with_capacity(rows.len());
    let mut rekeyed = 0usize;
    for row in &mut rows {
        if !seen.insert(row.id) {
            row.id = Uuid::new_v4();
            seen.insert(row.id);
            rekeyed += 1;
        }
    }
    if rekeyed > 0 {
        tracing::warn!(rekeyed, path = %path.display(), "duplicate row ids replaced");
    }
    Ok(rows)
}

/// Writes `value` as pretty JSON, staging to a temporary file first.
pub fn save_json_to_file<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), SamplingError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rows_survive_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let rows = vec![
            LedgerRow::debit(date, 12.5).with_field("Memo", "rent"),
            LedgerRow::credit(date, 99.0).with_vendor("Acme"),
        ];
        save_json_to_file(&rows, &path).unwrap();
        let loaded = load_rows_from_file(&path).unwrap();
        assert_eq!(loaded, rows);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn malformed_file_is_a_serde_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_rows_from_file(&path),
            Err(SamplingError::Serde(_))
        ));
    }

    #[test]
    fn repeated_ids_are_rekeyed_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let first = LedgerRow::debit(date, 10.0);
        let mut second = LedgerRow::debit(date, 20.0);
        second.id = first.id;
        save_json_to_file(&[first.clone(), second], &path).unwrap();

        let loaded = load_rows_from_file(&path).unwrap();
        assert_eq!(loaded[0].id, first.id);
        assert_ne!(loaded[1].id, first.id);
        assert_eq!(loaded[1].debit_amount, 20.0);
    }
}
