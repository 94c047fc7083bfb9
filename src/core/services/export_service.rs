//! Shapes a sample for spreadsheet-style export.

use serde_json::{Map, Value};

use crate::core::services::SampleReport;
use crate::domain::{LedgerRow, SampledRow};

pub const CLASSIFICATION_COLUMN: &str = "Classification";
pub const METHOD_COLUMN: &str = "Sampling Method";

pub struct ExportService;

impl ExportService {
    /// One record per sampled row: the original field bag plus the method
    /// column, and the anomaly/normal column when anomalies were requested.
    ///
    /// Rows without an original field bag fall back to their canonical fields.
    pub fn records(report: &SampleReport) -> Vec<Map<String, Value>> {
        report
            .rows
            .iter()
            .map(|sampled| Self::record(sampled, report.include_anomalies))
            .collect()
    }

    fn record(sampled: &SampledRow, include_classification: bool) -> Map<String, Value> {
        let mut record = if sampled.row.fields.is_empty() {
            canonical_fields(&sampled.row)
        } else {
            sampled.row.fields.clone()
        };
        if include_classification {
            let label = if sampled.is_anomaly() {
                "Anomaly"
            } else {
                "Normal"
            };
            record.insert(CLASSIFICATION_COLUMN.into(), Value::from(label));
        }
        record.insert(METHOD_COLUMN.into(), Value::from(sampled.method.label()));
        record
    }
}

fn canonical_fields(row: &LedgerRow) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("Date".into(), Value::from(row.date.format("%Y-%m-%d").to_string()));
    record.insert("Entry Number".into(), Value::from(row.entry_number.clone()));
    record.insert("Account".into(), Value::from(row.account_name.clone()));
    record.insert("Vendor".into(), Value::from(row.vendor_name.clone()));
    record.insert("Description".into(), Value::from(row.description.clone()));
    record.insert("Debit".into(), Value::from(row.debit_amount));
    record.insert("Credit".into(), Value::from(row.credit_amount));
    record
}
