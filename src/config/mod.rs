//! Caller-owned sampling configuration and its JSON persistence.

use std::{
    fmt,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::services::AllocationRequest;
use crate::core::utils::{ensure_dir, PathResolver};
use crate::domain::{AmountPolicy, SamplingMethod};
use crate::errors::SamplingError;

const BACKUP_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "config_";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleSizeMode {
    #[default]
    Manual,
    Formula,
}

impl fmt::Display for SampleSizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSizeMode::Manual => f.write_str("manual"),
            SampleSizeMode::Formula => f.write_str("formula"),
        }
    }
}

impl FromStr for SampleSizeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(SampleSizeMode::Manual),
            "formula" => Ok(SampleSizeMode::Formula),
            other => Err(format!(
                "unknown sample size mode `{other}` (expected manual or formula)"
            )),
        }
    }
}

/// Sampling settings chosen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub amount_type: AmountPolicy,
    pub sampling_method: SamplingMethod,
    pub sample_size_mode: SampleSizeMode,
    pub manual_size: usize,
    pub materiality: f64,
    /// Percent; 90, 95 and 99 are recognized, anything else falls back to 95.
    pub confidence_level: u32,
    pub include_anomalies: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            amount_type: AmountPolicy::Both,
            sampling_method: SamplingMethod::Random,
            sample_size_mode: SampleSizeMode::Manual,
            manual_size: 25,
            materiality: 1_000_000.0,
            confidence_level: 95,
            include_anomalies: true,
            seed: None,
        }
    }
}

impl SamplingConfig {
    pub const KEYS: [&'static str; 8] = [
        "amount_type",
        "sampling_method",
        "sample_size_mode",
        "manual_size",
        "materiality",
        "confidence_level",
        "include_anomalies",
        "seed",
    ];

    /// Updates one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SamplingError> {
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "amount_type" | "amount" => self.amount_type = value.parse().map_err(invalid)?,
            "sampling_method" | "method" => {
                self.sampling_method = value.parse().map_err(invalid)?
            }
            "sample_size_mode" | "mode" => {
                self.sample_size_mode = value.parse().map_err(invalid)?
            }
            "manual_size" | "size" => {
                self.manual_size = value.trim().parse().map_err(|_| {
                    invalid(format!("sample size `{value}` must be a whole number"))
                })?
            }
            "materiality" => {
                let parsed: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("materiality `{value}` is not a number")))?;
                if !(parsed.is_finite() && parsed > 0.0) {
                    return Err(invalid(format!("materiality must be positive, got {parsed}")));
                }
                self.materiality = parsed;
            }
            "confidence_level" | "confidence" => {
                let parsed: u32 = value
                    .trim()
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_| invalid(format!("confidence `{value}` is not a percent")))?;
                if ![90, 95, 99].contains(&parsed) {
                    return Err(invalid(format!(
                        "confidence must be 90, 95 or 99, got {parsed}"
                    )));
                }
                self.confidence_level = parsed;
            }
            "include_anomalies" | "anomalies" => {
                self.include_anomalies = parse_flag(value)
                    .ok_or_else(|| invalid(format!("`{value}` is not a yes/no value")))?
            }
            "seed" => {
                let trimmed = value.trim();
                self.seed = if trimmed.eq_ignore_ascii_case("none") || trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.parse().map_err(|_| {
                        invalid(format!("seed `{value}` must be an unsigned integer or none"))
                    })?)
                };
            }
            other => {
                return Err(invalid(format!(
                    "unknown setting `{other}` (expected one of: {})",
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Allocation request for an already-decided sample size.
    pub fn allocation_request(&self, requested_size: usize) -> AllocationRequest {
        AllocationRequest::new(requested_size, self.sampling_method, self.amount_type)
            .with_anomalies(self.include_anomalies)
    }

    /// Key/value pairs for display.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount_type", self.amount_type.to_string()),
            ("sampling_method", self.sampling_method.to_string()),
            ("sample_size_mode", self.sample_size_mode.to_string()),
            ("manual_size", self.manual_size.to_string()),
            ("materiality", format!("{:.2}", self.materiality)),
            ("confidence_level", format!("{}%", self.confidence_level)),
            ("include_anomalies", self.include_anomalies.to_string()),
            (
                "seed",
                self.seed
                    .map(|seed| seed.to_string())
                    .unwrap_or_else(|| "none".into()),
            ),
        ]
    }
}

fn invalid(message: impl Into<String>) -> SamplingError {
    SamplingError::Config(message.into())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Loads and stores [`SamplingConfig`] under the application directory.
pub struct ConfigManager {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, SamplingError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, SamplingError> {
        ensure_dir(&base)?;
        let backups_dir = PathResolver::config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            backups_dir,
        })
    }

    /// Stored configuration, or defaults when nothing was saved yet.
    pub fn load(&self) -> Result<SamplingConfig, SamplingError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(SamplingConfig::default())
        }
    }

    pub fn save(&self, config: &SamplingConfig) -> Result<(), SamplingError> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Writes a timestamped copy and returns its file name.
    pub fn backup(&self, config: &SamplingConfig, note: Option<&str>) -> Result<String, SamplingError> {
        ensure_dir(&self.backups_dir)?;
        let mut name = format!(
            "{BACKUP_PREFIX}{}",
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = note.and_then(slug) {
            name.push('_');
            name.push_str(&label);
        }
        name.push('.');
        name.push_str(BACKUP_EXTENSION);
        write_file(
            &self.backups_dir.join(&name),
            &serde_json::to_string_pretty(config)?,
        )?;
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> Result<SamplingConfig, SamplingError> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(SamplingError::Config(format!(
                "configuration backup `{backup_name}` not found"
            )));
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, SamplingError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| backup_timestamp(b).cmp(&backup_timestamp(a)).then(b.cmp(a)));
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn slug(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join("-"))
    }
}

fn backup_timestamp(name: &str) -> Option<NaiveDateTime> {
    let stem = name.strip_prefix(BACKUP_PREFIX)?;
    let raw = stem.get(..15)?;
    NaiveDateTime::parse_from_str(raw, BACKUP_TIMESTAMP_FORMAT).ok()
}

fn write_file(path: &Path, data: &str) -> Result<(), SamplingError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
