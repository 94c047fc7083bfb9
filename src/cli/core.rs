//! Shell context, dispatch, and command error handling.

use std::{io, path::PathBuf};

use strsim::levenshtein;

use crate::{
    config::{ConfigManager, SamplingConfig},
    core::services::SamplingRun,
    domain::LedgerRow,
    errors::SamplingError,
};

pub use crate::errors::CliError;

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No rows loaded. Use `load <rows.json>` first.")]
    RowsNotLoaded,
    #[error("No sample drawn yet. Use `sample` first.")]
    NoSample,
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] SamplingError),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

/// Mutable state shared by every command in one shell session.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub config_manager: ConfigManager,
    pub config: SamplingConfig,
    pub rows: Vec<LedgerRow>,
    pub source: Option<PathBuf>,
    pub last_run: Option<SamplingRun>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        Self::with_manager(mode, config_manager)
    }

    pub fn with_manager(mode: CliMode, config_manager: ConfigManager) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            config_manager,
            config,
            rows: Vec::new(),
            source: None,
            last_run: None,
            last_command: None,
            running: true,
        })
    }

    pub fn prompt(&self) -> String {
        match &self.source {
            Some(path) => {
                let name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("rows");
                format!("sampling [{name}]> ")
            }
            None => "sampling> ".into(),
        }
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|definition| definition.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &input.to_lowercase()), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{name}`?"));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Command(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::RowsNotLoaded => {
                output::error(CommandError::RowsNotLoaded);
                output::hint("Rows are a JSON array of ledger lines, e.g. `load journal.json`.");
            }
            other => output::error(other),
        }
    }

    pub(crate) fn require_rows(&self) -> Result<&[LedgerRow], CommandError> {
        if self.source.is_none() {
            return Err(CommandError::RowsNotLoaded);
        }
        Ok(&self.rows)
    }

    pub(crate) fn require_run(&self) -> Result<&SamplingRun, CommandError> {
        self.last_run.as_ref().ok_or(CommandError::NoSample)
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match super::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&raw.to_lowercase(), raw, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::utils::persistence::save_json_to_file;

    fn context(temp: &TempDir) -> ShellContext {
        let manager = ConfigManager::with_base_dir(temp.path().join("home")).unwrap();
        ShellContext::with_manager(CliMode::Script, manager).unwrap()
    }

    fn write_rows(temp: &TempDir) -> PathBuf {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut rows: Vec<LedgerRow> = (0..30)
            .map(|idx| LedgerRow::debit(date, 100.0 + idx as f64))
            .collect();
        rows.push(LedgerRow::debit(date, 75_000.0).with_description("Year-end accrual"));
        let path = temp.path().join("rows.json");
        save_json_to_file(&rows, &path).unwrap();
        path
    }

    #[test]
    fn commands_require_loaded_rows() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let err = ctx.process_line("metrics").expect_err("rows missing");
        assert!(matches!(err, CommandError::RowsNotLoaded));
    }

    #[test]
    fn load_configure_and_sample() {
        let temp = TempDir::new().unwrap();
        let path = write_rows(&temp);
        let mut ctx = context(&temp);

        ctx.process_line(&format!("load {}", path.display())).unwrap();
        assert_eq!(ctx.rows.len(), 31);

        ctx.process_line("config set method systematic").unwrap();
        ctx.process_line("config set size 5").unwrap();
        ctx.process_line("sample 11").unwrap();

        let run = ctx.last_run.as_ref().expect("sample recorded");
        assert_eq!(run.report.len(), 5);
        assert_eq!(run.report.anomaly_count, 1);

        let export = temp.path().join("sample.json");
        ctx.process_line(&format!("export {}", export.display())).unwrap();
        let written = std::fs::read_to_string(export).unwrap();
        assert!(written.contains("Systematic Sampling"));
        assert!(written.contains("Anomaly"));
    }

    #[test]
    fn unknown_command_continues() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        assert_eq!(ctx.process_line("sampel").unwrap(), LoopControl::Continue);
        assert_eq!(ctx.process_line("exit").unwrap(), LoopControl::Exit);
    }

    #[test]
    fn invalid_config_value_is_reported() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(&temp);
        let err = ctx
            .process_line("config set confidence 42")
            .expect_err("bad confidence");
        assert!(matches!(err, CommandError::Core(SamplingError::Config(_))));
    }

    #[test]
    fn unreadable_config_surfaces_as_core_error() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().join("home")).unwrap();
        std::fs::write(manager.path(), "{ not json").unwrap();
        let err = ShellContext::with_manager(CliMode::Script, manager)
            .err()
            .expect("corrupt config rejected");
        assert!(matches!(err, CliError::Core(SamplingError::Serde(_))));
    }
}
