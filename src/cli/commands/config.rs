use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::config::SamplingConfig;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "Show or change sampling settings",
        "config [show|set <key> <value>|save|reset|backup [note]|backups|restore <name>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => show(&context.config),
        ["set", key, value] => {
            context.config.set(key, value)?;
            context.last_run = None;
            output::success(format!("Set {key} = {value}."));
        }
        ["set", ..] => {
            return Err(CommandError::InvalidArguments(format!(
                "usage: config set <key> <value> (keys: {})",
                SamplingConfig::KEYS.join(", ")
            )))
        }
        ["save"] => {
            context.config_manager.save(&context.config)?;
            output::success(format!(
                "Configuration saved to {}.",
                context.config_manager.path().display()
            ));
        }
        ["reset"] => {
            context.config = SamplingConfig::default();
            context.last_run = None;
            output::success("Configuration reset to defaults (not yet saved).");
        }
        ["backup", note @ ..] => {
            let note = (!note.is_empty()).then(|| note.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            output::success(format!("Backup written: {name}"));
        }
        ["backups"] => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                output::info("No configuration backups yet.");
            }
            for name in backups {
                output::info(format!("  {name}"));
            }
        }
        ["restore", name] => {
            context.config = context.config_manager.restore(name)?;
            context.last_run = None;
            output::success(format!("Restored configuration from {name}."));
        }
        _ => {
            return Err(CommandError::InvalidArguments(format!(
                "unrecognized config arguments `{}`",
                args.join(" ")
            )))
        }
    }
    Ok(())
}

fn show(config: &SamplingConfig) {
    output::section("Sampling configuration");
    let rows: Vec<Vec<String>> = config
        .entries()
        .into_iter()
        .map(|(key, value)| vec![key.to_string(), value])
        .collect();
    output::table(&["Setting", "Value"], &rows);
}
