use std::path::PathBuf;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::{AnomalyService, PopulationService};
use crate::domain::Severity;
use crate::utils::persistence::load_rows_from_file;

const ANOMALY_PREVIEW_LIMIT: usize = 20;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "load",
            "Load normalized ledger rows from a JSON file",
            "load <rows.json>",
            cmd_load,
        ),
        CommandDefinition::new(
            "metrics",
            "Show population size and total under the active amount type",
            "metrics",
            cmd_metrics,
        ),
        CommandDefinition::new(
            "anomalies",
            "Classify rows by anomaly severity",
            "anomalies",
            cmd_anomalies,
        ),
    ]
}

fn cmd_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: load <rows.json>".into(),
        ));
    };
    let path = PathBuf::from(*path);
    let rows = load_rows_from_file(&path)?;
    tracing::info!(rows = rows.len(), path = %path.display(), "rows loaded");

    output::success(format!("Loaded {} rows from {}.", rows.len(), path.display()));
    context.rows = rows;
    context.source = Some(path);
    context.last_run = None;
    Ok(())
}

fn cmd_metrics(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let policy = context.config.amount_type;
    let rows = context.require_rows()?;
    let metrics = PopulationService::metrics(rows, policy);

    output::section(format!("Population ({policy})"));
    output::info(format!("  Rows loaded   : {}", rows.len()));
    output::info(format!("  Eligible rows : {}", metrics.eligible_row_count));
    output::info(format!("  Total amount  : {:.2}", metrics.total_amount));
    if metrics.is_empty() {
        output::warning("No rows carry a positive amount under this amount type.");
    }
    Ok(())
}

fn cmd_anomalies(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let policy = context.config.amount_type;
    let rows = context.require_rows()?;
    let eligible = PopulationService::eligible_rows(rows, policy);
    let report = AnomalyService::assess(&eligible, policy);

    output::section("Anomaly assessment");
    output::info(format!(
        "  Mean {:.2}, std dev {:.2}, IQR bounds [{:.2}, {:.2}], max {:.2}",
        report.mean, report.std_dev, report.lower_bound, report.upper_bound, report.maximum
    ));
    output::info(format!(
        "  High {}, medium {}, low {}",
        report.count(Severity::High),
        report.count(Severity::Medium),
        report.count(Severity::Low)
    ));

    let mut flagged: Vec<_> = report
        .flags
        .iter()
        .zip(eligible.iter())
        .filter(|(flag, _)| flag.severity > Severity::Low)
        .collect();
    flagged.sort_by(|(a, _), (b, _)| b.severity.cmp(&a.severity));
    if flagged.is_empty() {
        output::info("No medium or high severity rows.");
        return Ok(());
    }

    let table: Vec<Vec<String>> = flagged
        .iter()
        .take(ANOMALY_PREVIEW_LIMIT)
        .map(|(flag, row)| {
            vec![
                flag.severity.to_string(),
                row.date.to_string(),
                row.entry_number.clone(),
                row.account_name.clone(),
                format!("{:.2}", flag.amount),
                flag.z_score
                    .map(|z| format!("{z:.2}"))
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    output::table(
        &["Severity", "Date", "Entry", "Account", "Amount", "Z"],
        &table,
    );
    if flagged.len() > ANOMALY_PREVIEW_LIMIT {
        output::info(format!(
            "  ... {} more flagged rows",
            flagged.len() - ANOMALY_PREVIEW_LIMIT
        ));
    }
    Ok(())
}
