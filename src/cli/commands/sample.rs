use std::path::Path;

use crate::cli::commands::{parse_arg, CommandDefinition};
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::config::SampleSizeMode;
use crate::core::sampling::RngSource;
use crate::core::services::{ExportService, SamplingRun, SamplingService};
use crate::domain::SampleOrigin;
use crate::utils::persistence::save_json_to_file;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "recommend",
            "Recommend a sample size from materiality and confidence",
            "recommend",
            cmd_recommend,
        ),
        CommandDefinition::new(
            "sample",
            "Draw an audit sample using the current configuration",
            "sample [seed]",
            cmd_sample,
        ),
        CommandDefinition::new(
            "export",
            "Write the last sample with its original fields as JSON",
            "export <path>",
            cmd_export,
        ),
    ]
}

fn cmd_recommend(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let rows = context.require_rows()?;
    let recommendation = SamplingService::recommend(rows, &context.config);

    output::section("Sample size recommendation");
    output::info(format!(
        "  Confidence {} (risk factor {:.2}), materiality {:.2}",
        recommendation.confidence, recommendation.risk_factor, context.config.materiality
    ));
    output::info(format!(
        "  Recommended size: {}",
        recommendation.recommended_size
    ));
    for warning in &recommendation.warnings {
        output::warning(warning);
    }
    if context.config.sample_size_mode == SampleSizeMode::Manual {
        output::hint("Run `config set mode formula` to sample with this size.");
    }
    Ok(())
}

fn cmd_sample(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let seed = match args {
        [] => context.config.seed,
        [seed] => Some(parse_arg::<u64>(seed, "seed")?),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: sample [seed]".into(),
            ))
        }
    };
    let rows = context.require_rows()?;
    let mut rng = RngSource::from_optional_seed(seed);
    let run = SamplingService::run(rows, &context.config, &mut rng);

    print_run(&run);
    context.last_run = Some(run);
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(CommandError::InvalidArguments("usage: export <path>".into()));
    };
    let run = context.require_run()?;
    let records = ExportService::records(&run.report);
    save_json_to_file(&records, Path::new(path))?;
    output::success(format!("Exported {} rows to {path}.", records.len()));
    Ok(())
}

fn print_run(run: &SamplingRun) {
    let report = &run.report;
    output::section(format!("{} sample", report.method.label()));
    output::info(format!(
        "  Population {} rows, total {:.2}",
        run.metrics.eligible_row_count, run.metrics.total_amount
    ));
    output::info(format!(
        "  Requested {} ({}), selected {} ({} anomalies, {} sampled)",
        run.requested_size,
        run.size_mode,
        report.len(),
        report.anomaly_count,
        report.sampling_count
    ));
    for note in &report.notes {
        output::warning(note);
    }
    if report.is_empty() {
        output::warning("No rows selected.");
        return;
    }

    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|sampled| {
            let origin = match sampled.origin {
                SampleOrigin::Anomaly => "anomaly",
                SampleOrigin::Sampling => "sampling",
            };
            vec![
                origin.to_string(),
                sampled.row.date.to_string(),
                sampled.row.entry_number.clone(),
                sampled.row.account_name.clone(),
                sampled.row.vendor_name.clone(),
                format!("{:.2}", sampled.row.debit_amount),
                format!("{:.2}", sampled.row.credit_amount),
            ]
        })
        .collect();
    output::table(
        &["Origin", "Date", "Entry", "Account", "Vendor", "Debit", "Credit"],
        &rows,
    );
}
