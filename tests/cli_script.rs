mod common;

use assert_cmd::Command;
use predicates::str::contains;

use ledger_sampling::utils::persistence::save_json_to_file;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("ledger_sampling_cli").unwrap();
    cmd.env("LEDGER_SAMPLING_CLI_SCRIPT", "1")
        .env("LEDGER_SAMPLING_HOME", home)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_loads_samples_and_exports() {
    let dir = common::temp_dir();
    let rows_path = dir.join("rows.json");
    let export_path = dir.join("sample.json");
    let rows = common::rows_with_amounts(&[100.0, 200.0, 300.0, 50_000.0, 400.0, 150.0]);
    save_json_to_file(&rows, &rows_path).unwrap();

    let input = format!(
        "load {}\nconfig set manual_size 3\nsample 7\nexport {}\nexit\n",
        rows_path.display(),
        export_path.display()
    );
    cli(&dir)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Loaded 6 rows"))
        .stdout(contains("Random Sampling sample"))
        .stdout(contains("Exported 3 rows"));

    let json = std::fs::read_to_string(&export_path).unwrap();
    let exported: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(exported.len(), 3);
    assert!(exported
        .iter()
        .any(|record| record["Classification"] == "Anomaly" && record["Debit"] == 50_000.0));
    assert!(exported
        .iter()
        .all(|record| record["Sampling Method"] == "Random Sampling"));
}

#[test]
fn script_mode_persists_configuration_between_runs() {
    let dir = common::temp_dir();
    cli(&dir)
        .write_stdin("config set sampling_method mus\nconfig save\nexit\n")
        .assert()
        .success()
        .stdout(contains("Configuration saved"));

    cli(&dir)
        .write_stdin("config show\nexit\n")
        .assert()
        .success()
        .stdout(contains("mus"));
}

#[test]
fn sampling_before_loading_reports_an_error_and_keeps_running() {
    let dir = common::temp_dir();
    cli(&dir)
        .write_stdin("sample\nversion\nexit\n")
        .assert()
        .success()
        .stderr(contains("load"))
        .stdout(contains("Ledger Sampling"));
}
