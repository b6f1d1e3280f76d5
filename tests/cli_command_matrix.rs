use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

fn run_help(home: &TempDir, args: &[&str], expect: &str) {
    let mut cmd = cargo_bin_cmd!("calm");
    cmd.env("HOME", home.path())
        .args(args)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains(expect));
}

#[test]
fn every_cli_command_has_help_path() {
    let home = TempDir::new().expect("temp home");

    run_help(&home, &[], "Common Architecture Language Model");

    run_help(&home, &["generate"], "--generate-all");
    run_help(&home, &["validate"], "--strict");
    run_help(&home, &["docify"], "--clear-output-directory");
}

#[test]
fn shared_source_flags_are_on_every_document_command() {
    let home = TempDir::new().expect("temp home");
    for command in ["generate", "validate", "docify"] {
        run_help(&home, &[command], "--schema-directory");
        run_help(&home, &[command], "--url-to-local-file-mapping");
    }
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let home = TempDir::new().expect("temp home");
    let mut cmd = cargo_bin_cmd!("calm");
    cmd.env("HOME", home.path())
        .arg("publish")
        .assert()
        .code(2)
        .stderr(contains("unrecognized subcommand"));
}
