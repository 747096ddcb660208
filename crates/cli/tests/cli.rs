use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("libris")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("migrate"));
}

#[test]
fn migrate_creates_tables_in_fresh_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("books.db");

    let output = Command::cargo_bin("libris")
        .unwrap()
        .current_dir(dir.path())
        .env("LIBRIS_DATABASE__URL", format!("sqlite://{}", db_path.display()))
        .env("LIBRIS_TELEMETRY__LEVEL", "warn")
        .env_remove("RUST_LOG")
        .arg("migrate")
        .output()
        .unwrap();

    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("applied 1 migration(s)"));
    assert!(db_path.exists());
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("libris")
        .unwrap()
        .current_dir(dir.path())
        .env("LIBRIS_ENV", "qa")
        .arg("migrate")
        .assert()
        .failure();
}
