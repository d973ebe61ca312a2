//! End-to-end checks of the CLI surface that need no backend

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command running in an empty directory with no backend variables set
fn pawfinder(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pawfinder").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("SUPABASE_SERVICE_ROLE_KEY")
        .env_remove("PAWFINDER_CONFIG")
        .env_remove("PAWFINDER_ENV");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("health"))
        .stdout(predicate::str::contains("reports"))
        .stdout(predicate::str::contains("rewards"))
        .stdout(predicate::str::contains("locate"))
        .stdout(predicate::str::contains("places"));
}

#[test]
fn version_matches_package() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir).assert().failure();
}

#[test]
fn unknown_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .args(["--format", "xml", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn out_of_range_coordinate_is_rejected() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .args(["rewards", "--near", "95,100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--near"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .args(["--config", "nope.toml", "health"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn invalid_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pawfinder.toml"), "[search\npage_size = ").unwrap();
    pawfinder(&dir)
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pawfinder.toml"));
}

#[test]
fn production_requires_project_url() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SUPABASE_URL"));
}

#[test]
fn authorize_url_uses_local_project_in_development() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .env("PAWFINDER_ENV", "development")
        .args(["auth", "authorize-url", "google"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "http://localhost:54321/auth/v1/authorize?provider=google",
        ));
}

#[test]
fn authorize_url_as_json() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .env("PAWFINDER_ENV", "development")
        .args(["--format", "json", "auth", "authorize-url", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"provider\": \"github\""));
}

#[test]
fn blank_place_query_fails_without_network() {
    let dir = TempDir::new().unwrap();
    pawfinder(&dir)
        .args(["places", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Query is empty"));
}
