//! CLI integration tests for the Diary command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Invalid inputs are rejected with appropriate messages
//! - Roster commands talk to the backend and honour `--json`
//!
//! Every invocation points `DIARY_CONFIG_DIR` and the working directory at
//! temporary directories so the real user config is never read or written.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Isolated environment for one test.
struct Sandbox {
    config_dir: TempDir,
    work_dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            work_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a command for the diary binary.
    fn diary(&self) -> Command {
        let mut cmd = Command::cargo_bin("diary").unwrap();
        cmd.current_dir(self.work_dir.path())
            .env("DIARY_CONFIG_DIR", self.config_dir.path())
            .env_remove("DIARY_SERVER_URL")
            .env_remove("DIARY_USER_ID")
            .env_remove("DIARY_API_KEY");
        cmd
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    Sandbox::new()
        .diary()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Diary"))
        .stdout(predicate::str::contains("roster"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    Sandbox::new()
        .diary()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("diary"));
}

#[test]
fn test_roster_subcommands_listed() {
    Sandbox::new()
        .diary()
        .args(["roster", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("followed"))
        .stdout(predicate::str::contains("toggle"))
        .stdout(predicate::str::contains("sample"))
        .stdout(predicate::str::contains("affinity"));
}

#[test]
fn test_config_subcommands_listed() {
    Sandbox::new()
        .diary()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_global_flags_accepted() {
    Sandbox::new()
        .diary()
        .args([
            "--verbose",
            "--json",
            "--server",
            "http://localhost:9999",
            "--user",
            "u1",
            "--help",
        ])
        .assert()
        .success();
}

#[test]
fn test_unknown_subcommand_fails() {
    Sandbox::new()
        .diary()
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_affinity_requires_numeric_delta() {
    Sandbox::new()
        .diary()
        .args(["roster", "affinity", "a", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_roster_without_user_fails() {
    Sandbox::new()
        .diary()
        .args(["roster", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no user selected"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_config_dir() {
    let sandbox = Sandbox::new();
    let expected = sandbox.config_dir.path().join("config.toml");
    sandbox
        .diary()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_config_init_local_then_show() {
    let sandbox = Sandbox::new();
    sandbox
        .diary()
        .args(["config", "init", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));
    assert!(sandbox.work_dir.path().join("diary.toml").is_file());

    sandbox
        .diary()
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stale_after_secs\": 30"))
        .stdout(predicate::str::contains("\"expire_after_secs\": 300"))
        .stdout(predicate::str::contains("diary.toml"));
}

#[test]
fn test_invalid_config_is_reported() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.work_dir.path().join("diary.toml"),
        "[roster]\nstale_after_secs = 900\n",
    )
    .unwrap();

    sandbox
        .diary()
        .args(["--user", "u1", "roster", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stale_after_secs"));
}

#[test]
fn test_config_commands_work_with_invalid_config() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.work_dir.path().join("diary.toml"),
        "[roster]\nstale_after_secs = 900\n",
    )
    .unwrap();
    let expected = sandbox.config_dir.path().join("config.toml");

    sandbox
        .diary()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));

    sandbox
        .diary()
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"stale_after_secs\": 900"))
        .stdout(predicate::str::contains("roster.stale_after_secs"))
        .stdout(predicate::str::contains("diary.toml"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Roster Commands
// ─────────────────────────────────────────────────────────────────────────────

async fn backend() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/u1/characters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "a", "name": "Aki", "is_following": false, "affinity": 1 },
            { "id": "b", "name": "Bo", "is_following": true, "affinity": 2,
              "user_character_relation_id": "rel-b" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/users/u1/characters/a/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "relation_id": "r1",
            "is_following": true
        })))
        .mount(&server)
        .await;

    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_roster_list_json() {
    let server = backend().await;
    let sandbox = Sandbox::new();

    sandbox
        .diary()
        .args(["--json", "--server", &server.uri(), "--user", "u1", "roster", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Aki\""))
        .stdout(predicate::str::contains("\"name\": \"Bo\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_roster_followed_only_lists_followed() {
    let server = backend().await;
    let sandbox = Sandbox::new();

    sandbox
        .diary()
        .args(["--server", &server.uri(), "--user", "u1", "roster", "followed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bo"))
        .stdout(predicate::str::contains("Aki").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_roster_toggle_reports_confirmed_state() {
    let server = backend().await;
    let sandbox = Sandbox::new();

    sandbox
        .diary()
        .args(["--json", "--server", &server.uri(), "--user", "u1", "roster", "toggle", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"user_character_relation_id\": \"r1\""))
        .stdout(predicate::str::contains("\"is_following\": true"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_roster_toggle_unknown_character_fails() {
    let server = backend().await;
    let sandbox = Sandbox::new();

    sandbox
        .diary()
        .args(["--server", &server.uri(), "--user", "u1", "roster", "toggle", "zzz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Character not found in roster: zzz"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_roster_sample_never_exceeds_followed() {
    let server = backend().await;
    let sandbox = Sandbox::new();

    sandbox
        .diary()
        .args(["--json", "--server", &server.uri(), "--user", "u1", "roster", "sample", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Bo\""))
        .stdout(predicate::str::contains("Aki").not());
}
