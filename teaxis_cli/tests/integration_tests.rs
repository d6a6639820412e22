//! Integration tests for the teaxis binary.
//!
//! These tests verify end-to-end behavior including:
//! - Sign-in, sign-out and the persisted session file
//! - Screen gating by session phase
//! - 401 handling across process restarts
//! - Local refusals that never reach the backend

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Helper to create an isolated home for one test
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// The CLI binary, isolated from the user's config and environment
fn cli(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("teaxis"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("TEAXIS_API_URL")
        .env_remove("TEAXIS_PASSWORD")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(home.join("data"));
    cmd
}

fn user_json(role: &str) -> Value {
    json!({"id": 1, "nome": "Ana", "email": "ana@x.com", "tipo": role})
}

fn session_path(home: &Path) -> std::path::PathBuf {
    home.join("data").join("auth-storage.json")
}

/// Write a session file as a previous run would have
fn store_session(home: &Path, role: &str) {
    let path = session_path(home);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let blob = json!({"user": user_json(role), "token": "abc", "isAuthenticated": true});
    fs::write(path, blob.to_string()).unwrap();
}

fn read_session(home: &Path) -> Value {
    let contents = fs::read_to_string(session_path(home)).expect("Failed to read session");
    serde_json::from_str(&contents).unwrap()
}

#[test]
fn test_cli_help() {
    let home = setup_test_dir();
    cli(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Teaxis care-matching platform client"));
}

#[test]
fn test_whoami_when_signed_out() {
    let home = setup_test_dir();
    cli(home.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[test]
fn test_signed_in_screens_are_gated() {
    let home = setup_test_dir();
    cli(home.path())
        .args(["--api-url", "http://127.0.0.1:9"])
        .args(["sessions", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please sign in first"));
}

#[test]
fn test_config_lookup_is_logged() {
    let home = setup_test_dir();
    cli(home.path())
        .arg("whoami")
        .assert()
        .success()
        .stderr(predicate::str::contains("No config file found"));
}

#[test]
fn test_config_log_level_applies() {
    let home = setup_test_dir();
    let config_dir = home.path().join("config").join("teaxis");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[logging]\nlevel = \"debug\"\n").unwrap();

    cli(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "whoami"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded config from"))
        .stderr(predicate::str::contains("Backend http://127.0.0.1:9"));
}

#[test]
fn test_invalid_api_url_is_rejected() {
    let home = setup_test_dir();
    cli(home.path())
        .args(["--api-url", "not a url", "whoami"])
        .assert()
        .failure();
}

#[test]
fn test_register_validation_happens_locally() {
    let home = setup_test_dir();
    cli(home.path())
        // nothing listens here; validation must fail first
        .args(["--api-url", "http://127.0.0.1:9"])
        .args([
            "register",
            "--name",
            "Ana",
            "--email",
            "ana@x.com",
            "--password",
            "secret1",
            "--confirm-password",
            "secret2",
            "--birth-date",
            "1995-08-20",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The passwords do not match."));
}

#[test]
fn test_restored_session_without_network() {
    let home = setup_test_dir();
    store_session(home.path(), "PROFISSIONAL");

    cli(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Hello, Ana! You are signed in as a professional.",
        ));
}

#[test]
fn test_corrupt_session_file_starts_signed_out() {
    let home = setup_test_dir();
    let path = session_path(home.path());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ not json").unwrap();

    cli(home.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[test]
fn test_logout_twice() {
    let home = setup_test_dir();
    store_session(home.path(), "USUARIO");

    for _ in 0..2 {
        cli(home.path()).arg("logout").assert().success();
        let session = read_session(home.path());
        assert_eq!(session["isAuthenticated"], false);
        assert!(session["token"].is_null());
        assert!(session["user"].is_null());
    }
}

#[test]
fn test_delete_account_needs_confirmation() {
    let home = setup_test_dir();
    store_session(home.path(), "USUARIO");

    cli(home.path())
        .args(["--api-url", "http://127.0.0.1:9", "delete-account"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("explicit confirmation"));

    assert_eq!(read_session(home.path())["isAuthenticated"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = setup_test_dir();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc",
            "usuario": user_json("USUARIO"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    cli(home.path())
        .args(["--api-url", server.uri().as_str()])
        .args(["login", "--email", "ana@x.com"])
        .env("TEAXIS_PASSWORD", "secret1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, Ana!"));

    let session = read_session(home.path());
    assert_eq!(session["token"], "abc");
    assert_eq!(session["isAuthenticated"], true);
    assert_eq!(session["user"]["id"], 1);

    // already signed in: the login screen is gone
    cli(home.path())
        .args(["--api-url", server.uri().as_str()])
        .args(["login", "--email", "ana@x.com", "--password", "secret1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already signed in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_credentials() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = setup_test_dir();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    cli(home.path())
        .args(["--api-url", server.uri().as_str()])
        .args(["login", "--email", "ana@x.com", "--password", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid e-mail or password."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_response_clears_stored_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = setup_test_dir();
    store_session(home.path(), "USUARIO");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessoes/minhas"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    cli(home.path())
        .args(["--api-url", server.uri().as_str(), "sessions", "list"])
        .assert()
        .failure();

    let session = read_session(home.path());
    assert_eq!(session["isAuthenticated"], false);

    cli(home.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_professionals_list_marks_favorites() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = setup_test_dir();
    store_session(home.path(), "USUARIO");

    let bruno = json!({"id": 4, "usuario": {"id": 104, "nome": "Dr. Bruno", "email": "b@x.com", "tipo": "PROFISSIONAL"}});
    let carla = json!({"id": 5, "usuario": {"id": 105, "nome": "Dra. Carla", "email": "c@x.com", "tipo": "PROFISSIONAL"}});

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profissionais"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bruno, carla.clone()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/favoritos/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "profissional": carla}])),
        )
        .mount(&server)
        .await;

    cli(home.path())
        .args(["--api-url", server.uri().as_str(), "professionals"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  [4] Dr. Bruno"))
        .stdout(predicate::str::contains("★ [5] Dra. Carla"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_matching_refused_for_professionals() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = setup_test_dir();
    store_session(home.path(), "PROFISSIONAL");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    cli(home.path())
        .args(["--api-url", server.uri().as_str(), "matching"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only available to patients"));
}
