//! Integration tests for the tail command.
//!
//! Each test serves a canned SSE stream from a mock grading service and
//! checks the rendered lines and the exit status.


use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

/// Creates a temp GRADEX_HOME directory for test isolation.
fn temp_gradex_home() -> TempDir {
    TempDir::new().expect("create temp gradex home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

async fn mount_stream(server: &MockServer, job_id: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/jobs/{job_id}/stream")))
        .respond_with(fixtures::sse_response(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_tail_renders_full_job() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gradex_home();
    let server = MockServer::start().await;

    let body = [
        fixtures::job_started(2),
        fixtures::partial_result("alice", "q1", 8.0, 10.0),
        fixtures::partial_result("alice", "q2", 5.0, 10.0),
        fixtures::student_summary("alice", 13.0, 20.0),
        fixtures::job_done("job-1"),
    ]
    .concat();
    mount_stream(&server, "job-1", &body).await;

    cargo_bin_cmd!("gradex")
        .env("GRADEX_HOME", home.path())
        .env("GRADEX_SERVER_URL", server.uri())
        .args(["tail", "job-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 questions per student"))
        .stdout(predicate::str::contains("alice q1 8/10"))
        .stdout(predicate::str::contains("alice 13/20"))
        .stdout(predicate::str::contains("done"))
        .stderr(predicate::str::contains("Job complete."));
}

#[tokio::test]
async fn test_tail_skips_malformed_events() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gradex_home();
    let server = MockServer::start().await;

    let body = [
        fixtures::job_started(1),
        fixtures::sse_frame("this is not json"),
        fixtures::partial_result("alice", "q1", 8.0, 10.0),
        fixtures::job_done("job-1"),
    ]
    .concat();
    mount_stream(&server, "job-1", &body).await;

    cargo_bin_cmd!("gradex")
        .env("GRADEX_HOME", home.path())
        .env("GRADEX_SERVER_URL", server.uri())
        .args(["tail", "job-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice q1 8/10"))
        .stdout(predicate::str::contains("done"));
}

#[tokio::test]
async fn test_tail_reports_fatal_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gradex_home();
    let server = MockServer::start().await;

    // A result arriving after the error folds silently; only the error shows.
    let body = [
        fixtures::job_started(2),
        fixtures::partial_result("alice", "q1", 8.0, 10.0),
        fixtures::job_error("grader crashed"),
        fixtures::partial_result("alice", "q2", 5.0, 10.0),
    ]
    .concat();
    mount_stream(&server, "job-1", &body).await;

    cargo_bin_cmd!("gradex")
        .env("GRADEX_HOME", home.path())
        .env("GRADEX_SERVER_URL", server.uri())
        .args(["tail", "job-1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("grader crashed"))
        .stdout(predicate::str::contains("q2").not())
        .stderr(predicate::str::contains("Job failed"));
}

#[tokio::test]
async fn test_tail_fails_for_unknown_job() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gradex_home();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/jobs/nope/stream"))
        .respond_with(wiremock::ResponseTemplate::new(404))
        .mount(&server)
        .await;

    cargo_bin_cmd!("gradex")
        .env("GRADEX_HOME", home.path())
        .env("GRADEX_SERVER_URL", server.uri())
        .args(["tail", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 404"));
}

#[tokio::test]
async fn test_tail_exit_nonzero_when_stream_ends_early() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gradex_home();
    let server = MockServer::start().await;

    let body = [
        fixtures::job_started(2),
        fixtures::partial_result("alice", "q1", 8.0, 10.0),
    ]
    .concat();
    mount_stream(&server, "job-1", &body).await;

    cargo_bin_cmd!("gradex")
        .env("GRADEX_HOME", home.path())
        .env("GRADEX_SERVER_URL", server.uri())
        .args(["tail", "job-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "stream closed before the job finished",
        ));
}
