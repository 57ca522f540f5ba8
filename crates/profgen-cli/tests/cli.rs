use std::fs;

use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const LOGIN_REQUEST: &str = "GET /login?user=a HTTP/1.1\r\nHost: example.com\r\nUser-Agent: X\r\n\r\n";

fn profgen() -> Command {
    let mut cmd = Command::cargo_bin("profgen").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn capture(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), content).unwrap();
    file
}

#[test]
fn raw_login_request_http_get() {
    let input = capture(LOGIN_REQUEST);

    profgen()
        .arg(input.path())
        .args(["--format", "raw", "--block", "http-get"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Generated Profile\nhttp-get {\n"))
        .stdout(predicate::str::contains(r#"set uri "/login?user=a";"#))
        .stdout(predicate::str::contains(r#"header "User-Agent" "X";"#))
        .stdout(predicate::str::contains("Content-Length").not());
}

#[test]
fn reads_standard_input_with_detection() {
    profgen()
        .args(["-", "--block", "http-stager", "--name", "Stdin"])
        .write_stdin(LOGIN_REQUEST)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Stdin\nhttp-stager {\n"))
        .stdout(predicate::str::contains(r#"set uri_x64 "/login64?user=a";"#));
}

#[test]
fn empty_archive_http_config_warns() {
    let input = capture(r#"{"log": {"version": "1.2", "entries": []}}"#);

    profgen()
        .arg(input.path())
        .args(["--block", "http-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http-config {\n"))
        .stdout(predicate::str::contains(r#"header "Server" "nginx/1.18.0";"#))
        .stderr(predicate::str::contains("WARN"))
        .stderr(predicate::str::contains("placeholder"));
}

#[test]
fn malformed_raw_input_fails() {
    let input = capture("not an http request");

    profgen()
        .arg(input.path())
        .args(["--format", "raw"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid request line"));
}

#[test]
fn archive_full_profile_to_file() {
    let input = capture(indoc! {r#"
        {"log": {"entries": [
          {
            "request": {
              "method": "GET",
              "url": "https://cdn.example.com/assets/app.js?v=3",
              "headers": [
                {"name": "User-Agent", "value": "Mozilla/5.0 (X11; Linux x86_64)"},
                {"name": "Accept", "value": "*/*"},
                {"name": "Connection", "value": "keep-alive"}
              ]
            },
            "response": {
              "status": 200,
              "headers": [
                {"name": "Server", "value": "cloudflare"},
                {"name": "Content-Type", "value": "application/javascript"}
              ],
              "content": {"text": "Y29uc29sZS5sb2coMSk=", "encoding": "base64"}
            }
          },
          {
            "request": {
              "method": "POST",
              "url": "https://api.example.com/v1/events",
              "headers": [{"name": "Content-Type", "value": "application/json"}],
              "postData": {"mimeType": "application/json", "text": "{\"event\":\"view\"}"}
            },
            "response": {"status": 204, "headers": []}
          },
          {"request": {"url": "https://broken.example.com/"}}
        ]}}
    "#});
    let output = NamedTempFile::new().unwrap();

    profgen()
        .arg(input.path())
        .arg("-o")
        .arg(output.path())
        .args(["-n", "CDN", "--sleeptime", "30000", "--jitter", "15"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("skipping malformed archive entry"));

    let profile = fs::read_to_string(output.path()).unwrap();
    assert!(profile.starts_with("#\n# CDN\n"), "{profile}");
    for expected in [
        r#"set sample_name "CDN";"#,
        r#"set sleeptime "30000";"#,
        r#"set jitter "15";"#,
        r#"set useragent "Mozilla/5.0 (X11; Linux x86_64)";"#,
        r#"set uri "/assets/app.js?v=3";"#,
        r#"header "Host" "cdn.example.com";"#,
        r#"set uri "/v1/events";"#,
        r#"prepend "{\"event\":\"view\"}";"#,
        "# hosts: cdn.example.com, api.example.com",
        "# status codes: 200, 204",
        r#"header "Server" "cloudflare";"#,
    ] {
        assert!(profile.contains(expected), "missing {expected:?} in\n{profile}");
    }
    assert!(!profile.contains(r#"header "Connection""#));
    assert!(!profile.contains("console.log(1)"));
}

#[test]
fn missing_input_file_fails() {
    profgen()
        .arg("does-not-exist.har")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("cannot read does-not-exist.har"));
}

#[test]
fn rejects_out_of_range_jitter() {
    profgen().args(["-", "--jitter", "100"]).assert().failure().code(2);
}
