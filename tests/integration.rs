//! End-to-end tests driving the `docsight` binary: init, ingest, list,
//! get, metrics, and the failure paths that must not persist anything.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docsight_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docsight");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/docsight.sqlite"

[storage]
upload_dir = "{root}/uploads"

[pipeline]
max_summary_sentences = 3

[server]
bind = "127.0.0.1:7431"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("docsight.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docsight(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docsight_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docsight binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Pull the value of an `  id:  <value>` style line out of command output.
fn field(stdout: &str, name: &str) -> String {
    stdout
        .lines()
        .find_map(|l| {
            let l = l.trim_start();
            l.strip_prefix(name).map(|rest| rest.trim().to_string())
        })
        .unwrap_or_else(|| panic!("no '{}' field in output:\n{}", name, stdout))
}

/// Slice the text of one `--- Section ---` block out of `docsight get` output.
fn section<'a>(stdout: &'a str, header: &str) -> &'a str {
    let start = stdout
        .find(header)
        .unwrap_or_else(|| panic!("no '{}' section in output:\n{}", header, stdout))
        + header.len();
    let rest = &stdout[start..];
    match rest.find("\n--- ") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

const FIVE_SENTENCES: &str = "Globex Corporation released a new product. \
The launch happened on March 3, 2021. \
Customers were pleased with the results. \
The team celebrated the milestone. \
More updates will follow soon.";

#[test]
fn init_is_idempotent() {
    let (_tmp, config) = setup_test_env();

    let (stdout, stderr, ok) = run_docsight(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully."));

    let (_, stderr, ok) = run_docsight(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn ingest_list_get_round_trip() {
    let (tmp, config) = setup_test_env();
    run_docsight(&config, &["init"]);

    let file = tmp.path().join("files/report.txt");
    fs::write(&file, FIVE_SENTENCES).unwrap();

    let (stdout, stderr, ok) = run_docsight(
        &config,
        &["ingest", file.to_str().unwrap(), "--owner", "alice"],
    );
    assert!(ok, "ingest failed: {}", stderr);
    assert!(stdout.contains("ok"));
    let id = field(&stdout, "id:");

    // The upload landed in managed storage.
    let location = field(&stdout, "location:");
    assert!(Path::new(&location).is_file());

    let (stdout, _, ok) = run_docsight(&config, &["list", "--owner", "alice"]);
    assert!(ok);
    assert!(stdout.contains(&id));
    assert!(stdout.contains("report.txt"));

    // Another owner sees nothing.
    let (stdout, _, ok) = run_docsight(&config, &["list", "--owner", "bob"]);
    assert!(ok);
    assert!(stdout.contains("No documents for owner 'bob'."));

    let (stdout, _, ok) = run_docsight(&config, &["get", &id]);
    assert!(ok);
    assert!(stdout.contains("owner:      alice"));
    assert!(stdout.contains("filename:   report.txt"));
    assert_eq!(section(&stdout, "--- Raw ---").trim(), FIVE_SENTENCES);
}

#[test]
fn five_sentence_upload_yields_summary_and_two_entities() {
    let (tmp, config) = setup_test_env();
    run_docsight(&config, &["init"]);

    let file = tmp.path().join("files/launch.txt");
    fs::write(&file, FIVE_SENTENCES).unwrap();

    let (stdout, stderr, ok) = run_docsight(
        &config,
        &["ingest", file.to_str().unwrap(), "--owner", "alice"],
    );
    assert!(ok, "ingest failed: {}", stderr);
    let id = field(&stdout, "id:");

    let (stdout, _, ok) = run_docsight(&config, &["get", &id]);
    assert!(ok);

    // Exactly one organization and one date, in source order.
    let entities = section(&stdout, "--- Entities (2) ---");
    let lines: Vec<&str> = entities.trim().lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[ORG] Globex Corporation"));
    assert!(lines[1].starts_with("[DATE] March 3 , 2021"));

    // The summary is the first three sentences of the normalized text.
    let summary = section(&stdout, "--- Summary ---").trim();
    assert!(summary.starts_with("Globex Corporation release new product ."));
    assert!(summary.contains("March 3 , 2021"));
    assert!(!summary.contains("milestone"));

    // Normalized text carries no stop words.
    let normalized = section(&stdout, "--- Normalized ---");
    for stop in ["the", "was", "were", "with", "will", "a", "on", "of"] {
        assert!(
            !normalized.split_whitespace().any(|t| t == stop),
            "stop word '{}' survived normalization: {}",
            stop,
            normalized
        );
    }
    assert!(normalized.trim().starts_with(summary));
}

#[test]
fn unsupported_extension_is_rejected_and_not_persisted() {
    let (tmp, config) = setup_test_env();
    run_docsight(&config, &["init"]);

    let file = tmp.path().join("files/payload.exe");
    fs::write(&file, b"MZ\x90\x00").unwrap();

    let (_, stderr, ok) = run_docsight(
        &config,
        &["ingest", file.to_str().unwrap(), "--owner", "alice"],
    );
    assert!(!ok);
    assert!(stderr.contains("unsupported format"), "stderr: {}", stderr);

    // Nothing was persisted and no stored copy was left behind.
    let (stdout, _, ok) = run_docsight(&config, &["list", "--owner", "alice"]);
    assert!(ok);
    assert!(stdout.contains("No documents for owner 'alice'."));
    let uploads = tmp.path().join("uploads");
    if uploads.exists() {
        assert_eq!(fs::read_dir(&uploads).unwrap().count(), 0);
    }
}

#[test]
fn get_unknown_id_reports_not_found() {
    let (_tmp, config) = setup_test_env();
    run_docsight(&config, &["init"]);

    let (_, stderr, ok) = run_docsight(&config, &["get", "no-such-id"]);
    assert!(!ok);
    assert!(stderr.contains("document not found"));
}

#[test]
fn metrics_report_counts_uploads_and_entity_labels() {
    let (tmp, config) = setup_test_env();
    run_docsight(&config, &["init"]);

    for name in ["one.txt", "two.txt"] {
        let file = tmp.path().join("files").join(name);
        fs::write(&file, FIVE_SENTENCES).unwrap();
        let (_, stderr, ok) = run_docsight(
            &config,
            &["ingest", file.to_str().unwrap(), "--owner", "alice"],
        );
        assert!(ok, "ingest failed: {}", stderr);
    }

    let (stdout, stderr, ok) = run_docsight(&config, &["metrics", "--days", "7"]);
    assert!(ok, "metrics failed: {}", stderr);

    // Seven day rows, one of them (today) counting both uploads.
    assert!(stdout.contains("UPLOADS"));
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let today_line = stdout
        .lines()
        .find(|l| l.contains(&today))
        .unwrap_or_else(|| panic!("no row for {} in:\n{}", today, stdout));
    assert_eq!(today_line.split_whitespace().nth(1), Some("2"));

    // Both documents contributed one ORG and one DATE each.
    assert!(stdout.contains("ENTITY LABEL"));
    assert!(stdout.lines().any(|l| l.contains("ORG") && l.contains('2')));
    assert!(stdout.lines().any(|l| l.contains("DATE") && l.contains('2')));
}
