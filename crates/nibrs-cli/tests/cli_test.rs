use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ADMIN: &str =
    "00871I062016    WA123456754236732    20160512 10N                                      ";
const OFFENSE: &str =
    "00712I062016    WA123456754236732    13ACN  20   N  40       88        ";
const VICTIM: &str = "01294I062016    WA123456754236732    00113A                           I25  FWNR01   N    01AQ                                    ";
const OFFENDER: &str = "00465I062016    WA123456754236732    0130  MWN";
const GROUP_B: &str = "00667I062016    WA123456716-000777   0120160520O90D01    22  MWNR ";
const ZERO: &str = "00430I062016    WA1234567000000000000052016";
const NUMBERED_ZERO: &str = "00430I062016    WA123456754236732    052016";

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_nibrs") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("nibrs{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_nibrs is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn run(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run nibrs")
}

fn write_submission(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("submission.txt");
    let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
    fs::write(&path, content).unwrap();
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_validate_clean_submission() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_submission(dir.path(), &[ADMIN, OFFENSE, VICTIM, OFFENDER, GROUP_B, ZERO]);

    let output = run(&["validate", path_arg(&input)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "expected only the summary line: {stdout}");
}

#[test]
fn test_validate_writes_error_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_submission(dir.path(), &[NUMBERED_ZERO]);
    let report = dir.path().join("errors.txt");

    let output = run(&["validate", path_arg(&input), "-o", path_arg(&report)]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let content = fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(&lines[0][46..49], "015");
    assert!(lines[0].contains("54236732"));
}

#[test]
fn test_config_suppresses_codes() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_submission(dir.path(), &[NUMBERED_ZERO]);
    let config = dir.path().join("nibrs.yaml");
    fs::write(&config, "validation:\n  suppressed_codes: [\"015\"]\n").unwrap();

    let output = run(&["--config", path_arg(&config), "validate", path_arg(&input)]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 1);
}

#[test]
fn test_decode_emits_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_submission(dir.path(), &[ADMIN, OFFENSE, VICTIM, OFFENDER, ZERO]);

    let output = run(&["decode", path_arg(&input)]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "report");
    assert_eq!(events[0]["kind"], "group_a");
    assert_eq!(events[1]["kind"], "zero");
}

#[test]
fn test_reformat_reproduces_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_submission(dir.path(), &[ADMIN, OFFENSE, VICTIM, OFFENDER, GROUP_B, ZERO]);
    let reformatted = dir.path().join("reformatted.txt");

    let output = run(&["reformat", path_arg(&input), path_arg(&reformatted)]);
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(&reformatted).unwrap(),
        fs::read_to_string(&input).unwrap()
    );
}

#[test]
fn test_catalog_lookup() {
    let output = run(&["catalog", "--code", "015"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("015 E "));

    let output = run(&["catalog", "--code", "XYZ"]);
    assert!(!output.status.success());
}

#[test]
fn test_catalog_code_list() {
    let output = run(&["catalog", "--list", "sex"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.lines().any(|l| l == "F"));
}

#[test]
fn test_missing_input_fails() {
    let output = run(&["validate", "/nonexistent/submission.txt"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open"));
}
