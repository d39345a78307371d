use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

const EXPECTED_ROOT_HELP: &str = "Farthing - double-entry ledger with idempotent statement import

Usage:
  farthing <command>

Start here:
  farthing account list
  farthing import create --help
  farthing reconcile
";

static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

fn unique_test_home() -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let stamp = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(value) => value.as_nanos(),
        Err(_) => 0,
    };
    let sequence = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!(
        "farthing-cli-test-{}-{stamp}-{sequence}",
        std::process::id()
    ));
    path
}

fn run_cli_in_home(home: &std::path::Path, args: &[&str]) -> (bool, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_farthing"));
    for arg in args {
        command.arg(arg);
    }
    command.env("FARTHING_HOME", home);
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let output = command.output();
    assert!(output.is_ok());
    if let Ok(result) = output {
        let stdout = String::from_utf8(result.stdout);
        assert!(stdout.is_ok());
        if let Ok(stdout_text) = stdout {
            return (result.status.success(), stdout_text);
        }
    }

    (false, String::new())
}

fn run_cli(args: &[&str]) -> (bool, String, std::path::PathBuf) {
    let home = unique_test_home();
    let (ok, body) = run_cli_in_home(&home, args);
    (ok, body, home)
}

fn write_statement_file(
    home: &std::path::Path,
    name: &str,
    body: &str,
) -> std::path::PathBuf {
    let create_home = fs::create_dir_all(home);
    assert!(create_home.is_ok());

    let statement_path = home.join(name);
    let write = fs::write(&statement_path, body);
    assert!(write.is_ok());
    statement_path
}

fn parse_json(body: &str) -> Value {
    let parsed = serde_json::from_str::<Value>(body);
    assert!(parsed.is_ok());
    if let Ok(value) = parsed {
        return value;
    }
    Value::Null
}

fn assert_pipe_close_does_not_panic(args: &[&str], expect_success: bool) {
    let home = unique_test_home();
    let mut producer = Command::new(env!("CARGO_BIN_EXE_farthing"));
    producer.args(args);
    producer.env("FARTHING_HOME", &home);
    producer.stdout(Stdio::piped());
    producer.stderr(Stdio::piped());

    let producer_spawn = producer.spawn();
    assert!(producer_spawn.is_ok());
    if let Ok(mut producer_child) = producer_spawn {
        let producer_stdout = producer_child.stdout.take();
        let producer_stderr = producer_child.stderr.take();
        assert!(producer_stdout.is_some());
        assert!(producer_stderr.is_some());

        if let Some(stdout_pipe) = producer_stdout {
            let mut reader = BufReader::new(stdout_pipe);
            let mut first_line = String::new();
            let read_result = reader.read_line(&mut first_line);
            assert!(read_result.is_ok());
            assert!(!first_line.is_empty());
            drop(reader);
        }

        let status = producer_child.wait();
        assert!(status.is_ok());
        if let Ok(exit_status) = status {
            assert_eq!(exit_status.success(), expect_success);
        }

        if let Some(mut stderr_pipe) = producer_stderr {
            let mut stderr_bytes = Vec::new();
            let stderr_read = stderr_pipe.read_to_end(&mut stderr_bytes);
            assert!(stderr_read.is_ok());
            let stderr = String::from_utf8(stderr_bytes);
            assert!(stderr.is_ok());
            if let Ok(stderr_text) = stderr {
                assert!(!stderr_text.contains("Broken pipe"));
                assert!(!stderr_text.contains("failed printing to stdout"));
            }
        }
    }
}

fn assert_text_error_contract(body: &str, code: &str) {
    assert!(body.contains("The command did not complete; the ledger was left unchanged."));
    assert!(body.contains(&format!("  Error:    {code}")));
    assert!(body.contains("  Details:"));
    assert!(body.contains("What to do next:"));
}

fn assert_json_error_contract(body: &str, code: &str) -> Value {
    let payload = parse_json(body);
    assert_eq!(payload["error"]["code"], Value::String(code.to_string()));
    assert!(payload["error"]["message"].is_string());
    assert!(payload["error"]["recovery_steps"].is_array());
    payload
}

const COFFEE_STATEMENT: &str = r#"{
    "external_account_id": "12345678",
    "balance": 450.00,
    "balance_date": "2026-01-31",
    "transactions": [
        {
            "id": "ext-coffee-1",
            "date": "2026-01-15",
            "payee": "Coffee Shop",
            "amount": -50.00
        }
    ]
}"#;

#[test]
fn root_command_uses_short_plaintext_help() {
    let (ok, body, _) = run_cli(&[]);
    assert!(ok);
    assert_eq!(body, EXPECTED_ROOT_HELP);
}

#[test]
fn help_and_version_return_success_output() {
    let (help_ok, help_body, _) = run_cli(&["--help"]);
    assert!(help_ok);
    assert!(help_body.starts_with("Farthing — double-entry ledger"));
    assert!(help_body.contains("Set up your ledger:"));
    assert!(help_body.contains("farthing import create <path>..."));
    assert!(help_body.contains("farthing reconcile"));

    let (version_ok, version_body, _) = run_cli(&["--version"]);
    assert!(version_ok);
    assert_eq!(version_body.trim(), "farthing 0.1.0");
}

#[test]
fn help_output_pipe_close_does_not_panic() {
    assert_pipe_close_does_not_panic(&["import", "create", "--help"], true);
}

#[test]
fn success_output_pipe_close_does_not_panic() {
    assert_pipe_close_does_not_panic(&["currency", "list"], true);
}

#[test]
fn error_output_pipe_close_does_not_panic() {
    assert_pipe_close_does_not_panic(&["import", "create", "--nope"], false);
}

#[test]
fn import_create_help_shows_workflow_and_schema() {
    let (ok, body, _) = run_cli(&["import", "create", "--help"]);
    assert!(ok);
    assert!(body.contains("How import works:"));
    assert!(body.contains("What to do next:"));
    assert!(body.contains("farthing account map"));
    assert!(body.contains("Statement schema"));
    assert!(body.contains("external_account_id"));
    assert!(body.contains("balance_date"));
    assert!(body.contains("YYYY-MM-DD"));
    assert!(body.contains("Negative = money out"));
}

#[test]
fn bare_group_commands_show_subcommand_help() {
    let (ok, body, _) = run_cli(&["import"]);
    assert!(ok);
    assert!(body.contains("create"));
    assert!(body.contains("list"));

    let (account_ok, account_body, _) = run_cli(&["account"]);
    assert!(account_ok);
    assert!(account_body.contains("create"));
    assert!(account_body.contains("map"));
    assert!(account_body.contains("mappings"));
}

#[test]
fn full_import_flow_text_and_json_contracts() {
    let home = unique_test_home();

    let (create_ok, create_body) = run_cli_in_home(&home, &["account", "create", "Checking"]);
    assert!(create_ok);
    assert!(create_body.contains("Created account `Checking`."));

    let (dining_ok, _) = run_cli_in_home(&home, &["account", "create", "Dining"]);
    assert!(dining_ok);

    let (map_ok, map_body) =
        run_cli_in_home(&home, &["account", "map", "12345678", "Checking"]);
    assert!(map_ok);
    assert!(map_body.contains("Mapped external account `12345678` to `Checking`."));

    let (rule_ok, rule_body) =
        run_cli_in_home(&home, &["rule", "payee", "create", "Coffee", "Dining"]);
    assert!(rule_ok);
    assert!(rule_body.contains("Payees containing `Coffee` will now post to `Dining`."));

    let statement_path = write_statement_file(&home, "statement.json", COFFEE_STATEMENT);
    let statement_arg = statement_path.display().to_string();

    let (import_ok, import_body) =
        run_cli_in_home(&home, &["import", "create", &statement_arg]);
    assert!(import_ok);
    assert!(import_body.starts_with("Import run run_"));
    assert!(import_body.contains("Statements imported"));
    assert!(import_body.contains("imported"));

    let (json_ok, json_body) =
        run_cli_in_home(&home, &["import", "create", &statement_arg, "--json"]);
    assert!(json_ok);
    let payload = parse_json(&json_body);
    assert_eq!(payload["ok"], Value::Bool(true));
    assert_eq!(payload["version"], Value::String("v1".to_string()));
    assert_eq!(
        payload["data"]["statements"][0]["status"],
        Value::String("already_imported".to_string())
    );

    let (list_ok, list_body) = run_cli_in_home(&home, &["account", "list"]);
    assert!(list_ok);
    assert!(list_body.contains("Checking"));
    assert!(list_body.contains("-50.00"));
    assert!(list_body.contains("50.00"));

    let (list_json_ok, list_json_body) =
        run_cli_in_home(&home, &["account", "list", "--json"]);
    assert!(list_json_ok);
    let list_payload = parse_json(&list_json_body);
    assert!(list_payload.is_array());
    assert!(list_payload.get("ok").is_none());

    let (reconcile_ok, reconcile_body) = run_cli_in_home(&home, &["reconcile"]);
    assert!(reconcile_ok);
    assert!(reconcile_body.contains("Reconciled 1 balance assertion(s)"));
    assert!(reconcile_body.contains("matches its postings"));

    let (txns_ok, txns_body) = run_cli_in_home(&home, &["transactions"]);
    assert!(txns_ok);
    assert!(txns_body.contains("2026-01-15"));
    assert!(txns_body.contains("Coffee Shop"));
}

#[test]
fn import_list_json_returns_raw_array() {
    let home = unique_test_home();
    let (create_ok, _) = run_cli_in_home(&home, &["account", "create", "Checking"]);
    assert!(create_ok);
    let (map_ok, _) = run_cli_in_home(&home, &["account", "map", "12345678", "Checking"]);
    assert!(map_ok);

    let statement_path = write_statement_file(&home, "statement.json", COFFEE_STATEMENT);
    let statement_arg = statement_path.display().to_string();
    let (import_ok, _) = run_cli_in_home(&home, &["import", "create", &statement_arg]);
    assert!(import_ok);

    let (list_ok, list_body) = run_cli_in_home(&home, &["import", "list", "--json"]);
    assert!(list_ok);
    let payload = parse_json(&list_body);
    assert!(payload.is_array());
    if let Some(rows) = payload.as_array() {
        assert_eq!(rows.len(), 1);
        assert!(
            rows[0]["run_id"]
                .as_str()
                .map(|id| id.starts_with("run_"))
                .unwrap_or(false)
        );
        assert_eq!(rows[0]["statements_imported"], Value::from(1));
    }
}

#[test]
fn runtime_errors_use_text_and_json_contracts() {
    let home = unique_test_home();

    let (text_ok, text_body) =
        run_cli_in_home(&home, &["account", "map", "12345678", "Checking"]);
    assert!(!text_ok);
    assert_text_error_contract(&text_body, "account_not_found");
    assert!(text_body.contains("Run `farthing account create Checking` first."));

    let (json_ok, json_body) = run_cli_in_home(
        &home,
        &["account", "map", "12345678", "Checking", "--json"],
    );
    assert!(!json_ok);
    assert_json_error_contract(&json_body, "account_not_found");
}

#[test]
fn parse_errors_carry_command_hint_in_recovery_steps() {
    let (ok, body, _) = run_cli(&["account", "map", "12345678"]);
    assert!(!ok);
    assert_text_error_contract(&body, "invalid_argument");
    assert!(body.contains("Run `farthing account map --help` for usage."));

    let (json_ok, json_body, _) = run_cli(&["account", "map", "12345678", "--json"]);
    assert!(!json_ok);
    let payload = assert_json_error_contract(&json_body, "invalid_argument");
    let steps = payload["error"]["recovery_steps"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert!(steps.iter().any(|step| {
        step.as_str()
            .unwrap_or_default()
            .contains("farthing account map --help")
    }));
}

#[test]
fn invalid_divisor_is_rejected_at_parse_time() {
    let (ok, body, _) = run_cli(&["currency", "create", "JPY", "0"]);
    assert!(!ok);
    assert_text_error_contract(&body, "invalid_argument");
    assert!(body.contains("divisor must be a positive integer"));
}

#[test]
fn help_command_is_rejected_with_plaintext_invalid_argument() {
    let (ok, body, _) = run_cli(&["help"]);
    assert!(!ok);
    assert_text_error_contract(&body, "invalid_argument");
}
