use std::fs;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use farthing_client::FailureEnvelope;
use farthing_client::commands::{account, import, rule};
use farthing_client::commands::account::AccountOptions;
use farthing_client::commands::import::ImportRunOptions;
use farthing_client::commands::rule::RuleOptions;
use rusqlite::Connection;
use serde_json::Value;
use tempfile::tempdir;

fn write_file(path: &Path, body: &str) {
    let result = fs::write(path, body);
    assert!(result.is_ok());
}

fn temp_home() -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let home = dir.path().join("ledger-home");
    Ok((dir, home))
}

fn ledger_db(home: &Path) -> PathBuf {
    home.join("ledger.db")
}

fn create_account(home: &Path, name: &str) {
    let created = account::create_with_options(
        name,
        AccountOptions {
            home_override: Some(home),
        },
    );
    assert!(created.is_ok());
}

fn map_account(home: &Path, external_id: &str, name: &str) {
    let mapped = account::map_with_options(
        external_id,
        name,
        AccountOptions {
            home_override: Some(home),
        },
    );
    assert!(mapped.is_ok());
}

fn create_payee_rule(home: &Path, substring: &str, account_name: &str) {
    let created = rule::payee_create_with_options(
        substring,
        account_name,
        RuleOptions {
            home_override: Some(home),
        },
    );
    assert!(created.is_ok());
}

fn create_transfer_rule(home: &Path, prefix: &str) {
    let created = rule::transfer_create_with_options(
        prefix,
        RuleOptions {
            home_override: Some(home),
        },
    );
    assert!(created.is_ok());
}

fn run_import(
    home: &Path,
    paths: Vec<String>,
) -> farthing_client::ClientResult<farthing_client::SuccessEnvelope> {
    import::run_with_options(ImportRunOptions {
        paths,
        home_override: Some(home),
    })
}

fn query_count(db_path: &Path, sql: &str) -> i64 {
    let connection = Connection::open(db_path);
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        let value = conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        assert!(value.is_ok());
        if let Ok(count) = value {
            return count;
        }
    }
    0
}

fn statement_outcomes(payload: &Value) -> Vec<Value> {
    payload
        .get("statements")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
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
fn coffee_statement_creates_balanced_transaction_and_assertion() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        create_account(&home, "Dining");
        map_account(&home, "12345678", "Checking");
        create_payee_rule(&home, "Coffee", "Dining");

        let statement_path = home.join("statement-a.json");
        write_file(&statement_path, COFFEE_STATEMENT);

        let imported = run_import(&home, vec![statement_path.display().to_string()]);
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            let outcomes = statement_outcomes(&envelope.data);
            assert_eq!(outcomes.len(), 1);
            assert_eq!(outcomes[0]["status"], Value::from("imported"));
            assert_eq!(outcomes[0]["transactions_created"], Value::from(1));
            assert_eq!(outcomes[0]["postings_written"], Value::from(2));
            assert_eq!(envelope.data["unbalanced_transactions"], Value::from(0));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 1);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM posting"), 2);
        assert_eq!(
            query_count(
                &db,
                "SELECT amount FROM posting
                 JOIN account ON account.id = posting.account_id
                 WHERE account.name = 'Checking'"
            ),
            -5000
        );
        assert_eq!(
            query_count(
                &db,
                "SELECT amount FROM posting
                 JOIN account ON account.id = posting.account_id
                 WHERE account.name = 'Dining'"
            ),
            5000
        );
        assert_eq!(
            query_count(
                &db,
                "SELECT COUNT(*) FROM balance_assertion
                 WHERE date = '2026-01-31' AND balance = 45000"
            ),
            1
        );
        assert_eq!(
            query_count(
                &db,
                "SELECT COUNT(*) FROM posting_note
                 WHERE description = 'payee contained ''Coffee'''"
            ),
            1
        );
    }
}

#[test]
fn reimporting_the_same_statement_is_a_no_op() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        create_account(&home, "Dining");
        map_account(&home, "12345678", "Checking");
        create_payee_rule(&home, "Coffee", "Dining");

        let statement_path = home.join("statement-a.json");
        write_file(&statement_path, COFFEE_STATEMENT);

        let first = run_import(&home, vec![statement_path.display().to_string()]);
        assert!(first.is_ok());
        let second = run_import(&home, vec![statement_path.display().to_string()]);
        assert!(second.is_ok());
        if let Ok(envelope) = second {
            let outcomes = statement_outcomes(&envelope.data);
            assert_eq!(outcomes[0]["status"], Value::from("already_imported"));
            assert_eq!(outcomes[0]["transactions_created"], Value::from(0));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 1);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM posting"), 2);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn_note"), 1);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM balance_assertion"), 1);
    }
}

#[test]
fn already_mapped_transaction_is_skipped_within_a_new_statement() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let first_path = home.join("january.json");
        write_file(&first_path, COFFEE_STATEMENT);
        assert!(run_import(&home, vec![first_path.display().to_string()]).is_ok());

        // February statement re-reports the January transaction alongside a
        // new one; only the new one may land.
        let february = r#"{
            "external_account_id": "12345678",
            "balance": 430.00,
            "balance_date": "2026-02-28",
            "transactions": [
                {
                    "id": "ext-coffee-1",
                    "date": "2026-01-15",
                    "payee": "Coffee Shop",
                    "amount": -50.00
                },
                {
                    "id": "ext-grocer-1",
                    "date": "2026-02-10",
                    "payee": "Corner Grocer",
                    "amount": -20.00
                }
            ]
        }"#;
        let second_path = home.join("february.json");
        write_file(&second_path, february);

        let imported = run_import(&home, vec![second_path.display().to_string()]);
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            let outcomes = statement_outcomes(&envelope.data);
            assert_eq!(outcomes[0]["transactions_created"], Value::from(1));
            assert_eq!(outcomes[0]["transactions_skipped"], Value::from(1));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 2);
        // Mapping uniqueness: one internal txn per external key.
        assert_eq!(
            query_count(
                &db,
                "SELECT COUNT(*) FROM (
                     SELECT external_account, external_txn
                     FROM external_txn_mapping
                     GROUP BY external_account, external_txn
                     HAVING COUNT(DISTINCT txn_id) > 1
                 )"
            ),
            0
        );
    }
}

#[test]
fn unmapped_external_account_skips_statement_and_continues() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let unmapped = r#"{
            "external_account_id": "99999999",
            "balance": 10.00,
            "balance_date": "2026-01-31",
            "transactions": [
                {"id": "m-1", "date": "2026-01-10", "payee": "Mystery", "amount": -1.00}
            ]
        }"#;
        let unmapped_path = home.join("a-unmapped.json");
        write_file(&unmapped_path, unmapped);
        let mapped_path = home.join("b-mapped.json");
        write_file(&mapped_path, COFFEE_STATEMENT);

        let imported = run_import(
            &home,
            vec![
                unmapped_path.display().to_string(),
                mapped_path.display().to_string(),
            ],
        );
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            let outcomes = statement_outcomes(&envelope.data);
            assert_eq!(outcomes.len(), 2);
            assert_eq!(outcomes[0]["status"], Value::from("skipped_unmapped_account"));
            assert!(outcomes[0]["warning"].is_string());
            assert_eq!(outcomes[1]["status"], Value::from("imported"));
            assert_eq!(envelope.data["totals"]["statements_skipped"], Value::from(1));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 1);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM balance_assertion"), 1);
    }
}

#[test]
fn ambiguous_payee_rules_abort_the_run_without_partial_writes() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        create_account(&home, "Dining");
        create_account(&home, "Shopping");
        map_account(&home, "12345678", "Checking");
        create_payee_rule(&home, "Coffee", "Dining");
        create_payee_rule(&home, "Shop", "Shopping");

        let statement_path = home.join("statement-a.json");
        write_file(&statement_path, COFFEE_STATEMENT);

        let imported = run_import(&home, vec![statement_path.display().to_string()]);
        assert!(imported.is_err());
        if let Err(error) = imported {
            assert_eq!(error.code, "ambiguous_payee_rule");
            let envelope = FailureEnvelope::for_error(&error);
            assert!(!envelope.ok);
            assert_eq!(envelope.error.code, "ambiguous_payee_rule");
            assert!(envelope.data.is_some());
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 0);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM posting"), 0);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn_note"), 0);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM external_txn_mapping"), 0);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM balance_assertion"), 0);
    }
}

#[test]
fn unknown_currency_aborts_the_run() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let statement = r#"{
            "external_account_id": "12345678",
            "currency": "EUR",
            "balance": 10.00,
            "balance_date": "2026-01-31",
            "transactions": []
        }"#;
        let statement_path = home.join("statement-eur.json");
        write_file(&statement_path, statement);

        let imported = run_import(&home, vec![statement_path.display().to_string()]);
        assert!(imported.is_err());
        if let Err(error) = imported {
            assert_eq!(error.code, "unknown_currency");
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM balance_assertion"), 0);
    }
}

#[test]
fn amounts_are_stored_as_scaled_integers() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let statement = r#"{
            "external_account_id": "12345678",
            "balance": 12.34,
            "balance_date": "2026-01-31",
            "transactions": [
                {"id": "p-1", "date": "2026-01-15", "payee": "Bookstore", "amount": 12.34}
            ]
        }"#;
        let statement_path = home.join("statement-b.json");
        write_file(&statement_path, statement);

        assert!(run_import(&home, vec![statement_path.display().to_string()]).is_ok());

        let db = ledger_db(&home);
        assert_eq!(
            query_count(&db, "SELECT COUNT(*) FROM posting WHERE amount = 1234"),
            1
        );
        assert_eq!(
            query_count(
                &db,
                "SELECT COUNT(*) FROM balance_assertion WHERE balance = 1234"
            ),
            1
        );
    }
}

#[test]
fn transfer_legs_merge_into_one_transaction() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        create_account(&home, "Savings");
        map_account(&home, "12345678", "Checking");
        map_account(&home, "87654321", "Savings");
        create_transfer_rule(&home, "Autosave");

        let checking = r#"{
            "external_account_id": "12345678",
            "balance": 475.00,
            "balance_date": "2026-01-31",
            "transactions": [
                {
                    "id": "chk-1",
                    "date": "2026-01-20",
                    "payee": "Autosave withdrawal",
                    "memo": "roundup batch 42",
                    "amount": -25.00
                }
            ]
        }"#;
        let savings = r#"{
            "external_account_id": "87654321",
            "balance": 25.00,
            "balance_date": "2026-01-31",
            "transactions": [
                {
                    "id": "sav-1",
                    "date": "2026-01-20",
                    "payee": "Autosave deposit",
                    "memo": "roundup batch 42",
                    "amount": 25.00
                }
            ]
        }"#;
        let checking_path = home.join("a-checking.json");
        let savings_path = home.join("b-savings.json");
        write_file(&checking_path, checking);
        write_file(&savings_path, savings);

        let imported = run_import(
            &home,
            vec![
                checking_path.display().to_string(),
                savings_path.display().to_string(),
            ],
        );
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            assert_eq!(envelope.data["totals"]["transactions_created"], Value::from(1));
            assert_eq!(envelope.data["totals"]["transactions_reused"], Value::from(1));
            assert_eq!(envelope.data["unbalanced_transactions"], Value::from(0));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 1);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM posting"), 2);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM external_txn_mapping"), 2);
        assert_eq!(
            query_count(&db, "SELECT SUM(amount) FROM posting"),
            0
        );
    }
}

#[test]
fn malformed_statement_is_rejected_but_others_proceed() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let broken_path = home.join("a-broken.json");
        write_file(&broken_path, "{ not json");
        let good_path = home.join("b-good.json");
        write_file(&good_path, COFFEE_STATEMENT);

        let imported = run_import(
            &home,
            vec![
                broken_path.display().to_string(),
                good_path.display().to_string(),
            ],
        );
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            let outcomes = statement_outcomes(&envelope.data);
            assert_eq!(outcomes[0]["status"], Value::from("rejected"));
            assert_eq!(outcomes[1]["status"], Value::from("imported"));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM txn"), 1);
    }
}

#[test]
fn unmatched_payee_leaves_single_leg_and_is_counted() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let statement_path = home.join("statement-a.json");
        write_file(&statement_path, COFFEE_STATEMENT);

        let imported = run_import(&home, vec![statement_path.display().to_string()]);
        assert!(imported.is_ok());
        if let Ok(envelope) = imported {
            assert_eq!(envelope.data["unbalanced_transactions"], Value::from(1));
        }

        let db = ledger_db(&home);
        assert_eq!(query_count(&db, "SELECT COUNT(*) FROM posting"), 1);
    }
}

#[test]
fn import_runs_are_recorded_and_listed() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let statement_path = home.join("statement-a.json");
        write_file(&statement_path, COFFEE_STATEMENT);
        assert!(run_import(&home, vec![statement_path.display().to_string()]).is_ok());

        let listed = import::list_with_options(farthing_client::commands::import::ImportListOptions {
            home_override: Some(&home),
        });
        assert!(listed.is_ok());
        if let Ok(envelope) = listed {
            let rows = envelope.data["rows"].as_array().cloned().unwrap_or_default();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["statements_imported"], Value::from(1));
            assert!(rows[0]["run_id"]
                .as_str()
                .map(|id| id.starts_with("run_"))
                .unwrap_or(false));
        }
    }
}

#[test]
fn import_runs_list_newest_first_with_sortable_timestamps() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        create_account(&home, "Checking");
        map_account(&home, "12345678", "Checking");

        let first_path = home.join("statement-jan.json");
        write_file(&first_path, COFFEE_STATEMENT);
        assert!(run_import(&home, vec![first_path.display().to_string()]).is_ok());

        let february = r#"{
            "external_account_id": "12345678",
            "balance": 400.00,
            "balance_date": "2026-02-28",
            "transactions": [
                {
                    "id": "ext-coffee-2",
                    "date": "2026-02-10",
                    "payee": "Coffee Shop",
                    "amount": -50.00
                }
            ]
        }"#;
        let second_path = home.join("statement-feb.json");
        write_file(&second_path, february);
        let second = run_import(&home, vec![second_path.display().to_string()]);
        assert!(second.is_ok());
        let second_run_id = second
            .ok()
            .and_then(|envelope| envelope.data["run_id"].as_str().map(str::to_string));
        assert!(second_run_id.is_some());

        let listed = import::list_with_options(farthing_client::commands::import::ImportListOptions {
            home_override: Some(&home),
        });
        assert!(listed.is_ok());
        if let Ok(envelope) = listed {
            let rows = envelope.data["rows"].as_array().cloned().unwrap_or_default();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0]["run_id"].as_str().map(str::to_string), second_run_id);
            for row in &rows {
                let created_at = row["created_at"].as_str().unwrap_or("");
                assert!(
                    DateTime::parse_from_rfc3339(created_at).is_ok(),
                    "created_at is not RFC 3339: {created_at}"
                );
            }
        }
    }
}

#[test]
fn missing_statement_path_is_an_error() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_temp, home)) = temp {
        let imported = run_import(&home, vec![home.join("absent.json").display().to_string()]);
        assert!(imported.is_err());
        if let Err(error) = imported {
            assert_eq!(error.code, "no_statements_found");
        }
    }
}
