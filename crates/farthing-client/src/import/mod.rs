pub(crate) mod assertions;
pub(crate) mod importer;
pub(crate) mod postings;
pub(crate) mod resolve;
pub(crate) mod rules;
pub(crate) mod statement;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, TransactionBehavior, params};
use ulid::Ulid;

use crate::contracts::types::{ImportRunData, ImportTotals, StatementOutcome};
use crate::import::importer::ImportOutcome;
use crate::import::resolve::{resolve_currency, resolve_external_account};
use crate::import::rules::{PayeeRuleSet, TransferMatcher};
use crate::import::statement::{Statement, parse_statement, scale_amount};
use crate::setup::SetupContext;
use crate::state::{map_io_error, map_sqlite_error, open_connection};
use crate::{ClientError, ClientResult};

/// Runs one import batch: each statement file is processed inside its own
/// immediate-behavior SQLite transaction, committed only once the statement's
/// transactions and closing assertion are all written. Run-fatal errors
/// (unknown currency, ambiguous payee rule, storage failure) drop the open
/// transaction, rolling the statement back, and abort the remaining files.
pub(crate) fn execute(setup: &SetupContext, paths: &[String]) -> ClientResult<ImportRunData> {
    let statement_paths = collect_statement_paths(paths)?;

    let db_path = PathBuf::from(&setup.db_path);
    let mut connection = open_connection(&db_path)?;

    let mut outcomes: Vec<StatementOutcome> = Vec::new();
    let mut totals = ImportTotals::default();

    for path in &statement_paths {
        let display_path = path.display().to_string();
        totals.statements_read += 1;

        let outcome = match load_statement(path, &display_path) {
            Ok(parsed) => ingest_in_transaction(&mut connection, &db_path, &display_path, &parsed)?,
            // Malformed statements are refused, never repaired; the rest of
            // the batch still runs.
            Err(error) => rejected_outcome(&display_path, &error),
        };

        tally(&mut totals, &outcome);
        outcomes.push(outcome);
    }

    let run_id = format!("run_{}", Ulid::new());
    record_run(&connection, &db_path, &run_id, &totals)?;
    let unbalanced_transactions = count_unbalanced(&connection, &db_path)?;

    Ok(ImportRunData {
        run_id,
        statements: outcomes,
        totals,
        unbalanced_transactions,
    })
}

fn load_statement(path: &Path, display_path: &str) -> ClientResult<Statement> {
    let content = fs::read_to_string(path)
        .map_err(|error| ClientError::statement_rejected(display_path, &error.to_string()))?;
    parse_statement(display_path, &content)
}

fn ingest_in_transaction(
    connection: &mut Connection,
    db_path: &Path,
    display_path: &str,
    statement: &Statement,
) -> ClientResult<StatementOutcome> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let outcome = ingest_statement(&transaction, db_path, display_path, statement)?;

    if outcome.status == StatementOutcome::STATUS_IMPORTED {
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    } else {
        // Nothing was written on the skip paths; roll back to be explicit.
        transaction
            .rollback()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(outcome)
}

/// One statement end-to-end: resolve account and currency, check the
/// assertion gate, import each transaction, record the closing assertion.
fn ingest_statement(
    connection: &Connection,
    db_path: &Path,
    display_path: &str,
    statement: &Statement,
) -> ClientResult<StatementOutcome> {
    let Some(account_id) =
        resolve_external_account(connection, &statement.external_account_id, db_path)?
    else {
        return Ok(StatementOutcome {
            path: display_path.to_string(),
            status: StatementOutcome::STATUS_UNMAPPED_ACCOUNT.to_string(),
            account: None,
            transactions_created: 0,
            transactions_reused: 0,
            transactions_skipped: 0,
            postings_written: 0,
            warning: Some(format!(
                "external account `{}` has no mapping; run `farthing account map {} <account>`",
                statement.external_account_id, statement.external_account_id
            )),
        });
    };

    let account_name = account_name(connection, db_path, account_id)?;
    let currency = resolve_currency(connection, &statement.currency, db_path)?;
    let balance = scale_amount(statement.balance, currency.divisor);

    if assertions::assertion_exists(
        connection,
        db_path,
        &statement.balance_date,
        account_id,
        balance,
    )? {
        return Ok(StatementOutcome {
            path: display_path.to_string(),
            status: StatementOutcome::STATUS_ALREADY_IMPORTED.to_string(),
            account: Some(account_name),
            transactions_created: 0,
            transactions_reused: 0,
            transactions_skipped: 0,
            postings_written: 0,
            warning: None,
        });
    }

    let rules = PayeeRuleSet::load(connection, db_path)?;
    let transfers = TransferMatcher::load(connection, db_path)?;

    let mut created = 0_i64;
    let mut reused = 0_i64;
    let mut skipped = 0_i64;
    let mut postings_written = 0_i64;

    for transaction in &statement.transactions {
        match importer::import_transaction(
            connection,
            db_path,
            account_id,
            currency,
            &rules,
            &transfers,
            transaction,
        )? {
            ImportOutcome::Skipped => skipped += 1,
            ImportOutcome::Reused {
                postings_written: written,
            } => {
                reused += 1;
                postings_written += written;
            }
            ImportOutcome::Created {
                postings_written: written,
            } => {
                created += 1;
                postings_written += written;
            }
        }
    }

    assertions::record_assertion(
        connection,
        db_path,
        &statement.balance_date,
        account_id,
        balance,
        currency.currency_id,
    )?;

    Ok(StatementOutcome {
        path: display_path.to_string(),
        status: StatementOutcome::STATUS_IMPORTED.to_string(),
        account: Some(account_name),
        transactions_created: created,
        transactions_reused: reused,
        transactions_skipped: skipped,
        postings_written,
        warning: None,
    })
}

fn rejected_outcome(display_path: &str, error: &ClientError) -> StatementOutcome {
    StatementOutcome {
        path: display_path.to_string(),
        status: "rejected".to_string(),
        account: None,
        transactions_created: 0,
        transactions_reused: 0,
        transactions_skipped: 0,
        postings_written: 0,
        warning: Some(error.message.clone()),
    }
}

fn tally(totals: &mut ImportTotals, outcome: &StatementOutcome) {
    if outcome.status == StatementOutcome::STATUS_IMPORTED {
        totals.statements_imported += 1;
    } else {
        totals.statements_skipped += 1;
    }
    totals.transactions_created += outcome.transactions_created;
    totals.transactions_reused += outcome.transactions_reused;
    totals.transactions_skipped += outcome.transactions_skipped;
    totals.postings_written += outcome.postings_written;
}

fn collect_statement_paths(paths: &[String]) -> ClientResult<Vec<PathBuf>> {
    let mut collected = Vec::new();

    for raw_path in paths {
        let path = PathBuf::from(raw_path);
        if path.is_dir() {
            let entries =
                fs::read_dir(&path).map_err(|error| map_io_error(&path, &error))?;
            let mut files = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|error| map_io_error(&path, &error))?;
                if entry.path().is_file() {
                    files.push(entry.path());
                }
            }
            files.sort();
            collected.extend(files);
        } else if path.is_file() {
            collected.push(path);
        } else {
            return Err(ClientError::no_statements_found(raw_path));
        }
    }

    if collected.is_empty() {
        let shown = paths.first().map(String::as_str).unwrap_or(".");
        return Err(ClientError::no_statements_found(shown));
    }

    Ok(collected)
}

fn account_name(connection: &Connection, db_path: &Path, account_id: i64) -> ClientResult<String> {
    connection
        .query_row(
            "SELECT name FROM account WHERE id = ?1",
            [account_id],
            |row| row.get::<_, String>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}

fn record_run(
    connection: &Connection,
    db_path: &Path,
    run_id: &str,
    totals: &ImportTotals,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO import_run (
                run_id,
                created_at,
                statements_read,
                statements_imported,
                statements_skipped,
                transactions_created,
                transactions_reused,
                transactions_skipped
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                now_timestamp(),
                totals.statements_read,
                totals.statements_imported,
                totals.statements_skipped,
                totals.transactions_created,
                totals.transactions_reused,
                totals.transactions_skipped
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

/// Transactions whose postings do not sum to zero per currency. Single-leg
/// entries are tolerated but surfaced, never silent.
pub(crate) fn count_unbalanced(connection: &Connection, db_path: &Path) -> ClientResult<i64> {
    connection
        .query_row(
            "SELECT COUNT(*)
             FROM (
                 SELECT SUM(amount) AS balance
                 FROM posting
                 GROUP BY txn_id, currency_id
             )
             WHERE balance != 0",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}

// RFC 3339 in UTC, so `import list` can order runs by plain text comparison.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
