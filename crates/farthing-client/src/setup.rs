use std::path::Path;

use rusqlite::Connection;

use crate::migrations::{EXPECTED_USER_VERSION, run_pending};
use crate::state::{ledger_db_path, map_sqlite_error, open_connection, prepare_ledger_home};
use crate::{ClientError, ClientResult};

const ACCOUNT_COLUMNS: [&str; 2] = ["id", "name"];
const CURRENCY_COLUMNS: [&str; 3] = ["id", "name", "divisor"];
const TXN_COLUMNS: [&str; 2] = ["id", "date"];
const POSTING_COLUMNS: [&str; 4] = ["txn_id", "account_id", "amount", "currency_id"];
const TXN_NOTE_COLUMNS: [&str; 2] = ["txn_id", "description"];
const POSTING_NOTE_COLUMNS: [&str; 3] = ["txn_id", "account_id", "description"];
const EXTERNAL_ACCOUNT_MAPPING_COLUMNS: [&str; 2] = ["external_id", "account_id"];
const EXTERNAL_TXN_MAPPING_COLUMNS: [&str; 3] = ["external_account", "external_txn", "txn_id"];
const BALANCE_ASSERTION_COLUMNS: [&str; 4] = ["date", "account_id", "balance", "currency_id"];
const PAYEE_RULE_COLUMNS: [&str; 3] = ["id", "payee_contains", "account_id"];
const TRANSFER_MATCH_RULE_COLUMNS: [&str; 2] = ["id", "payee_prefix"];
const IMPORT_RUN_COLUMNS: [&str; 8] = [
    "run_id",
    "created_at",
    "statements_read",
    "statements_imported",
    "statements_skipped",
    "transactions_created",
    "transactions_reused",
    "transactions_skipped",
];

const REQUIRED_CORE_TABLES: [(&str, &[&str]); 12] = [
    ("account", &ACCOUNT_COLUMNS),
    ("currency", &CURRENCY_COLUMNS),
    ("txn", &TXN_COLUMNS),
    ("posting", &POSTING_COLUMNS),
    ("txn_note", &TXN_NOTE_COLUMNS),
    ("posting_note", &POSTING_NOTE_COLUMNS),
    (
        "external_account_mapping",
        &EXTERNAL_ACCOUNT_MAPPING_COLUMNS,
    ),
    ("external_txn_mapping", &EXTERNAL_TXN_MAPPING_COLUMNS),
    ("balance_assertion", &BALANCE_ASSERTION_COLUMNS),
    ("payee_rule", &PAYEE_RULE_COLUMNS),
    ("transfer_match_rule", &TRANSFER_MATCH_RULE_COLUMNS),
    ("import_run", &IMPORT_RUN_COLUMNS),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: String,
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home_override))
}

fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let ledger_home = prepare_ledger_home(home_override)?;

    let db_path = ledger_db_path(&ledger_home);
    let mut connection = open_connection(&db_path)?;

    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    verify_core_tables(&connection, &db_path)?;
    verify_user_version(&connection, &db_path)?;

    Ok(SetupContext {
        db_path: db_path.display().to_string(),
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    match error {
        rusqlite_migration::Error::RusqliteError { query: _, err } => {
            let mapped = map_sqlite_error(db_path, err);
            if mapped.code == "ledger_locked"
                || mapped.code == "ledger_corrupt"
                || mapped.code == "ledger_init_permission_denied"
            {
                mapped
            } else {
                ClientError::migration_failed(db_path, &error.to_string())
            }
        }
        _ => ClientError::migration_failed(db_path, &error.to_string()),
    }
}

fn verify_core_tables(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (table_name, required_columns) in REQUIRED_CORE_TABLES {
        if !table_exists(connection, table_name, db_path)? {
            return Err(ClientError::ledger_corrupt(db_path));
        }

        let columns = table_columns(connection, table_name, db_path)?;
        for required_column in required_columns {
            if !columns.iter().any(|column| column == required_column) {
                return Err(ClientError::ledger_corrupt(db_path));
            }
        }
    }

    Ok(())
}

fn verify_user_version(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    let user_version = connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if user_version != EXPECTED_USER_VERSION {
        return Err(ClientError::ledger_corrupt(db_path));
    }

    Ok(())
}

fn table_exists(connection: &Connection, table_name: &str, db_path: &Path) -> ClientResult<bool> {
    use rusqlite::OptionalExtension;

    let exists = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
            [table_name],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .unwrap_or(false);

    Ok(exists)
}

fn table_columns(
    connection: &Connection,
    table_name: &str,
    db_path: &Path,
) -> ClientResult<Vec<String>> {
    if !is_required_core_table(table_name) {
        return Err(ClientError::ledger_init_failed(
            db_path,
            "Refused PRAGMA table inspection for non-core table.",
        ));
    }

    // SAFETY: `table_name` is restricted to the compile-time allowlist from
    // REQUIRED_CORE_TABLES above and never originates from user input.
    let sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let column_iter = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut columns: Vec<String> = Vec::new();
    for row in column_iter {
        let column = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        columns.push(column);
    }

    Ok(columns)
}

fn is_required_core_table(table_name: &str) -> bool {
    REQUIRED_CORE_TABLES
        .iter()
        .any(|(required_name, _)| required_name == &table_name)
}
