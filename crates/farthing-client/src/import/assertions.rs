use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::ClientResult;
use crate::contracts::types::{ReconcileData, ReconciliationRow};
use crate::state::map_sqlite_error;

/// Statement-level idempotency gate: an exact (date, account, balance)
/// assertion on record means the statement was fully imported before, so
/// none of its transactions are reprocessed.
pub(crate) fn assertion_exists(
    connection: &Connection,
    db_path: &Path,
    date: &str,
    account_id: i64,
    balance: i64,
) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM balance_assertion
             WHERE date = ?1 AND account_id = ?2 AND balance = ?3",
            params![date, account_id, balance],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(found.unwrap_or(false))
}

/// Recorded only after every transaction in the statement landed, so the
/// gate above can never claim a half-imported statement is done.
pub(crate) fn record_assertion(
    connection: &Connection,
    db_path: &Path,
    date: &str,
    account_id: i64,
    balance: i64,
    currency_id: i64,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO balance_assertion (date, account_id, balance, currency_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![date, account_id, balance, currency_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

/// Diagnostic pass over every stored assertion: recompute the account's
/// balance as the sum of postings in that currency dated strictly before the
/// assertion date, and report each disagreement. Runs on a read-only
/// connection and never mutates state.
pub(crate) fn reconcile(connection: &Connection, db_path: &Path) -> ClientResult<ReconcileData> {
    let mut statement = connection
        .prepare(
            "SELECT
                assertion.date,
                assertion.account_id,
                account.name,
                assertion.balance,
                assertion.currency_id,
                currency.name
             FROM balance_assertion AS assertion
             JOIN account ON account.id = assertion.account_id
             JOIN currency ON currency.id = assertion.currency_id
             ORDER BY assertion.date, account.name",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let assertion_iter = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut assertions_checked = 0_i64;
    let mut mismatches = Vec::new();

    for assertion in assertion_iter {
        let (date, account_id, account_name, expected, currency_id, currency_name) =
            assertion.map_err(|error| map_sqlite_error(db_path, &error))?;
        assertions_checked += 1;

        let actual = posting_sum_before(connection, db_path, account_id, currency_id, &date)?;
        if actual != expected {
            mismatches.push(ReconciliationRow {
                date,
                account: account_name,
                currency: currency_name,
                expected,
                actual,
                difference: actual - expected,
            });
        }
    }

    Ok(ReconcileData {
        assertions_checked,
        mismatches,
    })
}

fn posting_sum_before(
    connection: &Connection,
    db_path: &Path,
    account_id: i64,
    currency_id: i64,
    date: &str,
) -> ClientResult<i64> {
    // SUM over zero rows is NULL; an account with no postings yet balances
    // at zero.
    connection
        .query_row(
            "SELECT COALESCE(SUM(posting.amount), 0)
             FROM posting
             JOIN txn ON txn.id = posting.txn_id
             WHERE txn.date < ?1
               AND posting.account_id = ?2
               AND posting.currency_id = ?3",
            params![date, account_id, currency_id],
            |row| row.get::<_, i64>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}
