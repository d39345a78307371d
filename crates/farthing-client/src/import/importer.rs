use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::ClientResult;
use crate::import::postings;
use crate::import::resolve::ResolvedCurrency;
use crate::import::rules::{PayeeRuleSet, TransferMatcher};
use crate::import::statement::{StatementTransaction, scale_amount};
use crate::state::map_sqlite_error;

/// Terminal state for one external transaction. Each external id is
/// resolved at most once; there is no transition back.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum ImportOutcome {
    /// Already mapped from an earlier run; reimport is a no-op.
    Skipped,
    /// Merged into an existing transaction found via the transfer matcher.
    Reused { postings_written: i64 },
    Created { postings_written: i64 },
}

/// Imports one external transaction: mapping lookup, reuse check, create,
/// annotate, allocate postings, and only then record the external mapping.
/// The mapping insert comes last so a failure partway never leaves a mapped
/// external id without its postings; a retry reprocesses the transaction.
pub(crate) fn import_transaction(
    connection: &Connection,
    db_path: &Path,
    account_id: i64,
    currency: ResolvedCurrency,
    rules: &PayeeRuleSet,
    transfers: &TransferMatcher,
    transaction: &StatementTransaction,
) -> ClientResult<ImportOutcome> {
    if lookup_mapping(connection, db_path, account_id, &transaction.id)?.is_some() {
        return Ok(ImportOutcome::Skipped);
    }

    let reused_txn_id = match transfers.reuse_key(&transaction.payee, transaction.memo.as_deref()) {
        Some(memo) => find_transaction_by_note(connection, db_path, memo)?,
        None => None,
    };

    let (txn_id, reused) = match reused_txn_id {
        Some(existing) => (existing, true),
        None => (
            create_transaction(connection, db_path, &transaction.date)?,
            false,
        ),
    };

    insert_note(connection, db_path, txn_id, &transaction.payee)?;
    if let Some(memo) = transaction.memo.as_deref()
        && !memo.is_empty()
    {
        insert_note(connection, db_path, txn_id, memo)?;
    }

    let amount = scale_amount(transaction.amount, currency.divisor);
    let plan = postings::allocate(rules, account_id, amount, &transaction.payee)?;
    let postings_written = postings::persist(connection, db_path, txn_id, currency.currency_id, &plan)?;

    record_mapping(connection, db_path, account_id, &transaction.id, txn_id)?;

    if reused {
        Ok(ImportOutcome::Reused { postings_written })
    } else {
        Ok(ImportOutcome::Created { postings_written })
    }
}

fn lookup_mapping(
    connection: &Connection,
    db_path: &Path,
    account_id: i64,
    external_txn: &str,
) -> ClientResult<Option<i64>> {
    connection
        .query_row(
            "SELECT txn_id FROM external_txn_mapping
             WHERE external_account = ?1 AND external_txn = ?2",
            params![account_id, external_txn],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

fn find_transaction_by_note(
    connection: &Connection,
    db_path: &Path,
    description: &str,
) -> ClientResult<Option<i64>> {
    connection
        .query_row(
            "SELECT txn_id FROM txn_note WHERE description = ?1 ORDER BY txn_id ASC LIMIT 1",
            [description],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

fn create_transaction(connection: &Connection, db_path: &Path, date: &str) -> ClientResult<i64> {
    connection
        .execute("INSERT INTO txn (date) VALUES (?1)", [date])
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection.last_insert_rowid())
}

fn insert_note(
    connection: &Connection,
    db_path: &Path,
    txn_id: i64,
    description: &str,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT OR IGNORE INTO txn_note (txn_id, description) VALUES (?1, ?2)",
            params![txn_id, description],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

fn record_mapping(
    connection: &Connection,
    db_path: &Path,
    account_id: i64,
    external_txn: &str,
    txn_id: i64,
) -> ClientResult<()> {
    connection
        .execute(
            "INSERT INTO external_txn_mapping (external_account, external_txn, txn_id)
             VALUES (?1, ?2, ?3)",
            params![account_id, external_txn, txn_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}
