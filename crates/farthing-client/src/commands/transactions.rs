use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::ClientResult;
use crate::commands::common::load_setup;
use crate::contracts::envelope::SuccessEnvelope;
use crate::contracts::types::{PostingRow, TransactionListData, TransactionRow};
use crate::import::count_unbalanced;
use crate::state::{map_sqlite_error, open_readonly_connection};

#[derive(Debug, Default)]
pub struct TransactionsOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(TransactionsOptions::default())
}

#[doc(hidden)]
pub fn list_with_options(options: TransactionsOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let unbalanced = unbalanced_txn_ids(&connection, &db_path)?;
    let unbalanced_count = count_unbalanced(&connection, &db_path)?;

    let mut statement = connection
        .prepare("SELECT id, date FROM txn ORDER BY date DESC, id DESC")
        .map_err(|error| map_sqlite_error(&db_path, &error))?;
    let txn_iter = statement
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for txn in txn_iter {
        let (txn_id, date) = txn.map_err(|error| map_sqlite_error(&db_path, &error))?;
        rows.push(TransactionRow {
            txn_id,
            date,
            balanced: !unbalanced.contains(&txn_id),
            notes: transaction_notes(&connection, &db_path, txn_id)?,
            postings: transaction_postings(&connection, &db_path, txn_id)?,
        });
    }

    SuccessEnvelope::new(
        "transactions",
        TransactionListData {
            unbalanced_count,
            rows,
        },
    )
}

fn unbalanced_txn_ids(connection: &Connection, db_path: &Path) -> ClientResult<HashSet<i64>> {
    let mut statement = connection
        .prepare(
            "SELECT txn_id FROM posting
             GROUP BY txn_id, currency_id
             HAVING SUM(amount) != 0",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let id_iter = statement
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut ids = HashSet::new();
    for id in id_iter {
        ids.insert(id.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    Ok(ids)
}

fn transaction_notes(
    connection: &Connection,
    db_path: &Path,
    txn_id: i64,
) -> ClientResult<Vec<String>> {
    let mut statement = connection
        .prepare("SELECT description FROM txn_note WHERE txn_id = ?1 ORDER BY description")
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let note_iter = statement
        .query_map([txn_id], |row| row.get::<_, String>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut notes = Vec::new();
    for note in note_iter {
        notes.push(note.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    Ok(notes)
}

fn transaction_postings(
    connection: &Connection,
    db_path: &Path,
    txn_id: i64,
) -> ClientResult<Vec<PostingRow>> {
    let mut statement = connection
        .prepare(
            "SELECT account.id, account.name, posting.amount, currency.name
             FROM posting
             JOIN account ON account.id = posting.account_id
             JOIN currency ON currency.id = posting.currency_id
             WHERE posting.txn_id = ?1
             ORDER BY posting.rowid",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let posting_iter = statement
        .query_map([txn_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut postings = Vec::new();
    for posting in posting_iter {
        let (account_id, account, amount_minor, currency) =
            posting.map_err(|error| map_sqlite_error(db_path, &error))?;
        postings.push(PostingRow {
            account,
            amount_minor,
            currency,
            notes: posting_notes(connection, db_path, txn_id, account_id)?,
        });
    }

    Ok(postings)
}

fn posting_notes(
    connection: &Connection,
    db_path: &Path,
    txn_id: i64,
    account_id: i64,
) -> ClientResult<Vec<String>> {
    let mut statement = connection
        .prepare(
            "SELECT description FROM posting_note
             WHERE txn_id = ?1 AND account_id = ?2
             ORDER BY description",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let note_iter = statement
        .query_map([txn_id, account_id], |row| row.get::<_, String>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut notes = Vec::new();
    for note in note_iter {
        notes.push(note.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    Ok(notes)
}
