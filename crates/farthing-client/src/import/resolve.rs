use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

/// A currency resolved to its ledger row. The divisor scales decimal
/// statement amounts into integer minor units.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedCurrency {
    pub(crate) currency_id: i64,
    pub(crate) divisor: i64,
}

/// No amount can be represented without a known divisor, so an unknown
/// currency aborts the whole run.
pub(crate) fn resolve_currency(
    connection: &Connection,
    name: &str,
    db_path: &Path,
) -> ClientResult<ResolvedCurrency> {
    let resolved = connection
        .query_row(
            "SELECT id, divisor FROM currency WHERE name = ?1",
            [name],
            |row| {
                Ok(ResolvedCurrency {
                    currency_id: row.get(0)?,
                    divisor: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    resolved.ok_or_else(|| ClientError::unknown_currency(name))
}

/// Maps a statement's external account id to the internal account. `None`
/// means the mapping was never configured; the caller skips that statement
/// and carries on with the rest.
pub(crate) fn resolve_external_account(
    connection: &Connection,
    external_id: &str,
    db_path: &Path,
) -> ClientResult<Option<i64>> {
    connection
        .query_row(
            "SELECT account_id FROM external_account_mapping WHERE external_id = ?1",
            [external_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub(crate) fn account_id_by_name(
    connection: &Connection,
    name: &str,
    db_path: &Path,
) -> ClientResult<Option<i64>> {
    connection
        .query_row(
            "SELECT id FROM account WHERE name = ?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}
