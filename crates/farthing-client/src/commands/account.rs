use std::path::{Path, PathBuf};

use rusqlite::params;

use crate::commands::common::{format_minor, load_setup};
use crate::contracts::envelope::SuccessEnvelope;
use crate::contracts::types::{
    AccountCreateData, AccountListData, AccountMapData, AccountMappingRow, AccountMappingsData,
    BalanceRow,
};
use crate::import::resolve::{account_id_by_name, resolve_external_account};
use crate::state::{map_sqlite_error, open_connection, open_readonly_connection};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct AccountOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn create(name: &str) -> ClientResult<SuccessEnvelope> {
    create_with_options(name, AccountOptions::default())
}

#[doc(hidden)]
pub fn create_with_options(name: &str, options: AccountOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::invalid_argument("Account name must not be empty."));
    }

    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    if account_id_by_name(&connection, name, &db_path)?.is_some() {
        return Err(ClientError::account_exists(name));
    }

    connection
        .execute("INSERT INTO account (name) VALUES (?1)", [name])
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    SuccessEnvelope::new(
        "account create",
        AccountCreateData {
            account_id: connection.last_insert_rowid(),
            name: name.to_string(),
        },
    )
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(AccountOptions::default())
}

#[doc(hidden)]
pub fn list_with_options(options: AccountOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let mut statement = connection
        .prepare(
            "SELECT
                account.name,
                SUM(posting.amount),
                currency.name,
                currency.divisor
             FROM account
             LEFT JOIN posting ON posting.account_id = account.id
             LEFT JOIN currency ON currency.id = posting.currency_id
             GROUP BY account.name, currency.name, currency.divisor
             ORDER BY account.name, currency.name",
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let row_iter = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        let (account, balance_minor, currency, divisor) =
            row.map_err(|error| map_sqlite_error(&db_path, &error))?;
        let balance = match (balance_minor, divisor) {
            (Some(amount), Some(divisor)) => Some(format_minor(amount, divisor)),
            _ => None,
        };
        rows.push(BalanceRow {
            account,
            currency,
            balance_minor,
            balance,
        });
    }

    SuccessEnvelope::new("account list", AccountListData { rows })
}

pub fn map(external_id: &str, account_name: &str) -> ClientResult<SuccessEnvelope> {
    map_with_options(external_id, account_name, AccountOptions::default())
}

#[doc(hidden)]
pub fn map_with_options(
    external_id: &str,
    account_name: &str,
    options: AccountOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let external_id = external_id.trim();
    if external_id.is_empty() {
        return Err(ClientError::invalid_argument(
            "External account id must not be empty.",
        ));
    }

    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let Some(account_id) = account_id_by_name(&connection, account_name, &db_path)? else {
        return Err(ClientError::account_not_found(account_name));
    };

    if resolve_external_account(&connection, external_id, &db_path)?.is_some() {
        return Err(ClientError::external_account_already_mapped(external_id));
    }

    connection
        .execute(
            "INSERT INTO external_account_mapping (external_id, account_id) VALUES (?1, ?2)",
            params![external_id, account_id],
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    SuccessEnvelope::new(
        "account map",
        AccountMapData {
            external_id: external_id.to_string(),
            account: account_name.to_string(),
        },
    )
}

pub fn mappings() -> ClientResult<SuccessEnvelope> {
    mappings_with_options(AccountOptions::default())
}

#[doc(hidden)]
pub fn mappings_with_options(options: AccountOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let mut statement = connection
        .prepare(
            "SELECT mapping.external_id, account.name
             FROM external_account_mapping AS mapping
             JOIN account ON account.id = mapping.account_id
             ORDER BY account.name, mapping.external_id",
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let row_iter = statement
        .query_map([], |row| {
            Ok(AccountMappingRow {
                external_id: row.get(0)?,
                account: row.get(1)?,
            })
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&db_path, &error))?);
    }

    SuccessEnvelope::new("account mappings", AccountMappingsData { rows })
}
