use std::path::{Path, PathBuf};

use rusqlite::{OptionalExtension, params};

use crate::commands::common::load_setup;
use crate::contracts::envelope::SuccessEnvelope;
use crate::contracts::types::{
    PayeeRuleListData, PayeeRuleRow, TransferRuleListData, TransferRuleRow,
};
use crate::import::resolve::account_id_by_name;
use crate::state::{map_sqlite_error, open_connection, open_readonly_connection};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct RuleOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn payee_create(payee_contains: &str, account_name: &str) -> ClientResult<SuccessEnvelope> {
    payee_create_with_options(payee_contains, account_name, RuleOptions::default())
}

#[doc(hidden)]
pub fn payee_create_with_options(
    payee_contains: &str,
    account_name: &str,
    options: RuleOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    if payee_contains.is_empty() {
        return Err(ClientError::invalid_argument(
            "Payee substring must not be empty; an empty rule matches every transaction.",
        ));
    }

    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let Some(account_id) = account_id_by_name(&connection, account_name, &db_path)? else {
        return Err(ClientError::account_not_found(account_name));
    };

    let existing = connection
        .query_row(
            "SELECT 1 FROM payee_rule WHERE payee_contains = ?1",
            [payee_contains],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(&db_path, &error))?;
    if existing.is_some() {
        return Err(ClientError::rule_exists("payee", payee_contains));
    }

    connection
        .execute(
            "INSERT INTO payee_rule (payee_contains, account_id) VALUES (?1, ?2)",
            params![payee_contains, account_id],
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    SuccessEnvelope::new(
        "rule payee create",
        PayeeRuleRow {
            payee_contains: payee_contains.to_string(),
            account: account_name.to_string(),
        },
    )
}

pub fn payee_list() -> ClientResult<SuccessEnvelope> {
    payee_list_with_options(RuleOptions::default())
}

#[doc(hidden)]
pub fn payee_list_with_options(options: RuleOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let mut statement = connection
        .prepare(
            "SELECT rule.payee_contains, account.name
             FROM payee_rule AS rule
             JOIN account ON account.id = rule.account_id
             ORDER BY account.name, rule.payee_contains",
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let row_iter = statement
        .query_map([], |row| {
            Ok(PayeeRuleRow {
                payee_contains: row.get(0)?,
                account: row.get(1)?,
            })
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&db_path, &error))?);
    }

    SuccessEnvelope::new("rule payee list", PayeeRuleListData { rows })
}

pub fn transfer_create(payee_prefix: &str) -> ClientResult<SuccessEnvelope> {
    transfer_create_with_options(payee_prefix, RuleOptions::default())
}

#[doc(hidden)]
pub fn transfer_create_with_options(
    payee_prefix: &str,
    options: RuleOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    if payee_prefix.is_empty() {
        return Err(ClientError::invalid_argument(
            "Transfer payee prefix must not be empty.",
        ));
    }

    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let existing = connection
        .query_row(
            "SELECT 1 FROM transfer_match_rule WHERE payee_prefix = ?1",
            [payee_prefix],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(&db_path, &error))?;
    if existing.is_some() {
        return Err(ClientError::rule_exists("transfer", payee_prefix));
    }

    connection
        .execute(
            "INSERT INTO transfer_match_rule (payee_prefix) VALUES (?1)",
            [payee_prefix],
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    SuccessEnvelope::new(
        "rule transfer create",
        TransferRuleRow {
            payee_prefix: payee_prefix.to_string(),
        },
    )
}

pub fn transfer_list() -> ClientResult<SuccessEnvelope> {
    transfer_list_with_options(RuleOptions::default())
}

#[doc(hidden)]
pub fn transfer_list_with_options(options: RuleOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let mut statement = connection
        .prepare("SELECT payee_prefix FROM transfer_match_rule ORDER BY payee_prefix")
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let row_iter = statement
        .query_map([], |row| {
            Ok(TransferRuleRow {
                payee_prefix: row.get(0)?,
            })
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&db_path, &error))?);
    }

    SuccessEnvelope::new("rule transfer list", TransferRuleListData { rows })
}
