use std::path::{Path, PathBuf};

use rusqlite::{OptionalExtension, params};

use crate::commands::common::load_setup;
use crate::contracts::envelope::SuccessEnvelope;
use crate::contracts::types::{CurrencyListData, CurrencyRow};
use crate::state::{map_sqlite_error, open_connection, open_readonly_connection};
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct CurrencyOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn create(name: &str, divisor: i64) -> ClientResult<SuccessEnvelope> {
    create_with_options(name, divisor, CurrencyOptions::default())
}

#[doc(hidden)]
pub fn create_with_options(
    name: &str,
    divisor: i64,
    options: CurrencyOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::invalid_argument(
            "Currency name must not be empty.",
        ));
    }
    if divisor <= 0 {
        return Err(ClientError::invalid_divisor(divisor));
    }

    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let existing = connection
        .query_row("SELECT 1 FROM currency WHERE name = ?1", [name], |_row| {
            Ok(true)
        })
        .optional()
        .map_err(|error| map_sqlite_error(&db_path, &error))?;
    if existing.is_some() {
        return Err(ClientError::currency_exists(name));
    }

    connection
        .execute(
            "INSERT INTO currency (name, divisor) VALUES (?1, ?2)",
            params![name, divisor],
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    SuccessEnvelope::new(
        "currency create",
        CurrencyRow {
            name: name.to_string(),
            divisor,
        },
    )
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(CurrencyOptions::default())
}

#[doc(hidden)]
pub fn list_with_options(options: CurrencyOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let mut statement = connection
        .prepare("SELECT name, divisor FROM currency ORDER BY name")
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let row_iter = statement
        .query_map([], |row| {
            Ok(CurrencyRow {
                name: row.get(0)?,
                divisor: row.get(1)?,
            })
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&db_path, &error))?);
    }

    SuccessEnvelope::new("currency list", CurrencyListData { rows })
}
