use std::path::{Path, PathBuf};

use crate::contracts::envelope::SuccessEnvelope;
use crate::contracts::types::{ImportListData, ImportRunRow};
use crate::commands::common::load_setup;
use crate::import;
use crate::state::{map_sqlite_error, open_connection};
use crate::ClientResult;

#[derive(Debug, Default)]
pub struct ImportRunOptions<'a> {
    pub paths: Vec<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct ImportListOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run(paths: Vec<String>) -> ClientResult<SuccessEnvelope> {
    run_with_options(ImportRunOptions {
        paths,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let data = import::execute(&setup, &options.paths)?;
    SuccessEnvelope::new("import", data)
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(ImportListOptions {
        home_override: None,
    })
}

#[doc(hidden)]
pub fn list_with_options(options: ImportListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let mut statement = connection
        .prepare(
            "SELECT
                run_id,
                created_at,
                statements_read,
                statements_imported,
                statements_skipped,
                transactions_created,
                transactions_reused,
                transactions_skipped
             FROM import_run
             ORDER BY created_at DESC, run_id DESC",
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let row_iter = statement
        .query_map([], |row| {
            Ok(ImportRunRow {
                run_id: row.get(0)?,
                created_at: row.get(1)?,
                statements_read: row.get(2)?,
                statements_imported: row.get(3)?,
                statements_skipped: row.get(4)?,
                transactions_created: row.get(5)?,
                transactions_reused: row.get(6)?,
                transactions_skipped: row.get(7)?,
            })
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&db_path, &error))?);
    }

    SuccessEnvelope::new("import list", ImportListData { rows })
}
