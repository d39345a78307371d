use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, OpenFlags, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

const DB_FILE_NAME: &str = "ledger.db";
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Resolves the ledger home (explicit override, then `FARTHING_HOME`, then
/// `~/.farthing`) and makes sure the directory exists with private
/// permissions. Everything the engine persists lives under this directory.
pub fn prepare_ledger_home(home_override: Option<&Path>) -> ClientResult<PathBuf> {
    let home = match home_override {
        Some(path) => absolutize(path)?,
        None => match std::env::var_os("FARTHING_HOME") {
            Some(env_home) => absolutize(Path::new(&env_home))?,
            None => default_ledger_home()?,
        },
    };

    fs::create_dir_all(&home).map_err(|error| map_io_error(&home, &error))?;
    restrict_permissions_best_effort(&home);
    Ok(home)
}

pub fn ledger_db_path(home: &Path) -> PathBuf {
    home.join(DB_FILE_NAME)
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    with_busy_timeout(connection, db_path)
}

/// Read path for reconciliation and report queries. Opening read-only keeps
/// the diagnostic surface incapable of mutating ledger state.
pub fn open_readonly_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
    )
    .map_err(|error| map_sqlite_error(db_path, &error))?;
    with_busy_timeout(connection, db_path)
}

fn with_busy_timeout(connection: Connection, db_path: &Path) -> ClientResult<Connection> {
    connection
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

pub fn map_io_error(path: &Path, error: &io::Error) -> ClientError {
    match error.kind() {
        io::ErrorKind::PermissionDenied => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            ClientError::ledger_locked(path)
        }
        Some(ErrorCode::NotADatabase) => ClientError::ledger_corrupt(path),
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly) => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

fn default_ledger_home() -> ClientResult<PathBuf> {
    home::home_dir()
        .map(|home| home.join(".farthing"))
        .ok_or_else(|| {
            ClientError::ledger_init_failed(
                Path::new("."),
                "Could not resolve a home directory for ledger initialization.",
            )
        })
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::ledger_init_failed(path, &error.to_string()))
}

#[cfg(unix)]
fn restrict_permissions_best_effort(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn restrict_permissions_best_effort(_path: &Path) {}
