use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");
const TRANSFER_MATCH_RULES_SQL: &str = include_str!("migrations/0002_transfer_match_rules.sql");

pub const EXPECTED_USER_VERSION: i64 = 2;

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![
        M::up(BOOTSTRAP_SQL),
        M::up(TRANSFER_MATCH_RULES_SQL),
    ]);
    migrations.to_latest(conn)
}
