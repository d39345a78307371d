use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::commands::common::load_setup;
use crate::contracts::envelope::SuccessEnvelope;
use crate::import::assertions;
use crate::state::open_readonly_connection;

#[derive(Debug, Default)]
pub struct ReconcileOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run() -> ClientResult<SuccessEnvelope> {
    run_with_options(ReconcileOptions::default())
}

#[doc(hidden)]
pub fn run_with_options(options: ReconcileOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_readonly_connection(&db_path)?;

    let data = assertions::reconcile(&connection, &db_path)?;
    SuccessEnvelope::new("reconcile", data)
}
