mod error_text;
mod format;
mod import_text;
mod json;
mod ledger_text;
mod mode;
mod report_text;

use std::io;

use farthing_client::{ClientError, SuccessEnvelope};

pub use mode::{OutputMode, mode_for_command};

use crate::stdout_io::write_stdout_line;

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "import" => import_text::render_import_run(&success.data),
        "import list" => import_text::render_import_list(&success.data),
        "account create" => ledger_text::render_account_create(&success.data),
        "account list" => ledger_text::render_account_list(&success.data),
        "account map" => ledger_text::render_account_map(&success.data),
        "account mappings" => ledger_text::render_account_mappings(&success.data),
        "currency create" => ledger_text::render_currency_create(&success.data),
        "currency list" => ledger_text::render_currency_list(&success.data),
        "rule payee create" => ledger_text::render_payee_rule_create(&success.data),
        "rule payee list" => ledger_text::render_payee_rule_list(&success.data),
        "rule transfer create" => ledger_text::render_transfer_rule_create(&success.data),
        "rule transfer list" => ledger_text::render_transfer_rule_list(&success.data),
        "reconcile" => report_text::render_reconcile(&success.data),
        "transactions" => report_text::render_transactions(&success.data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
