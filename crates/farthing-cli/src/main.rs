mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use farthing_client::ClientError;
use stdout_io::write_stdout_text;

const ROOT_HELP: &str = "Farthing - double-entry ledger with idempotent statement import

Usage:
  farthing <command>

Start here:
  farthing account list
  farthing import create --help
  farthing reconcile
";

const TOP_LEVEL_HELP: &str = "Farthing — double-entry ledger with idempotent statement import

USAGE: farthing <command>

Set up your ledger:
  1. farthing account create <name>                   Create internal accounts (Checking, Dining, ...)
  2. farthing account map <external-id> <account>     Map each bank account id to an internal account
  3. farthing rule payee create <substring> <account> Categorize payees on import (optional)
  4. farthing rule transfer create <prefix>           Merge transfer legs across accounts (optional)

Import statements:
  farthing import create --help                       Read the statement format and workflow
  farthing import create <path>...                    Import statement files (reimport is a no-op)
  farthing import list                                List past import runs

Inspect and verify:
  farthing transactions                               Transactions with postings and notes
  farthing account list                               Per-account, per-currency balances
  farthing reconcile                                  Check every statement balance against postings

Other commands:
  farthing currency create <name> <divisor>           Register a non-USD currency
  farthing account mappings                           List external account mappings
  farthing rule payee list                            List categorization rules
  farthing rule transfer list                         List transfer-matching rules

Having issues or errors?
  Run `farthing <command> --help` for command usage.
";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) && is_top_level_help_request(&raw_args)
                {
                    if write_stdout_text(TOP_LEVEL_HELP).is_err() {
                        return Err(ExitCode::from(2));
                    }
                } else if write_stdout_text(&err.to_string()).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }
            let command_hint = if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(&raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    let dispatched = dispatch::dispatch(&cli);
    match dispatched {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Strips clap's trailing boilerplate (Usage line, "For more information" hint)
/// so the error output's "What to do next" section is the single source of
/// guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Builds the subcommand path from raw CLI args for use in help hints.
///
/// Collects non-flag arguments after the binary name to form a command
/// string like "account map" or "rule payee create".
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let non_flags: Vec<&str> = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect();
    if non_flags.is_empty() {
        return None;
    }

    let hint = match non_flags.as_slice() {
        ["account", "create", ..] => Some("account create"),
        ["account", "list", ..] => Some("account list"),
        ["account", "map", ..] => Some("account map"),
        ["account", "mappings", ..] => Some("account mappings"),
        ["account", ..] => Some("account"),
        ["currency", "create", ..] => Some("currency create"),
        ["currency", "list", ..] => Some("currency list"),
        ["currency", ..] => Some("currency"),
        ["import", "create", ..] => Some("import create"),
        ["import", "list", ..] => Some("import list"),
        ["import", ..] => Some("import"),
        ["rule", "payee", "create", ..] => Some("rule payee create"),
        ["rule", "payee", "list", ..] => Some("rule payee list"),
        ["rule", "payee", ..] => Some("rule payee"),
        ["rule", "transfer", "create", ..] => Some("rule transfer create"),
        ["rule", "transfer", "list", ..] => Some("rule transfer list"),
        ["rule", "transfer", ..] => Some("rule transfer"),
        ["rule", ..] => Some("rule"),
        ["reconcile", ..] => Some("reconcile"),
        ["transactions", ..] => Some("transactions"),
        _ => None,
    };
    hint.map(std::string::ToString::to_string)
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if is_internal_error(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn is_internal_error(error: &ClientError) -> bool {
    error.code.starts_with("internal_")
        || matches!(
            error.code.as_str(),
            "ledger_init_permission_denied"
                | "ledger_locked"
                | "ledger_corrupt"
                | "migration_failed"
                | "ledger_init_failed"
        )
}
