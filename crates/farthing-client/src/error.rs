use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(
            "invalid_argument",
            message,
            vec!["Run `farthing --help` for usage.".to_string()],
        )
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let step = match command {
            Some(command) => format!("Run `farthing {command} --help` for usage."),
            None => "Run `farthing --help` for usage.".to_string(),
        };
        Self::new("invalid_argument", message, vec![step])
    }

    pub fn unknown_currency(name: &str) -> Self {
        Self::new(
            "unknown_currency",
            &format!("Currency `{name}` is not registered in the ledger."),
            vec![
                format!("Run `farthing currency create {name} <divisor>` to register it."),
                "Rerun `farthing import create <path>`.".to_string(),
            ],
        )
        .with_data(json!({ "currency": name }))
    }

    pub fn currency_exists(name: &str) -> Self {
        Self::new(
            "currency_exists",
            &format!("Currency `{name}` already exists."),
            vec!["Run `farthing currency list` to inspect registered currencies.".to_string()],
        )
    }

    pub fn invalid_divisor(divisor: i64) -> Self {
        Self::new(
            "invalid_divisor",
            &format!("Currency divisor must be a positive integer, got {divisor}."),
            vec!["Use the minor-unit scale, e.g. 100 for cent-denominated currencies.".to_string()],
        )
    }

    pub fn account_not_found(name: &str) -> Self {
        Self::new(
            "account_not_found",
            &format!("Account `{name}` does not exist."),
            vec![
                format!("Run `farthing account create {name}` first."),
                "Run `farthing account list` to see existing accounts.".to_string(),
            ],
        )
    }

    pub fn account_exists(name: &str) -> Self {
        Self::new(
            "account_exists",
            &format!("Account `{name}` already exists."),
            vec!["Run `farthing account list` to inspect existing accounts.".to_string()],
        )
    }

    pub fn external_account_already_mapped(external_id: &str) -> Self {
        Self::new(
            "external_account_already_mapped",
            &format!("External account `{external_id}` is already mapped."),
            vec!["Run `farthing account mappings` to review existing mappings.".to_string()],
        )
        .with_data(json!({ "external_id": external_id }))
    }

    pub fn rule_exists(kind: &str, pattern: &str) -> Self {
        Self::new(
            "rule_exists",
            &format!("A {kind} rule for `{pattern}` already exists."),
            vec![format!(
                "Run `farthing rule {kind} list` to review configured rules."
            )],
        )
    }

    pub fn ambiguous_payee_rule(payee: &str, matches: &[(String, String)]) -> Self {
        let matched = matches
            .iter()
            .map(|(substring, account)| json!({ "payee_contains": substring, "account": account }))
            .collect::<Vec<Value>>();
        Self::new(
            "ambiguous_payee_rule",
            &format!("Payee `{payee}` matches more than one payee rule."),
            vec![
                "Run `farthing rule payee list` and remove or narrow the overlapping rules."
                    .to_string(),
                "Rerun the import once the rule set is mutually exclusive.".to_string(),
            ],
        )
        .with_data(json!({ "payee": payee, "matched_rules": matched }))
    }

    pub fn statement_rejected(path: &str, detail: &str) -> Self {
        Self::new(
            "statement_rejected",
            &format!("Statement `{path}` could not be imported: {detail}"),
            vec![
                "Fix the statement file; malformed statements are never partially imported."
                    .to_string(),
                "Rerun `farthing import create <path>`.".to_string(),
            ],
        )
        .with_data(json!({ "path": path }))
    }

    pub fn no_statements_found(path: &str) -> Self {
        Self::new(
            "no_statements_found",
            &format!("No statement files found at `{path}`."),
            vec![
                "Pass one or more statement JSON files or a directory containing them.".to_string(),
            ],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `FARTHING_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite ledger file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
