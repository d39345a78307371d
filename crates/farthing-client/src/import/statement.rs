use chrono::NaiveDate;
use serde::Deserialize;

use crate::{ClientError, ClientResult};

const DEFAULT_CURRENCY: &str = "USD";

/// Normalized statement document produced by the upstream statement parser.
/// One file holds one statement: the external account it belongs to, the
/// closing balance as of `balance_date`, and the statement's transactions.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Statement {
    pub external_account_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub balance: f64,
    pub balance_date: String,
    #[serde(default)]
    pub transactions: Vec<StatementTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatementTransaction {
    pub id: String,
    pub date: String,
    pub payee: String,
    #[serde(default)]
    pub memo: Option<String>,
    pub amount: f64,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

pub(crate) fn parse_statement(path: &str, content: &str) -> ClientResult<Statement> {
    let statement: Statement = serde_json::from_str(content)
        .map_err(|error| ClientError::statement_rejected(path, &error.to_string()))?;
    validate_statement(path, &statement)?;
    Ok(statement)
}

fn validate_statement(path: &str, statement: &Statement) -> ClientResult<()> {
    if statement.external_account_id.trim().is_empty() {
        return Err(ClientError::statement_rejected(
            path,
            "external_account_id must not be empty",
        ));
    }

    validate_date(path, &statement.balance_date)?;

    for transaction in &statement.transactions {
        if transaction.id.trim().is_empty() {
            return Err(ClientError::statement_rejected(
                path,
                "every transaction needs a non-empty external id",
            ));
        }
        if transaction.payee.is_empty() {
            return Err(ClientError::statement_rejected(
                path,
                &format!("transaction `{}` has an empty payee", transaction.id),
            ));
        }
        validate_date(path, &transaction.date)?;
    }

    Ok(())
}

fn validate_date(path: &str, value: &str) -> ClientResult<()> {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(ClientError::statement_rejected(
            path,
            &format!("`{value}` is not a valid YYYY-MM-DD date"),
        ));
    }
    Ok(())
}

/// Fixed-point conversion: a decimal statement amount becomes an integer in
/// minor units, `round(amount * divisor)`. Every sum and comparison after
/// this point is integer arithmetic.
pub(crate) fn scale_amount(amount: f64, divisor: i64) -> i64 {
    (amount * divisor as f64).round() as i64
}
