use std::io;

use serde_json::Value;

use super::format::{Align, Column, render_table};

pub fn render_account_create(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Created account `{}`.",
        string_field(data, "name")
    ))
}

pub fn render_account_list(data: &Value) -> io::Result<String> {
    let rows = rows(data);
    if rows.is_empty() {
        return Ok(
            "No accounts yet. Run `farthing account create <name>` first.".to_string(),
        );
    }

    let mut lines = vec!["Accounts:".to_string()];
    lines.extend(render_table(
        &[
            Column {
                name: "account",
                align: Align::Left,
            },
            Column {
                name: "currency",
                align: Align::Left,
            },
            Column {
                name: "balance",
                align: Align::Right,
            },
        ],
        &rows
            .iter()
            .map(|row| {
                vec![
                    string_field(row, "account"),
                    string_field(row, "currency"),
                    string_field(row, "balance"),
                ]
            })
            .collect::<Vec<_>>(),
    ));

    Ok(lines.join("\n"))
}

pub fn render_account_map(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Mapped external account `{}` to `{}`.",
        string_field(data, "external_id"),
        string_field(data, "account")
    ))
}

pub fn render_account_mappings(data: &Value) -> io::Result<String> {
    let rows = rows(data);
    if rows.is_empty() {
        return Ok(
            "No mappings yet. Run `farthing account map <external-id> <account>` first."
                .to_string(),
        );
    }

    let mut lines = vec!["Account mappings:".to_string()];
    lines.extend(render_table(
        &[
            Column {
                name: "external id",
                align: Align::Left,
            },
            Column {
                name: "account",
                align: Align::Left,
            },
        ],
        &rows
            .iter()
            .map(|row| {
                vec![
                    string_field(row, "external_id"),
                    string_field(row, "account"),
                ]
            })
            .collect::<Vec<_>>(),
    ));

    Ok(lines.join("\n"))
}

pub fn render_currency_create(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Registered currency `{}` with divisor {}.",
        string_field(data, "name"),
        data.get("divisor").and_then(Value::as_i64).unwrap_or(0)
    ))
}

pub fn render_currency_list(data: &Value) -> io::Result<String> {
    let rows = rows(data);

    let mut lines = vec!["Currencies:".to_string()];
    lines.extend(render_table(
        &[
            Column {
                name: "currency",
                align: Align::Left,
            },
            Column {
                name: "divisor",
                align: Align::Right,
            },
        ],
        &rows
            .iter()
            .map(|row| {
                vec![
                    string_field(row, "name"),
                    row.get("divisor")
                        .and_then(Value::as_i64)
                        .unwrap_or(0)
                        .to_string(),
                ]
            })
            .collect::<Vec<_>>(),
    ));

    Ok(lines.join("\n"))
}

pub fn render_payee_rule_create(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Payees containing `{}` will now post to `{}`.",
        string_field(data, "payee_contains"),
        string_field(data, "account")
    ))
}

pub fn render_payee_rule_list(data: &Value) -> io::Result<String> {
    let rows = rows(data);
    if rows.is_empty() {
        return Ok(
            "No payee rules yet. Run `farthing rule payee create <substring> <account>` first."
                .to_string(),
        );
    }

    let mut lines = vec!["Payee rules:".to_string()];
    lines.extend(render_table(
        &[
            Column {
                name: "payee contains",
                align: Align::Left,
            },
            Column {
                name: "account",
                align: Align::Left,
            },
        ],
        &rows
            .iter()
            .map(|row| {
                vec![
                    string_field(row, "payee_contains"),
                    string_field(row, "account"),
                ]
            })
            .collect::<Vec<_>>(),
    ));

    Ok(lines.join("\n"))
}

pub fn render_transfer_rule_create(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Payees starting with `{}` will now merge transfer legs by memo.",
        string_field(data, "payee_prefix")
    ))
}

pub fn render_transfer_rule_list(data: &Value) -> io::Result<String> {
    let rows = rows(data);
    if rows.is_empty() {
        return Ok(
            "No transfer rules yet. Run `farthing rule transfer create <prefix>` first."
                .to_string(),
        );
    }

    let mut lines = vec!["Transfer rules:".to_string()];
    for row in &rows {
        lines.push(format!("  - {}", string_field(row, "payee_prefix")));
    }

    Ok(lines.join("\n"))
}

fn rows(data: &Value) -> Vec<Value> {
    data.get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}
