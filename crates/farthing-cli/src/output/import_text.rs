use std::io;

use serde_json::Value;

use super::format::{Align, Column, key_value_rows, render_table};

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let run_id = string_field(data, "run_id");
    let totals = data.get("totals").cloned().unwrap_or(Value::Null);

    let mut lines = vec![format!("Import run {run_id}"), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Statements read", int_field(&totals, "statements_read").to_string()),
            (
                "Statements imported",
                int_field(&totals, "statements_imported").to_string(),
            ),
            (
                "Statements skipped",
                int_field(&totals, "statements_skipped").to_string(),
            ),
            (
                "Transactions created",
                int_field(&totals, "transactions_created").to_string(),
            ),
            (
                "Transactions reused",
                int_field(&totals, "transactions_reused").to_string(),
            ),
            (
                "Transactions skipped",
                int_field(&totals, "transactions_skipped").to_string(),
            ),
            (
                "Postings written",
                int_field(&totals, "postings_written").to_string(),
            ),
        ],
        2,
    ));

    let statements = rows(data, "statements");
    if !statements.is_empty() {
        lines.push(String::new());
        lines.push("Statements:".to_string());
        lines.extend(render_table(
            &[
                Column {
                    name: "path",
                    align: Align::Left,
                },
                Column {
                    name: "status",
                    align: Align::Left,
                },
                Column {
                    name: "created",
                    align: Align::Right,
                },
                Column {
                    name: "reused",
                    align: Align::Right,
                },
                Column {
                    name: "skipped",
                    align: Align::Right,
                },
            ],
            &statements
                .iter()
                .map(|row| {
                    vec![
                        string_field(row, "path"),
                        string_field(row, "status"),
                        int_field(row, "transactions_created").to_string(),
                        int_field(row, "transactions_reused").to_string(),
                        int_field(row, "transactions_skipped").to_string(),
                    ]
                })
                .collect::<Vec<_>>(),
        ));
    }

    let warnings = statements
        .iter()
        .filter_map(|row| row.get("warning").and_then(Value::as_str))
        .collect::<Vec<_>>();
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        for warning in warnings {
            lines.push(format!("  - {warning}"));
        }
    }

    let unbalanced = int_field(data, "unbalanced_transactions");
    if unbalanced > 0 {
        lines.push(String::new());
        lines.push(format!(
            "{unbalanced} transaction(s) have postings that do not sum to zero."
        ));
        lines.push("Run `farthing transactions` to review them.".to_string());
    }

    Ok(lines.join("\n"))
}

pub fn render_import_list(data: &Value) -> io::Result<String> {
    let runs = rows(data, "rows");
    if runs.is_empty() {
        return Ok("No import runs yet. Run `farthing import create <path>` first.".to_string());
    }

    let mut lines = vec!["Import runs (newest first):".to_string()];
    lines.extend(render_table(
        &[
            Column {
                name: "run",
                align: Align::Left,
            },
            Column {
                name: "when",
                align: Align::Left,
            },
            Column {
                name: "read",
                align: Align::Right,
            },
            Column {
                name: "imported",
                align: Align::Right,
            },
            Column {
                name: "skipped",
                align: Align::Right,
            },
            Column {
                name: "created",
                align: Align::Right,
            },
            Column {
                name: "reused",
                align: Align::Right,
            },
        ],
        &runs
            .iter()
            .map(|row| {
                vec![
                    string_field(row, "run_id"),
                    string_field(row, "created_at"),
                    int_field(row, "statements_read").to_string(),
                    int_field(row, "statements_imported").to_string(),
                    int_field(row, "statements_skipped").to_string(),
                    int_field(row, "transactions_created").to_string(),
                    int_field(row, "transactions_reused").to_string(),
                ]
            })
            .collect::<Vec<_>>(),
    ));

    Ok(lines.join("\n"))
}

fn rows(data: &Value, key: &str) -> Vec<Value> {
    data.get(key)
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

fn int_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}
