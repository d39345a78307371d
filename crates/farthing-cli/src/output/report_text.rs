use std::io;

use serde_json::Value;

use super::format::{Align, Column, render_table};

pub fn render_reconcile(data: &Value) -> io::Result<String> {
    let checked = data
        .get("assertions_checked")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let mismatches = data
        .get("mismatches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if mismatches.is_empty() {
        return Ok(format!(
            "Reconciled {checked} balance assertion(s); every asserted balance matches its postings."
        ));
    }

    let mut lines = vec![format!(
        "Reconciled {checked} balance assertion(s); {} mismatch(es) found.",
        mismatches.len()
    )];
    lines.push(String::new());
    lines.extend(render_table(
        &[
            Column {
                name: "date",
                align: Align::Left,
            },
            Column {
                name: "account",
                align: Align::Left,
            },
            Column {
                name: "currency",
                align: Align::Left,
            },
            Column {
                name: "expected",
                align: Align::Right,
            },
            Column {
                name: "actual",
                align: Align::Right,
            },
            Column {
                name: "difference",
                align: Align::Right,
            },
        ],
        &mismatches
            .iter()
            .map(|row| {
                vec![
                    string_field(row, "date"),
                    string_field(row, "account"),
                    string_field(row, "currency"),
                    int_field(row, "expected").to_string(),
                    int_field(row, "actual").to_string(),
                    int_field(row, "difference").to_string(),
                ]
            })
            .collect::<Vec<_>>(),
    ));
    lines.push(String::new());
    lines.push("Amounts are minor units; difference = actual - expected.".to_string());

    Ok(lines.join("\n"))
}

pub fn render_transactions(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if rows.is_empty() {
        return Ok(
            "No transactions yet. Run `farthing import create <path>` first.".to_string(),
        );
    }

    let mut lines = Vec::new();
    let unbalanced = data
        .get("unbalanced_count")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    lines.push(format!(
        "{} transaction(s), {unbalanced} unbalanced:",
        rows.len()
    ));

    for row in &rows {
        lines.push(String::new());
        let marker = if row.get("balanced").and_then(Value::as_bool).unwrap_or(true) {
            ""
        } else {
            "  [unbalanced]"
        };
        lines.push(format!(
            "{} (txn {}){marker}",
            string_field(row, "date"),
            row.get("txn_id").and_then(Value::as_i64).unwrap_or(0)
        ));

        for note in string_list(row, "notes") {
            lines.push(format!("  note: {note}"));
        }

        let postings = row
            .get("postings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for posting in &postings {
            let mut line = format!(
                "  {:<24} {:>12} {}",
                string_field(posting, "account"),
                int_field(posting, "amount_minor"),
                string_field(posting, "currency")
            );
            let notes = string_list(posting, "notes");
            if !notes.is_empty() {
                line.push_str(&format!("  ({})", notes.join("; ")));
            }
            lines.push(line);
        }
    }

    Ok(lines.join("\n"))
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

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
