use std::path::Path;

use rusqlite::{Connection, params};

use crate::ClientResult;
use crate::import::rules::PayeeRuleSet;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone)]
pub(crate) struct PlannedPosting {
    pub(crate) account_id: i64,
    pub(crate) amount: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct PlannedNote {
    pub(crate) account_id: i64,
    pub(crate) description: String,
}

/// The balanced (or deliberately single-legged) posting set for one
/// transaction, plus the audit note recording which rule balanced it.
#[derive(Debug, Clone)]
pub(crate) struct PostingPlan {
    pub(crate) postings: Vec<PlannedPosting>,
    pub(crate) note: Option<PlannedNote>,
}

/// Builds the primary posting against the statement's account and, when
/// exactly one payee rule matches, the balancing counter-posting. With no
/// matching rule the transaction stays single-sided awaiting manual
/// categorization; the zero-sum invariant is checked on read, not here.
pub(crate) fn allocate(
    rules: &PayeeRuleSet,
    source_account_id: i64,
    amount: i64,
    payee: &str,
) -> ClientResult<PostingPlan> {
    let mut postings = vec![PlannedPosting {
        account_id: source_account_id,
        amount,
    }];
    let mut note = None;

    if let Some(rule) = rules.match_payee(payee)? {
        postings.push(PlannedPosting {
            account_id: rule.account_id,
            amount: -amount,
        });
        note = Some(PlannedNote {
            account_id: rule.account_id,
            description: format!("payee contained '{}'", rule.payee_contains),
        });
    }

    Ok(PostingPlan { postings, note })
}

/// Writes the plan inside the statement's transaction so postings and their
/// notes land as a unit. Returns the number of postings written.
pub(crate) fn persist(
    connection: &Connection,
    db_path: &Path,
    txn_id: i64,
    currency_id: i64,
    plan: &PostingPlan,
) -> ClientResult<i64> {
    for posting in &plan.postings {
        connection
            .execute(
                "INSERT INTO posting (txn_id, account_id, amount, currency_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![txn_id, posting.account_id, posting.amount, currency_id],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    if let Some(note) = &plan.note {
        connection
            .execute(
                "INSERT OR IGNORE INTO posting_note (txn_id, account_id, description)
                 VALUES (?1, ?2, ?3)",
                params![txn_id, note.account_id, &note.description],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(plan.postings.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::allocate;
    use crate::import::rules::{PayeeRule, PayeeRuleSet};

    fn ruleset() -> PayeeRuleSet {
        PayeeRuleSet::from_rules(vec![PayeeRule {
            payee_contains: "Coffee".to_string(),
            account_id: 7,
            account_name: "Dining".to_string(),
        }])
    }

    #[test]
    fn matched_rule_produces_balancing_leg() {
        let plan = allocate(&ruleset(), 1, -5000, "Coffee Shop");
        assert!(plan.is_ok());
        if let Ok(plan) = plan {
            assert_eq!(plan.postings.len(), 2);
            assert_eq!(plan.postings[0].amount + plan.postings[1].amount, 0);
            assert_eq!(plan.postings[1].account_id, 7);
            assert_eq!(
                plan.note.map(|note| note.description),
                Some("payee contained 'Coffee'".to_string())
            );
        }
    }

    #[test]
    fn unmatched_payee_stays_single_sided() {
        let plan = allocate(&ruleset(), 1, -5000, "Hardware Store");
        assert!(plan.is_ok());
        if let Ok(plan) = plan {
            assert_eq!(plan.postings.len(), 1);
            assert!(plan.note.is_none());
        }
    }
}
