use std::path::Path;

use rusqlite::Connection;

use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub(crate) struct PayeeRule {
    pub(crate) payee_contains: String,
    pub(crate) account_id: i64,
    pub(crate) account_name: String,
}

/// Import-time categorization rules: case-sensitive substring containment
/// against the transaction's payee text. Rule sets are expected to be
/// mutually exclusive; an ambiguous match is a configuration defect, not a
/// data condition, and fails the whole run.
#[derive(Debug, Clone)]
pub(crate) struct PayeeRuleSet {
    rules: Vec<PayeeRule>,
}

impl PayeeRuleSet {
    pub(crate) fn load(connection: &Connection, db_path: &Path) -> ClientResult<Self> {
        let mut statement = connection
            .prepare(
                "SELECT rule.payee_contains, rule.account_id, account.name
                 FROM payee_rule AS rule
                 JOIN account ON account.id = rule.account_id
                 ORDER BY rule.payee_contains",
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        let rule_iter = statement
            .query_map([], |row| {
                Ok(PayeeRule {
                    payee_contains: row.get(0)?,
                    account_id: row.get(1)?,
                    account_name: row.get(2)?,
                })
            })
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        let mut rules = Vec::new();
        for rule in rule_iter {
            rules.push(rule.map_err(|error| map_sqlite_error(db_path, &error))?);
        }

        Ok(Self { rules })
    }

    #[cfg(test)]
    pub(crate) fn from_rules(rules: Vec<PayeeRule>) -> Self {
        Self { rules }
    }

    /// Zero matches leaves the transaction single-sided for manual
    /// categorization; exactly one match names the counter-account.
    pub(crate) fn match_payee(&self, payee: &str) -> ClientResult<Option<&PayeeRule>> {
        let matched = self
            .rules
            .iter()
            .filter(|rule| payee.contains(&rule.payee_contains))
            .collect::<Vec<&PayeeRule>>();

        match matched.as_slice() {
            [] => Ok(None),
            [rule] => Ok(Some(rule)),
            rules => {
                let pairs = rules
                    .iter()
                    .map(|rule| (rule.payee_contains.clone(), rule.account_name.clone()))
                    .collect::<Vec<(String, String)>>();
                Err(ClientError::ambiguous_payee_rule(payee, &pairs))
            }
        }
    }
}

/// Recognizes the legs of a recurring internal transfer that statements
/// report as separate transactions. A payee starting with a configured
/// prefix, together with a memo, marks a leg whose memo is the lookup key
/// into existing transaction notes.
#[derive(Debug, Clone)]
pub(crate) struct TransferMatcher {
    prefixes: Vec<String>,
}

impl TransferMatcher {
    pub(crate) fn load(connection: &Connection, db_path: &Path) -> ClientResult<Self> {
        let mut statement = connection
            .prepare("SELECT payee_prefix FROM transfer_match_rule ORDER BY payee_prefix")
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        let prefix_iter = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|error| map_sqlite_error(db_path, &error))?;

        let mut prefixes = Vec::new();
        for prefix in prefix_iter {
            prefixes.push(prefix.map_err(|error| map_sqlite_error(db_path, &error))?);
        }

        Ok(Self { prefixes })
    }

    #[cfg(test)]
    pub(crate) fn from_prefixes(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    pub(crate) fn reuse_key<'a>(&self, payee: &str, memo: Option<&'a str>) -> Option<&'a str> {
        let memo = memo.filter(|value| !value.is_empty())?;
        if self
            .prefixes
            .iter()
            .any(|prefix| payee.starts_with(prefix.as_str()))
        {
            return Some(memo);
        }
        None
    }
}
