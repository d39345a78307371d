use serde::Serialize;

/// Outcome of one statement within an import run.
#[derive(Debug, Clone, Serialize)]
pub struct StatementOutcome {
    pub path: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub transactions_created: i64,
    pub transactions_reused: i64,
    pub transactions_skipped: i64,
    pub postings_written: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl StatementOutcome {
    pub const STATUS_IMPORTED: &'static str = "imported";
    pub const STATUS_ALREADY_IMPORTED: &'static str = "already_imported";
    pub const STATUS_UNMAPPED_ACCOUNT: &'static str = "skipped_unmapped_account";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportTotals {
    pub statements_read: i64,
    pub statements_imported: i64,
    pub statements_skipped: i64,
    pub transactions_created: i64,
    pub transactions_reused: i64,
    pub transactions_skipped: i64,
    pub postings_written: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRunData {
    pub run_id: String,
    pub statements: Vec<StatementOutcome>,
    pub totals: ImportTotals,
    /// Transactions whose postings do not sum to zero. Single-leg entries
    /// awaiting manual categorization land here.
    pub unbalanced_transactions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRunRow {
    pub run_id: String,
    pub created_at: String,
    pub statements_read: i64,
    pub statements_imported: i64,
    pub statements_skipped: i64,
    pub transactions_created: i64,
    pub transactions_reused: i64,
    pub transactions_skipped: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListData {
    pub rows: Vec<ImportRunRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountCreateData {
    pub account_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceRow {
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Sum of posting amounts in minor units; absent for accounts with no
    /// postings yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_minor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountListData {
    pub rows: Vec<BalanceRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountMapData {
    pub external_id: String,
    pub account: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountMappingRow {
    pub external_id: String,
    pub account: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountMappingsData {
    pub rows: Vec<AccountMappingRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyRow {
    pub name: String,
    pub divisor: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyListData {
    pub rows: Vec<CurrencyRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayeeRuleRow {
    pub payee_contains: String,
    pub account: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayeeRuleListData {
    pub rows: Vec<PayeeRuleRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferRuleRow {
    pub payee_prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferRuleListData {
    pub rows: Vec<TransferRuleRow>,
}

/// One balance assertion whose recomputed posting sum disagrees with the
/// asserted balance. All amounts are minor units.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationRow {
    pub date: String,
    pub account: String,
    pub currency: String,
    pub expected: i64,
    pub actual: i64,
    pub difference: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileData {
    pub assertions_checked: i64,
    pub mismatches: Vec<ReconciliationRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostingRow {
    pub account: String,
    pub amount_minor: i64,
    pub currency: String,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub txn_id: i64,
    pub date: String,
    pub balanced: bool,
    pub notes: Vec<String>,
    pub postings: Vec<PostingRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionListData {
    pub unbalanced_count: i64,
    pub rows: Vec<TransactionRow>,
}
