use clap::{Parser, Subcommand};

pub fn parse_divisor(value: &str) -> Result<i64, String> {
    let parsed = value
        .parse::<i64>()
        .map_err(|_| "divisor must be a positive integer".to_string())?;
    if parsed <= 0 {
        return Err("divisor must be a positive integer".to_string());
    }
    Ok(parsed)
}

/// Extended help shown after `farthing import create --help`.
/// Contains the statement format and the pre-import workflow.
pub const IMPORT_CREATE_AFTER_HELP: &str = "\
How import works:
  Farthing does not parse raw bank PDFs, OFX, or provider-specific CSVs.
  You parse each statement into a normalized JSON document, then import it.

  <path> is a local statement file or a directory of statement files.
  Directories are expanded in sorted filename order.
  Each statement is committed all-or-nothing: either every transaction
  and the closing balance assertion land, or none do.

What to do next:
  1. Create internal accounts: `farthing account create Checking`.
  2. Map each bank account id: `farthing account map 12345678 Checking`.
  3. Optionally add categorization rules: `farthing rule payee create Coffee Dining`.
  4. Run `farthing import create <path>`; reimporting the same statement
     is always a safe no-op.

Statement schema (one JSON object per file):
  {
    \"external_account_id\": \"12345678\",
    \"currency\": \"USD\",
    \"balance\": 450.00,
    \"balance_date\": \"2026-01-31\",
    \"transactions\": [
      {
        \"id\": \"txn-20260115-001\",
        \"date\": \"2026-01-15\",
        \"payee\": \"Coffee Shop\",
        \"memo\": \"card 1234\",
        \"amount\": -50.00
      }
    ]
  }

Field rules (very explicit):
  external_account_id (required):
    The bank's stable account identifier, exactly as your source gives it.
    Must be mapped with `farthing account map` before it will import.

  currency (optional, default USD):
    Name of a registered currency. Register others first with
    `farthing currency create <name> <divisor>`.

  balance (required):
    The statement's closing balance as a decimal number.

  balance_date (required):
    Date of the closing balance, exactly `YYYY-MM-DD`.

  transactions[].id (required):
    The bank's transaction identifier. Imports are deduplicated on this
    value per account, so keep it exactly as given.

  transactions[].date (required):
    Posting date, exactly `YYYY-MM-DD`.

  transactions[].payee (required):
    Raw payee text from the source. Payee rules match against this.

  transactions[].memo (optional):
    Free-form memo text. Transfer rules use it to pair the two legs of
    the same transfer across statements.

  transactions[].amount (required):
    A number, not text. Negative = money out, positive = money in.
    Use at most the currency's minor-unit precision (2 decimal places
    for USD).
";

#[derive(Debug, Parser)]
#[command(
    name = "farthing",
    version,
    about = "double-entry ledger with idempotent statement import",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage internal accounts and external account mappings
    #[command(arg_required_else_help = true)]
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Manage registered currencies and their minor-unit divisors
    #[command(arg_required_else_help = true)]
    Currency {
        #[command(subcommand)]
        command: CurrencyCommand,
    },
    /// Import normalized statement files into the ledger
    #[command(arg_required_else_help = true)]
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
    /// Manage categorization and transfer-matching rules
    #[command(arg_required_else_help = true)]
    Rule {
        #[command(subcommand)]
        command: RuleCommand,
    },
    /// Recompute every balance assertion against the postings in the ledger
    Reconcile {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List transactions with their postings, notes, and balance status
    Transactions {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AccountCommand {
    /// Create an internal account
    Create {
        /// Account name (e.g. Checking, Dining)
        name: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List accounts with per-currency balances
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Map an external bank account id to an internal account
    Map {
        /// The bank's account identifier, exactly as statements carry it
        external_id: String,
        /// Name of an existing internal account
        account: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List external-to-internal account mappings
    Mappings {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CurrencyCommand {
    /// Register a currency with its minor-unit divisor
    Create {
        /// Currency name (e.g. USD, JPY)
        name: String,
        /// Minor units per major unit (e.g. 100 for cents)
        #[arg(value_parser = parse_divisor)]
        divisor: i64,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List registered currencies
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ImportCommand {
    /// Import one or more normalized statement files
    #[command(after_long_help = IMPORT_CREATE_AFTER_HELP)]
    Create {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
        /// Statement files or directories of statement files
        #[arg(required = true)]
        path: Vec<String>,
    },
    /// List past import runs, newest first
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RuleCommand {
    /// Payee substring rules that categorize transactions on import
    #[command(arg_required_else_help = true)]
    Payee {
        #[command(subcommand)]
        command: PayeeRuleCommand,
    },
    /// Payee prefix rules that merge transfer legs into one transaction
    #[command(arg_required_else_help = true)]
    Transfer {
        #[command(subcommand)]
        command: TransferRuleCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PayeeRuleCommand {
    /// Create a payee rule: payees containing the substring post to the account
    Create {
        /// Case-sensitive substring matched against statement payees
        payee_contains: String,
        /// Name of the existing account the counter-posting goes to
        account: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List payee rules
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TransferRuleCommand {
    /// Create a transfer rule: payees starting with the prefix reuse by memo
    Create {
        /// Case-sensitive payee prefix that marks a transfer leg
        payee_prefix: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List transfer rules
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
