use farthing_client::commands;
use farthing_client::{ClientResult, SuccessEnvelope};

use crate::cli::{
    AccountCommand, Cli, Commands, CurrencyCommand, ImportCommand, PayeeRuleCommand, RuleCommand,
    TransferRuleCommand,
};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Account { command } => match command {
            AccountCommand::Create { name, .. } => commands::account::create(name),
            AccountCommand::List { .. } => commands::account::list(),
            AccountCommand::Map {
                external_id,
                account,
                ..
            } => commands::account::map(external_id, account),
            AccountCommand::Mappings { .. } => commands::account::mappings(),
        },
        Commands::Currency { command } => match command {
            CurrencyCommand::Create { name, divisor, .. } => {
                commands::currency::create(name, *divisor)
            }
            CurrencyCommand::List { .. } => commands::currency::list(),
        },
        Commands::Import { command } => match command {
            ImportCommand::Create { path, .. } => commands::import::run(path.clone()),
            ImportCommand::List { .. } => commands::import::list(),
        },
        Commands::Rule { command } => match command {
            RuleCommand::Payee { command } => match command {
                PayeeRuleCommand::Create {
                    payee_contains,
                    account,
                    ..
                } => commands::rule::payee_create(payee_contains, account),
                PayeeRuleCommand::List { .. } => commands::rule::payee_list(),
            },
            RuleCommand::Transfer { command } => match command {
                TransferRuleCommand::Create { payee_prefix, .. } => {
                    commands::rule::transfer_create(payee_prefix)
                }
                TransferRuleCommand::List { .. } => commands::rule::transfer_list(),
            },
        },
        Commands::Reconcile { .. } => commands::reconcile::run(),
        Commands::Transactions { .. } => commands::transactions::list(),
    }
}
