use crate::cli::{
    AccountCommand, Commands, CurrencyCommand, ImportCommand, PayeeRuleCommand, RuleCommand,
    TransferRuleCommand,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

fn mode_for_flag(json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    match command {
        Commands::Account { command } => match command {
            AccountCommand::Create { json, .. }
            | AccountCommand::List { json }
            | AccountCommand::Map { json, .. }
            | AccountCommand::Mappings { json } => mode_for_flag(*json),
        },
        Commands::Currency { command } => match command {
            CurrencyCommand::Create { json, .. } | CurrencyCommand::List { json } => {
                mode_for_flag(*json)
            }
        },
        Commands::Import { command } => match command {
            ImportCommand::Create { json, .. } | ImportCommand::List { json } => {
                mode_for_flag(*json)
            }
        },
        Commands::Rule { command } => match command {
            RuleCommand::Payee { command } => match command {
                PayeeRuleCommand::Create { json, .. } | PayeeRuleCommand::List { json } => {
                    mode_for_flag(*json)
                }
            },
            RuleCommand::Transfer { command } => match command {
                TransferRuleCommand::Create { json, .. } | TransferRuleCommand::List { json } => {
                    mode_for_flag(*json)
                }
            },
        },
        Commands::Reconcile { json } | Commands::Transactions { json } => mode_for_flag(*json),
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputMode, mode_for_command};
    use crate::cli::parse_from;

    #[test]
    fn mode_uses_json_when_flag_is_present() {
        let cases: [&[&str]; 6] = [
            &["farthing", "account", "list", "--json"],
            &["farthing", "currency", "list", "--json"],
            &["farthing", "import", "create", "rows.json", "--json"],
            &["farthing", "rule", "payee", "list", "--json"],
            &["farthing", "reconcile", "--json"],
            &["farthing", "transactions", "--json"],
        ];

        for args in cases {
            let parsed = parse_from(args.iter().copied());
            assert!(parsed.is_ok(), "failed to parse: {args:?}");
            if let Ok(cli) = parsed {
                assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
            }
        }
    }

    #[test]
    fn mode_defaults_to_text() {
        let cases: [&[&str]; 4] = [
            &["farthing", "account", "list"],
            &["farthing", "import", "create", "rows.json"],
            &["farthing", "rule", "transfer", "create", "Autosave"],
            &["farthing", "transactions"],
        ];

        for args in cases {
            let parsed = parse_from(args.iter().copied());
            assert!(parsed.is_ok(), "failed to parse: {args:?}");
            if let Ok(cli) = parsed {
                assert_eq!(mode_for_command(&cli.command), OutputMode::Text);
            }
        }
    }
}
