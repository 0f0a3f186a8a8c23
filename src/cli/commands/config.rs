use tally_config::Config;
use tally_domain::{NetIncomePolicy, RangeMode, RowOrder, TotalsStyle};

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{required, CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{self, section as output_section, OutputPreferences};
use crate::errors::TallyError;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "config",
            "View and change preferences",
            "config [show|set <key> <value>|backup [note]|backups|restore <name>]",
            cmd_config,
        ),
        CommandDefinition::new(
            "backup",
            "Snapshot, list or restore the book",
            "backup [create [note]|list|restore <name>]",
            cmd_backup,
        ),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|arg| arg.to_lowercase());
    match action.as_deref() {
        None | Some("show") => show_config(context.config()),
        Some("set") => {
            let key = required(args, 1, "key")?;
            let value = args[2..].join(" ");
            if value.trim().is_empty() {
                return Err(CommandError::InvalidArguments("missing <value>".into()));
            }
            let config = context
                .config_manager
                .update(|config| apply_setting(config, key, value.trim()))
                .map_err(TallyError::from)??;
            output::set_preferences(OutputPreferences {
                color_enabled: config.ui_color_enabled
                    && context.mode == CliMode::Interactive,
                quiet_mode: false,
            });
            context.session.set_config(config);
            io::print_success(format!("Configuration `{key}` updated."));
            Ok(())
        }
        Some("backup") => {
            let note = args.get(1..).map(|rest| rest.join(" "));
            let name = context
                .config_manager
                .backup(context.config(), note.as_deref())
                .map_err(TallyError::from)?;
            io::print_success(format!("Configuration backup `{name}` written."));
            Ok(())
        }
        Some("backups") => {
            let backups = context
                .config_manager
                .list_backups()
                .map_err(TallyError::from)?;
            if backups.is_empty() {
                io::print_info("No configuration backups.");
            }
            for backup in backups {
                match backup.created_at {
                    Some(at) => io::print_info(format!(
                        "  {} ({})",
                        backup.name,
                        at.format("%Y-%m-%d %H:%M:%S")
                    )),
                    None => io::print_info(format!("  {}", backup.name)),
                }
            }
            Ok(())
        }
        Some("restore") => {
            let name = required(args, 1, "name")?;
            let config = context
                .config_manager
                .restore(name)
                .map_err(TallyError::from)?;
            context.session.set_config(config);
            io::print_success(format!("Configuration restored from `{name}`."));
            Ok(())
        }
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{other}`"
        ))),
    }
}

fn show_config(config: &Config) -> CommandResult {
    output_section("Configuration");
    io::print_info(format!("  locale             : {}", config.locale));
    io::print_info(format!("  currency           : {}", config.currency));
    io::print_info(format!("  net_income_policy  : {}", config.net_income_policy));
    io::print_info(format!("  export.range       : {}", config.export.range));
    io::print_info(format!("  export.order       : {}", config.export.order));
    io::print_info(format!("  export.totals_style: {}", config.export.totals_style));
    io::print_info(format!("  export.file_name   : {}", config.export.file_name));
    io::print_info(format!("  backup_retention   : {}", config.backup_retention));
    io::print_info(format!("  ui_color_enabled   : {}", config.ui_color_enabled));
    io::print_info(format!(
        "  data_root          : {}",
        config.resolve_data_root().display()
    ));
    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<(), CommandError> {
    match key.to_lowercase().as_str() {
        "locale" => config.locale = value.into(),
        "currency" => config.currency = value.to_uppercase(),
        "net_income_policy" => {
            config.net_income_policy = value
                .parse::<NetIncomePolicy>()
                .map_err(invalid)?
        }
        "export.range" => {
            config.export.range = value.parse::<RangeMode>().map_err(invalid)?
        }
        "export.order" => {
            config.export.order = value.parse::<RowOrder>().map_err(invalid)?
        }
        "export.totals_style" => {
            config.export.totals_style =
                value.parse::<TotalsStyle>().map_err(invalid)?
        }
        "export.file_name" => config.export.file_name = value.into(),
        "backup_retention" => {
            config.backup_retention = value
                .parse::<usize>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!("invalid retention `{value}`"))
                })?
        }
        "ui_color_enabled" => {
            config.ui_color_enabled = value.parse::<bool>().map_err(invalid)?
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown configuration key `{other}`"
            )))
        }
    }
    Ok(())
}

fn invalid(err: impl std::fmt::Display) -> CommandError {
    CommandError::InvalidArguments(err.to_string())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|arg| arg.to_lowercase());
    match action.as_deref() {
        None | Some("list") => {
            let backups = context.session.backups()?;
            if backups.is_empty() {
                io::print_info("No backups yet.");
            }
            for backup in backups {
                io::print_info(format!("  {} ({} bytes)", backup.id, backup.size_bytes));
            }
            Ok(())
        }
        Some("create") => {
            let note = args.get(1..).map(|rest| rest.join(" "));
            let info = context.session.backup(note.as_deref())?;
            io::print_success(format!("Backup `{}` written.", info.id));
            Ok(())
        }
        Some("restore") => {
            let name = required(args, 1, "name")?;
            context.session.restore_backup(name)?;
            io::print_success(format!("Book restored from `{name}`."));
            Ok(())
        }
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown backup action `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_into_typed_fields() {
        let mut config = Config::default();
        apply_setting(&mut config, "net_income_policy", "on-add").expect("policy");
        apply_setting(&mut config, "export.range", "chronological").expect("range");
        apply_setting(&mut config, "backup_retention", "3").expect("retention");

        assert_eq!(config.net_income_policy, NetIncomePolicy::OnAdd);
        assert_eq!(config.export.range, RangeMode::Chronological);
        assert_eq!(config.backup_retention, 3);
        assert!(apply_setting(&mut config, "backup_retention", "0").is_err());
        assert!(apply_setting(&mut config, "theme", "dark").is_err());
    }
}
