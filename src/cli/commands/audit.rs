use crate::cli::commands::{ledger::parse_movement_id, CommandDefinition};
use crate::cli::core::{required, split_flags, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "syslog",
            "Show the system log, or clear it (administrators only)",
            "syslog [--limit <n>] | syslog clear",
            cmd_syslog,
        ),
        CommandDefinition::new(
            "forget",
            "Delete a movement log entry without touching the ledger (administrators only)",
            "forget <movement-id>",
            cmd_forget,
        ),
    ]
}

fn cmd_syslog(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args
        .first()
        .is_some_and(|arg| arg.eq_ignore_ascii_case("clear"))
    {
        let removed = context.session.clear_system_log()?;
        io::print_success(format!("System log cleared ({removed} entries)."));
        return Ok(());
    }

    let (_, flags) = split_flags(args)?;
    let mut limit = usize::MAX;
    for (flag, value) in flags {
        match flag {
            "limit" => {
                limit = value.parse().map_err(|_| {
                    CommandError::InvalidArguments(format!("invalid limit `{value}`"))
                })?
            }
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }

    let entries = context.session.system_log()?;
    output_section("System log");
    for entry in entries.iter().take(limit) {
        io::print_info(format!(
            "  #{:<5} {} {:<20} {} ({})",
            entry.id,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.action,
            entry.detail,
            entry
                .actor
                .as_ref()
                .map(|actor| actor.username.as_str())
                .unwrap_or("system")
        ));
    }
    Ok(())
}

fn cmd_forget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = parse_movement_id(required(args, 0, "movement-id")?)?;
    let removed = context.session.delete_movement_log(id)?;
    io::print_success(format!(
        "Movement {} removed from the log ({}).",
        removed.id, removed.detail
    ));
    Ok(())
}
