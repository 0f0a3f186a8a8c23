use tally_domain::{Category, LedgerRecord, MovementFilter, MovementId, MovementKind, RowOrder};

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{amount_arg, required, split_flags, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "add",
            "Add an amount to a category of a period (creates the period)",
            "add <period> <category> <amount>",
            cmd_add,
        ),
        CommandDefinition::new(
            "set",
            "Overwrite a category amount of an existing period",
            "set <period> <category> <value>",
            cmd_set,
        ),
        CommandDefinition::new(
            "note",
            "Set or clear the notes of a period",
            "note <period> [text]",
            cmd_note,
        ),
        CommandDefinition::new("delete", "Delete a period", "delete <period>", cmd_delete),
        CommandDefinition::new(
            "reverse",
            "Undo an `add` movement (administrators only)",
            "reverse <movement-id>",
            cmd_reverse,
        ),
        CommandDefinition::new(
            "records",
            "List periods with totals",
            "records [--order insertion|chronological]",
            cmd_records,
        ),
        CommandDefinition::new("show", "Show every amount of a period", "show <period>", cmd_show),
        CommandDefinition::new("periods", "List period labels", "periods", cmd_periods),
        CommandDefinition::new(
            "movements",
            "Show the movement log, newest first",
            "movements [--period <period>] [--kind add|edit|delete] [--limit <n>]",
            cmd_movements,
        ),
        CommandDefinition::new(
            "categories",
            "List category keys",
            "categories",
            cmd_categories,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = required(args, 0, "period")?;
    let category = required(args, 1, "category")?;
    let amount = amount_arg(required(args, 2, "amount")?)?;
    let record = context.session.apply_delta(period, category, amount)?;
    io::print_success(summary(&record));
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = required(args, 0, "period")?;
    let category = required(args, 1, "category")?;
    let value = amount_arg(required(args, 2, "value")?)?;
    let record = context.session.set_field(period, category, value)?;
    io::print_success(summary(&record));
    Ok(())
}

fn cmd_note(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = required(args, 0, "period")?;
    let text = args[1..].join(" ");
    let notes = Some(text).filter(|text| !text.trim().is_empty());
    let record = context.session.set_notes(period, notes)?;
    match record.notes {
        Some(_) => io::print_success(format!("Notes of {} updated.", record.period)),
        None => io::print_success(format!("Notes of {} cleared.", record.period)),
    }
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = required(args, 0, "period")?;
    let record = context.session.delete_record(period)?;
    io::print_success(format!("Period {} deleted.", record.period));
    Ok(())
}

fn cmd_reverse(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let raw = required(args, 0, "movement-id")?;
    let id = parse_movement_id(raw)?;
    let reversal = context.session.reverse_movement(id)?;
    match reversal.record {
        Some(record) => io::print_success(format!(
            "Movement {} reversed. {}",
            reversal.movement.id,
            summary(&record)
        )),
        None => io::print_warning(format!(
            "Movement {} removed; period {} no longer exists.",
            reversal.movement.id, reversal.movement.period
        )),
    }
    Ok(())
}

fn cmd_records(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (_, flags) = split_flags(args)?;
    let mut order = context.config().export.order;
    for (flag, value) in flags {
        match flag {
            "order" => {
                order = value
                    .parse::<RowOrder>()
                    .map_err(|err| CommandError::InvalidArguments(err.to_string()))?
            }
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }

    let records = context.session.records(order)?;
    if records.is_empty() {
        io::print_info("No records yet.");
        return Ok(());
    }
    output_section("Records");
    io::print_info(format!(
        "  {:<10} {:>16} {:>16} {:>16}",
        "Period", "Total", "Actual", "Difference"
    ));
    for record in records {
        io::print_info(format!(
            "  {:<10} {:>16.2} {:>16.2} {:>16.2}",
            record.period,
            record.total(),
            record.actual_income_vs_invoiced,
            record.reconciliation_difference
        ));
    }
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = required(args, 0, "period")?;
    let record = context.session.record(period)?;
    output_section(format!("Period {}", record.period));
    for category in Category::ALL {
        io::print_info(format!(
            "  {:<38} {:>16.2}",
            category.key(),
            record.amount(category)
        ));
    }
    io::print_info(format!("  {:<38} {:>16.2}", "total", record.total()));
    io::print_info(format!(
        "  {:<38} {:>16.2}",
        "reconciliation_difference", record.reconciliation_difference
    ));
    if let Some(notes) = &record.notes {
        io::print_info(format!("  notes: {notes}"));
    }
    Ok(())
}

fn cmd_periods(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let periods = context.session.periods()?;
    if periods.is_empty() {
        io::print_info("No periods yet.");
    } else {
        io::print_info(periods.join(", "));
    }
    Ok(())
}

fn cmd_movements(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (_, flags) = split_flags(args)?;
    let mut filter = MovementFilter::default();
    let mut limit = None;
    for (flag, value) in flags {
        match flag {
            "period" => filter.period = Some(value.to_string()),
            "kind" => {
                filter.kind = Some(
                    value
                        .parse::<MovementKind>()
                        .map_err(|err| CommandError::InvalidArguments(err.to_string()))?,
                )
            }
            "limit" => {
                limit = Some(value.parse::<usize>().map_err(|_| {
                    CommandError::InvalidArguments(format!("invalid limit `{value}`"))
                })?)
            }
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }

    let movements = context.session.movements(&filter)?;
    if movements.is_empty() {
        io::print_info("No movements.");
        return Ok(());
    }
    output_section("Movements");
    for movement in movements.iter().take(limit.unwrap_or(usize::MAX)) {
        io::print_info(format!(
            "  #{:<5} {} {:<6} {:<10} {} ({})",
            movement.id,
            movement.timestamp.format("%Y-%m-%d %H:%M"),
            movement.kind.to_string(),
            movement.period,
            movement.detail,
            movement.actor
        ));
    }
    Ok(())
}

fn cmd_categories(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Categories");
    for category in Category::ALL {
        io::print_info(format!("  {:<38} {}", category.key(), category.label()));
    }
    Ok(())
}

pub(crate) fn parse_movement_id(raw: &str) -> Result<MovementId, CommandError> {
    raw.trim()
        .trim_start_matches('#')
        .parse::<u64>()
        .map(MovementId)
        .map_err(|_| CommandError::InvalidArguments(format!("invalid movement id `{raw}`")))
}

fn summary(record: &LedgerRecord) -> String {
    format!(
        "{}: total {:.2}, actual {:.2}, difference {:.2}",
        record.period,
        record.total(),
        record.actual_income_vs_invoiced,
        record.reconciliation_difference
    )
}
