use std::path::PathBuf;

use tally_domain::{RangeMode, RowOrder, TotalsStyle};

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{required, split_flags, CommandError, CommandResult, ShellContext};
use crate::cli::io;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "export",
        "Write a period range with a TOTAL row to a CSV spreadsheet",
        "export <start> <end> [file] [--range insertion|chronological] [--order insertion|chronological] [--totals values|formulas]",
        cmd_export,
    )]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, flags) = split_flags(args)?;
    let start = required(&positional, 0, "start")?;
    let end = required(&positional, 1, "end")?;

    let mut options = context.session.default_export_options();
    let mut style = context.config().export.totals_style;
    for (flag, value) in flags {
        match flag {
            "range" => options.range = parse_flag::<RangeMode>(value)?,
            "order" => options.order = parse_flag::<RowOrder>(value)?,
            "totals" => style = parse_flag::<TotalsStyle>(value)?,
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }

    let path = match positional.get(2) {
        Some(file) => PathBuf::from(file),
        None => context
            .session
            .data_root()
            .join("exports")
            .join(&context.config().export.file_name),
    };

    let rows = context
        .session
        .export_to_path(start, end, &path, options, style)?;
    io::print_success(format!(
        "Exported {} period(s) from {} to {} into {}",
        rows,
        start,
        end,
        path.display()
    ));
    Ok(())
}

fn parse_flag<T>(value: &str) -> Result<T, CommandError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))
}
