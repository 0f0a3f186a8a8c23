//! Core CLI loop state, dispatch, and shared argument helpers.

use std::io;

use rust_decimal::Decimal;
use strsim::levenshtein;
use tally_config::{default_data_root, Config, ConfigManager};
use tally_core::{validate::parse_amount, CoreError};

use crate::cli::commands::{self, CommandDefinition, CommandRegistry};
use crate::cli::io as cli_io;
use crate::cli::output::{self, OutputPreferences};
use crate::errors::{CliError, TallyError};
use crate::session::TallySession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub session: TallySession,
    pub config_manager: ConfigManager,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(default_data_root())
            .map_err(TallyError::from)?;
        let config = config_manager.load().map_err(TallyError::from)?;
        let session = TallySession::open(config)?;
        Ok(Self::with_session(mode, session, config_manager))
    }

    pub fn with_session(mode: CliMode, session: TallySession, config_manager: ConfigManager) -> Self {
        output::set_preferences(OutputPreferences {
            color_enabled: session.config().ui_color_enabled && mode == CliMode::Interactive,
            quiet_mode: false,
        });
        Self {
            mode,
            registry: CommandRegistry::new(commands::all_groups()),
            session,
            config_manager,
            last_command: None,
            running: true,
        }
    }

    pub(crate) fn config(&self) -> &Config {
        self.session.config()
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        match self.session.current_user() {
            Ok(user) => format!("tally({})> ", user.username),
            Err(_) => "tally> ".into(),
        }
    }

    /// Prints the session banner and any consistency warnings for the book.
    pub(crate) fn greet(&self) -> Result<(), CliError> {
        if self.mode == CliMode::Interactive {
            output::section("Tally");
            cli_io::print_info(format!(
                "Data directory: {}",
                self.session.data_root().display()
            ));
        }
        if self.session.needs_bootstrap()? {
            cli_io::print_info("No users yet. Create the first administrator with `bootstrap`.");
        }
        for warning in self.session.warnings()? {
            cli_io::print_warning(warning);
        }
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|entry| entry.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &input.to_lowercase()), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action("Exit shell?").map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_info("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Tally(TallyError::Core(CoreError::PermissionDenied(message))) => {
                cli_io::print_error(format!("Permission denied: {message}"));
                if !self.session.is_logged_in() {
                    cli_io::print_info("Log in first with `login <username>`.");
                }
                Ok(())
            }
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    /// Password from the argument list, or prompted for in interactive mode.
    pub(crate) fn password_arg(&self, arg: Option<&str>, prompt: &str) -> Result<String, CommandError> {
        match arg {
            Some(value) => Ok(value.to_string()),
            None if self.mode == CliMode::Interactive => cli_io::prompt_password(prompt),
            None => Err(CommandError::InvalidArguments(format!(
                "{prompt} is required in script mode"
            ))),
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        crate::cli::shell::handle_line(self, line)
    }
}

/// Required positional argument.
pub(crate) fn required<'a>(args: &[&'a str], index: usize, name: &str) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("missing <{name}>")))
}

pub(crate) fn amount_arg(raw: &str) -> Result<Decimal, CommandError> {
    parse_amount(raw).map_err(|err| CommandError::Tally(err.into()))
}

/// Splits `--flag value` pairs from positional arguments.
pub(crate) fn split_flags<'a>(
    args: &[&'a str],
) -> Result<(Vec<&'a str>, Vec<(&'a str, &'a str)>), CommandError> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(name) = arg.strip_prefix("--") {
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("flag --{name} needs a value"))
            })?;
            flags.push((name, *value));
        } else {
            positional.push(*arg);
        }
    }
    Ok((positional, flags))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Tally(#[from] TallyError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        CommandError::Tally(TallyError::Core(err))
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Tally(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(context: &mut ShellContext, lines: &[&str]) -> Result<(), CliError> {
    for line in lines {
        match context.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_domain::RowOrder;
    use tempfile::tempdir;

    fn context() -> (ShellContext, tempfile::TempDir) {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        let session = TallySession::in_memory(Config::default());
        (ShellContext::with_session(CliMode::Script, session, manager), dir)
    }

    #[test]
    fn parse_line_handles_quotes() {
        let tokens = crate::cli::shell::tokenize("note Jan-25 \"late bank feed\"")
            .expect("tokens");
        assert_eq!(tokens, vec!["note", "Jan-25", "late bank feed"]);
    }

    #[test]
    fn script_runner_records_movements() {
        let (mut context, _dir) = context();
        process_script(
            &mut context,
            &[
                "bootstrap admin admin@example.com \"correct horse\"",
                "add Jan-25 sanciones 100",
                "add Jan-25 sanciones -40",
                "exit",
                "add Jan-25 sanciones 1000",
            ],
        )
        .expect("script");

        let records = context.session.records(RowOrder::Insertion).expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sanctions, dec!(60));
    }

    #[test]
    fn failed_commands_surface_as_errors() {
        let (mut context, _dir) = context();
        let err = context.process_line("add Jan-25 sanciones 10").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Tally(TallyError::Core(CoreError::PermissionDenied(_)))
        ));

        let err = context.process_line("add Jan-25").unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));
    }

    #[test]
    fn unknown_commands_continue_the_loop() {
        let (mut context, _dir) = context();
        let control = context.process_line("recrods").expect("continue");
        assert_eq!(control, LoopControl::Continue);
    }

    #[test]
    fn flags_are_split_from_positionals() {
        let (positional, flags) =
            split_flags(&["Jan-25", "--range", "chronological", "Mar-25"]).expect("split");
        assert_eq!(positional, vec!["Jan-25", "Mar-25"]);
        assert_eq!(flags, vec![("range", "chronological")]);
        assert!(split_flags(&["--order"]).is_err());
    }
}
