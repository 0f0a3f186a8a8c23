use std::{
    borrow::Cow,
    io::{self, BufRead, StdinLock},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use tally_domain::Category;

use crate::cli::core::{CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::io as cli_io;
use crate::errors::CliError;

/// Presence of this variable switches the shell to reading commands from stdin.
pub const SCRIPT_ENV: &str = "TALLY_CLI_SCRIPT";

const CATEGORY_COMMANDS: [&str; 2] = ["add", "set"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = match std::env::var_os(SCRIPT_ENV) {
        Some(_) => CliMode::Script,
        None => CliMode::Interactive,
    };

    let mut context = ShellContext::new(mode)?;
    context.greet()?;

    match mode {
        CliMode::Interactive => {
            let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
            editor.set_helper(Some(CommandHelper::new(context.command_names())));
            editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
            drive(&mut context, &mut Prompted(editor))
        }
        CliMode::Script => drive(&mut context, &mut Piped(io::stdin().lock())),
    }
}

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

trait LineSource {
    fn next_line(&mut self, prompt: &str) -> Result<Input, CliError>;
}

struct Prompted(Editor<CommandHelper, DefaultHistory>);

impl LineSource for Prompted {
    fn next_line(&mut self, prompt: &str) -> Result<Input, CliError> {
        match self.0.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.0.add_history_entry(line.trim()).ok();
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => {
                cli_io::print_info("Exiting shell.");
                Ok(Input::Closed)
            }
            Err(err) => Err(err.into()),
        }
    }
}

struct Piped<'a>(StdinLock<'a>);

impl LineSource for Piped<'_> {
    fn next_line(&mut self, _prompt: &str) -> Result<Input, CliError> {
        let mut line = String::new();
        if self.0.read_line(&mut line)? == 0 {
            return Ok(Input::Closed);
        }
        // `#` starts a comment line in scripts.
        if line.trim_start().starts_with('#') {
            line.clear();
        }
        Ok(Input::Line(line))
    }
}

fn drive(context: &mut ShellContext, source: &mut impl LineSource) -> Result<(), CliError> {
    while context.running {
        let line = match source.next_line(&context.prompt())? {
            Input::Line(line) => line,
            Input::Interrupted if context.confirm_exit()? => break,
            Input::Interrupted => continue,
            Input::Closed => break,
        };
        if let Err(err) = handle_line(context, line.trim()) {
            context.report_error(err)?;
        }
    }
    Ok(())
}

/// Tokenizes and dispatches one line. Blank lines and quoting mistakes
/// leave the loop running.
pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = match tokenize(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&err.to_string());
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    context.last_command = Some(line.to_string());
    tracing::debug!(command = %raw, "dispatching");

    let control = context.dispatch(&raw.to_lowercase(), raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Completes command names in the first position and category keys after
/// `add <period>` or `set <period>`.
struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }

    fn candidates(&self, words_before: &[&str], needle: &str) -> Vec<Pair> {
        let pool: Vec<&str> = match words_before {
            [] => self.commands.iter().map(String::as_str).collect(),
            [command, _period] if CATEGORY_COMMANDS.contains(&command.to_lowercase().as_str()) => {
                Category::ALL.iter().map(|category| category.key()).collect()
            }
            _ => Vec::new(),
        };
        let needle = needle.to_ascii_lowercase();
        pool.into_iter()
            .filter(|name| name.starts_with(&needle))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect()
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let words_before: Vec<&str> = prefix[..start].split_whitespace().collect();
        Ok((start, self.candidates(&words_before, &prefix[start..])))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("could not read command line: {0}")]
pub(crate) struct TokenizeError(#[from] shell_words::ParseError);

pub(crate) fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    Ok(shell_words::split(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> CommandHelper {
        CommandHelper::new(vec!["add", "set", "records", "reverse"])
    }

    fn replacements(pairs: Vec<Pair>) -> Vec<String> {
        pairs.into_iter().map(|pair| pair.replacement).collect()
    }

    #[test]
    fn completes_command_names_first() {
        let names = replacements(helper().candidates(&[], "re"));
        assert_eq!(names, vec!["records", "reverse"]);
    }

    #[test]
    fn completes_category_keys_after_period() {
        let names = replacements(helper().candidates(&["add", "Jan-25"], "ingresos_r"));
        assert_eq!(
            names,
            vec!["ingresos_rendimiento_inversiones", "ingresos_reales_vs_fact"]
        );
        assert!(helper().candidates(&["records", "Jan-25"], "s").is_empty());
    }

    #[test]
    fn unterminated_quotes_are_reported() {
        assert!(tokenize("note Jan-25 \"open").is_err());
    }
}
