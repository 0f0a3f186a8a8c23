use std::collections::HashMap;

pub mod audit;
pub mod config;
pub mod ledger;
pub mod report;
pub mod system;
pub mod users;

use crate::cli::core::{CommandResult, ShellContext};

/// Command groups in the order `help` lists them.
pub(crate) fn all_groups() -> Vec<CommandGroup> {
    vec![
        CommandGroup::new("Users", users::definitions()),
        CommandGroup::new("Ledger", ledger::definitions()),
        CommandGroup::new("Reports", report::definitions()),
        CommandGroup::new("Audit", audit::definitions()),
        CommandGroup::new("Configuration", config::definitions()),
        CommandGroup::new("Shell", system::definitions()),
    ]
}

pub struct CommandGroup {
    pub title: &'static str,
    pub commands: Vec<CommandDefinition>,
}

impl CommandGroup {
    pub fn new(title: &'static str, commands: Vec<CommandDefinition>) -> Self {
        Self { title, commands }
    }
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Name lookup over the grouped command table.
pub struct CommandRegistry {
    groups: Vec<CommandGroup>,
    index: HashMap<&'static str, (usize, usize)>,
}

impl CommandRegistry {
    pub fn new(groups: Vec<CommandGroup>) -> Self {
        let index = groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .commands
                    .iter()
                    .enumerate()
                    .map(move |(c, command)| (command.name, (g, c)))
            })
            .collect();
        Self { groups, index }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        let &(g, c) = self.index.get(name)?;
        self.groups.get(g)?.commands.get(c)
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.groups.iter().flat_map(|group| group.commands.iter())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter().map(|command| command.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_are_unique_and_keep_declaration_order() {
        let registry = CommandRegistry::new(all_groups());
        let names: Vec<_> = registry.names().collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        assert_eq!(registry.groups().len(), 6);
        assert_eq!(names.last(), Some(&"exit"));
        for name in ["bootstrap", "add", "reverse", "export", "syslog", "user-add", "passwd"] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
    }
}
