use tally_core::NewUser;
use tally_domain::{ProfileChanges, Role};

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{required, split_flags, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "bootstrap",
            "Create the first administrator of an empty book",
            "bootstrap <username> <email> [password]",
            cmd_bootstrap,
        ),
        CommandDefinition::new("login", "Log in", "login <username> [password]", cmd_login),
        CommandDefinition::new("logout", "Log out", "logout", cmd_logout),
        CommandDefinition::new("whoami", "Show the logged-in user", "whoami", cmd_whoami),
        CommandDefinition::new(
            "user-add",
            "Create a user (administrators only)",
            "user-add <username> <email> [--role admin|staff] [--name <display name>] [--password <password>]",
            cmd_user_add,
        ),
        CommandDefinition::new("users", "List users", "users", cmd_users),
        CommandDefinition::new(
            "passwd",
            "Change your password, or reset another user's as administrator",
            "passwd [--user <username>] [--current <password>] [new-password]",
            cmd_passwd,
        ),
        CommandDefinition::new(
            "profile",
            "Update email or display name",
            "profile <username> [--email <email>] [--name <display name>]",
            cmd_profile,
        ),
        CommandDefinition::new(
            "role",
            "Change a user's role (administrators only)",
            "role <username> <admin|staff>",
            cmd_role,
        ),
        CommandDefinition::new(
            "deactivate",
            "Disable a user account (administrators only)",
            "deactivate <username>",
            cmd_deactivate,
        ),
    ]
}

fn cmd_bootstrap(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = required(args, 0, "username")?;
    let email = required(args, 1, "email")?;
    let password = context.password_arg(args.get(2).copied(), "Password")?;
    let user = context.session.bootstrap(username, email, &password)?;
    io::print_success(format!(
        "Administrator {} created and logged in.",
        user.username
    ));
    Ok(())
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = required(args, 0, "username")?;
    let password = context.password_arg(args.get(1).copied(), "Password")?;
    let user = context.session.login(username, &password)?;
    io::print_success(format!("Logged in as {} ({}).", user.username, user.role));
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.session.logout();
    io::print_info("Logged out.");
    Ok(())
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.session.is_logged_in() {
        io::print_info("Not logged in.");
        return Ok(());
    }
    let user = context.session.current_user()?;
    io::print_info(format!(
        "{} <{}> role: {}{}",
        user.username,
        user.email,
        user.role,
        user.display_name
            .as_deref()
            .map(|name| format!(", name: {name}"))
            .unwrap_or_default()
    ));
    Ok(())
}

fn cmd_user_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, flags) = split_flags(args)?;
    let username = required(&positional, 0, "username")?;
    let email = required(&positional, 1, "email")?;
    let mut role = Role::Staff;
    let mut display_name = None;
    let mut password = None;
    for (flag, value) in flags {
        match flag {
            "role" => {
                role = value
                    .parse()
                    .map_err(|err| CommandError::InvalidArguments(format!("{err}")))?
            }
            "name" => display_name = Some(value.to_string()),
            "password" => password = Some(value),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }
    let password = context.password_arg(password, "Password")?;

    let creation = context.session.create_user(NewUser {
        username: username.into(),
        email: email.into(),
        password,
        role,
        display_name,
    })?;
    io::print_success(format!(
        "User {} created with role {}.",
        creation.user.username, creation.user.role
    ));
    if let Some(warning) = creation.warning {
        io::print_warning(warning);
    }
    Ok(())
}

fn cmd_users(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let users = context.session.users()?;
    output_section("Users");
    for user in users {
        io::print_info(format!(
            "  {:<16} {:<6} {:<8} {}",
            user.username,
            user.role.to_string(),
            if user.active { "active" } else { "inactive" },
            user.email
        ));
    }
    Ok(())
}

fn cmd_passwd(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, flags) = split_flags(args)?;
    let mut target = None;
    let mut current = None;
    for (flag, value) in flags {
        match flag {
            "user" => target = Some(value),
            "current" => current = Some(value.to_string()),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }

    let own = match target {
        Some(name) => context
            .session
            .current_user()
            .map(|user| user.username.eq_ignore_ascii_case(name.trim()))?,
        None => true,
    };
    if own && current.is_none() {
        current = Some(context.password_arg(None, "Current password")?);
    }
    let new_password = context.password_arg(positional.first().copied(), "New password")?;

    context
        .session
        .change_password(target, current.as_deref(), &new_password)?;
    io::print_success("Password changed.");
    Ok(())
}

fn cmd_profile(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (positional, flags) = split_flags(args)?;
    let username = required(&positional, 0, "username")?;
    let mut changes = ProfileChanges::default();
    for (flag, value) in flags {
        match flag {
            "email" => changes.email = Some(value.to_string()),
            "name" => changes.display_name = Some(value.to_string()),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown flag --{other}"
                )))
            }
        }
    }
    let user = context.session.update_profile(username, changes)?;
    io::print_success(format!("Profile of {} updated.", user.username));
    Ok(())
}

fn cmd_role(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = required(args, 0, "username")?;
    let role: Role = required(args, 1, "role")?
        .parse()
        .map_err(|err| CommandError::InvalidArguments(format!("{err}")))?;
    let user = context.session.set_role(username, role)?;
    io::print_success(format!("{} is now {}.", user.username, user.role));
    Ok(())
}

fn cmd_deactivate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let username = required(args, 0, "username")?;
    let user = context.session.deactivate(username)?;
    io::print_success(format!("{} deactivated.", user.username));
    Ok(())
}
