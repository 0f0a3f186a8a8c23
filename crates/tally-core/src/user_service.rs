//! User administration and credential checks.

use uuid::Uuid;

use tally_domain::{ActorRef, Book, ProfileChanges, Role, User};

use crate::{
    notify::{Notification, Notifier},
    password::{check_password_strength, hash_password, verify_password},
    validate::{require_active, require_admin},
    CoreError,
};

const MAX_USERNAME_LEN: usize = 150;

/// Input for [`UserService::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: Option<String>,
}

/// Result of creating a user: the account plus any non-fatal warning from
/// the welcome notification.
#[derive(Debug, Clone)]
pub struct UserCreation {
    pub user: User,
    pub warning: Option<String>,
}

pub struct UserService;

impl UserService {
    /// Creates the first administrator of an empty book.
    pub fn bootstrap_admin(
        book: &mut Book,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, CoreError> {
        if !book.users.is_empty() {
            return Err(CoreError::Validation("users already exist".into()));
        }
        let user = Self::build_user(
            book,
            NewUser {
                username: username.into(),
                email: email.into(),
                password: password.into(),
                role: Role::Admin,
                display_name: None,
            },
        )?;
        book.add_user(user.clone());
        book.log_system(
            Some(ActorRef::from(&user)),
            "create_user",
            format!("Bootstrapped administrator {}", user.username),
        );
        tracing::info!(username = %user.username, "administrator bootstrapped");
        Ok(user)
    }

    /// Adds a user. Sending the welcome notification is left to the caller,
    /// after the change is committed; see [`UserService::welcome`].
    pub fn create_user(book: &mut Book, actor: &User, new_user: NewUser) -> Result<User, CoreError> {
        require_admin(actor)?;
        let user = Self::build_user(book, new_user)?;
        book.add_user(user.clone());
        book.log_system(
            Some(ActorRef::from(actor)),
            "create_user",
            format!("Created {} user {} <{}>", user.role, user.username, user.email),
        );
        tracing::info!(username = %user.username, role = %user.role, actor = %actor.username, "user created");
        Ok(user)
    }

    /// Sends the welcome notification and downgrades failure to a warning.
    pub fn welcome(notifier: &dyn Notifier, user: &User) -> Option<String> {
        let notification = Notification::Welcome {
            username: user.username.clone(),
            email: user.email.clone(),
        };
        match notifier.notify(&notification) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(username = %user.username, error = %err, "welcome notification failed");
                Some(format!(
                    "user {} was created but the welcome notification failed: {err}",
                    user.username
                ))
            }
        }
    }

    /// Checks credentials. Every failure yields the same message.
    pub fn authenticate(book: &Book, username: &str, password: &str) -> Result<User, CoreError> {
        let denied = || CoreError::PermissionDenied("invalid credentials".into());
        let user = book.user_by_name(username).ok_or_else(denied)?;
        if !user.active || !verify_password(password, &user.password_hash) {
            return Err(denied());
        }
        Ok(user.clone())
    }

    pub fn update_profile(
        book: &mut Book,
        actor: &User,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, CoreError> {
        require_self_or_admin(actor, user_id)?;
        if let Some(email) = &changes.email {
            check_email(email)?;
        }
        let user = book
            .user_mut(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        let mut fields = Vec::new();
        if let Some(email) = changes.email {
            user.email = email.trim().to_string();
            fields.push("email");
        }
        if let Some(name) = changes.display_name {
            let name = name.trim().to_string();
            user.display_name = if name.is_empty() { None } else { Some(name) };
            fields.push("display name");
        }
        let updated = user.clone();
        book.log_system(
            Some(ActorRef::from(actor)),
            "update_profile",
            format!("Updated {} of {}", join_or_none(&fields), updated.username),
        );
        Ok(updated)
    }

    /// Users changing their own password must present the current one;
    /// administrators may reset anyone else's.
    pub fn change_password(
        book: &mut Book,
        actor: &User,
        user_id: Uuid,
        current: Option<&str>,
        new_password: &str,
    ) -> Result<(), CoreError> {
        require_self_or_admin(actor, user_id)?;
        check_password_strength(new_password)?;
        let user = book
            .user_mut(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        if actor.id == user_id {
            let verified = current
                .map(|password| verify_password(password, &user.password_hash))
                .unwrap_or(false);
            if !verified {
                return Err(CoreError::PermissionDenied(
                    "current password is incorrect".into(),
                ));
            }
        }
        user.password_hash = hash_password(new_password)?;
        let username = user.username.clone();
        let detail = if actor.id == user_id {
            format!("{username} changed their password")
        } else {
            format!("Password of {username} reset by {}", actor.username)
        };
        book.log_system(Some(ActorRef::from(actor)), "change_password", detail);
        Ok(())
    }

    pub fn set_role(
        book: &mut Book,
        actor: &User,
        user_id: Uuid,
        role: Role,
    ) -> Result<User, CoreError> {
        require_admin(actor)?;
        let target = book
            .user(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        if target.is_admin() && role != Role::Admin && active_admins(book) == 1 {
            return Err(CoreError::Validation(
                "cannot demote the last administrator".into(),
            ));
        }
        let user = book
            .user_mut(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        user.role = role;
        let updated = user.clone();
        book.log_system(
            Some(ActorRef::from(actor)),
            "set_role",
            format!("Set role of {} to {role}", updated.username),
        );
        Ok(updated)
    }

    pub fn deactivate(book: &mut Book, actor: &User, user_id: Uuid) -> Result<User, CoreError> {
        require_admin(actor)?;
        if actor.id == user_id {
            return Err(CoreError::Validation("cannot deactivate yourself".into()));
        }
        let user = book
            .user_mut(user_id)
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;
        user.active = false;
        let updated = user.clone();
        book.log_system(
            Some(ActorRef::from(actor)),
            "deactivate_user",
            format!("Deactivated {}", updated.username),
        );
        Ok(updated)
    }

    pub fn list_users(book: &Book) -> Vec<&User> {
        let mut users: Vec<&User> = book.users.iter().collect();
        users.sort_by(|a, b| a.username.to_lowercase().cmp(&b.username.to_lowercase()));
        users
    }

    fn build_user(book: &Book, new_user: NewUser) -> Result<User, CoreError> {
        let username = new_user.username.trim();
        check_username(username)?;
        if book.user_by_name(username).is_some() {
            return Err(CoreError::Validation(format!(
                "username `{username}` is already taken"
            )));
        }
        check_email(&new_user.email)?;
        check_password_strength(&new_user.password)?;
        let mut user = User::new(
            username,
            new_user.email.trim(),
            new_user.role,
            hash_password(&new_user.password)?,
        );
        user.display_name = new_user
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Ok(user)
    }
}

fn require_self_or_admin(actor: &User, user_id: Uuid) -> Result<(), CoreError> {
    if actor.id == user_id {
        require_active(actor)
    } else {
        require_admin(actor)
    }
}

fn active_admins(book: &Book) -> usize {
    book.users.iter().filter(|user| user.is_admin()).count()
}

fn check_username(username: &str) -> Result<(), CoreError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(CoreError::Validation(format!(
            "username must be 1 to {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '+'))
    {
        return Err(CoreError::Validation(format!(
            "username `{username}` contains unsupported characters"
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("`{email}` is not a valid email")))
    }
}

fn join_or_none(fields: &[&str]) -> String {
    if fields.is_empty() {
        "nothing".into()
    } else {
        fields.join(" and ")
    }
}
