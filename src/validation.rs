use crate::constants::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use crate::error::AppError;

fn invalid(field: &'static str, reason: &str) -> AppError {
    AppError::InvalidInput {
        field,
        reason: reason.into(),
    }
}

/// Validate login inputs. Runs before any storage access.
pub fn validate_login(username: &str, password: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(invalid("username", "cannot be empty"));
    }
    if password.trim().is_empty() {
        return Err(invalid("password", "cannot be empty"));
    }
    Ok(())
}

/// Validate registration inputs. Rules run in a fixed order and the first
/// failure short-circuits with its specific message.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(invalid("username", "cannot be empty"));
    }
    if username.len() < MIN_USERNAME_LEN {
        return Err(invalid(
            "username",
            &format!("must be at least {MIN_USERNAME_LEN} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid(
            "username",
            "can only contain letters, numbers and underscores",
        ));
    }
    if email.trim().is_empty() {
        return Err(invalid("email", "cannot be empty"));
    }
    if !is_valid_email(email) {
        return Err(invalid("email", "is not a valid address"));
    }
    if password.trim().is_empty() {
        return Err(invalid("password", "cannot be empty"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(invalid(
            "password",
            &format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirm_password {
        return Err(invalid("password", "confirmation does not match"));
    }
    Ok(())
}

/// Validate a password change. Rules run in a fixed order; the current
/// secret itself is checked against storage by the caller afterwards.
pub fn validate_password_change(
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<(), AppError> {
    if current.trim().is_empty() || new.trim().is_empty() || confirm.trim().is_empty() {
        return Err(invalid("password", "all fields are required"));
    }
    if new != confirm {
        return Err(invalid("password", "confirmation does not match"));
    }
    if new.len() < MIN_PASSWORD_LEN {
        return Err(invalid(
            "password",
            &format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if new == current {
        return Err(invalid("password", "cannot be the same as the old one"));
    }
    Ok(())
}

/// Check the `local@domain.tld` shape: non-empty local part, a domain with
/// at least one dot, and an alphabetic TLD of two or more characters.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
    {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    let Some((head, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if head.is_empty()
        || !head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
    {
        return false;
    }
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
