//! Deny-by-default validators for account credentials.
//!
//! Checks a username or password against the server-declared
//! [`ValidationRuleSet`], producing either acceptance or the first
//! [`Reason`] the value is refused for. Checks run in a fixed order:
//! empty, minimum length, maximum length, then charset.

mod reason;

pub use reason::{Field, Reason};

use portal_protocol::{PasswordRules, UsernameRules, ValidationRuleSet};
use fancy_regex::Regex;

/// Validate a username against the rule set.
pub fn validate_username(value: &str, rules: &ValidationRuleSet) -> Result<(), Reason> {
    check_username(value, &rules.username)
}

/// Validate a password against the rule set.
pub fn validate_password(value: &str, rules: &ValidationRuleSet) -> Result<(), Reason> {
    check_password(value, &rules.password)
}

/// Validate both credentials.
///
/// Both validators always run so every relevant reason can be shown; the
/// result is `Ok` only if both accept.
pub fn validate_user_credentials(
    username: &str,
    password: &str,
    rules: &ValidationRuleSet,
) -> Result<(), Vec<Reason>> {
    let reasons: Vec<Reason> = [
        validate_username(username, rules),
        validate_password(password, rules),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect();

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}

/// Require every named field to be present and non-blank.
///
/// Fields are checked in the order given; the first missing one wins.
pub fn validate_required_fields<'a, F>(fields: &[&str], lookup: F) -> Result<(), Reason>
where
    F: Fn(&str) -> Option<&'a str>,
{
    for field in fields {
        let present = lookup(field).map(|v| !v.trim().is_empty()).unwrap_or(false);
        if !present {
            return Err(Reason::MissingField {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// Require a password and its confirmation to be identical.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), Reason> {
    if password == confirmation {
        Ok(())
    } else {
        Err(Reason::ConfirmationMismatch)
    }
}

fn check_length(field: Field, value: &str, min: usize, max: usize) -> Result<(), Reason> {
    let len = value.chars().count();
    if len == 0 {
        return Err(Reason::Empty { field });
    }
    if len < min {
        return Err(Reason::TooShort { field, min });
    }
    if len > max {
        return Err(Reason::TooLong { field, max });
    }
    Ok(())
}

fn check_username(value: &str, rules: &UsernameRules) -> Result<(), Reason> {
    let value = value.trim();
    check_length(Field::Username, value, rules.min_length, rules.max_length)?;

    // A pattern this client cannot compile rejects rather than accepts.
    let pattern = Regex::new(&rules.regex).map_err(|e| Reason::UnusablePattern {
        detail: e.to_string(),
    })?;
    let matched = pattern
        .is_match(value)
        .map_err(|e| Reason::UnusablePattern {
            detail: e.to_string(),
        })?;
    if !matched {
        return Err(Reason::PatternMismatch {
            description: rules.description.clone(),
        });
    }
    Ok(())
}

fn check_password(value: &str, rules: &PasswordRules) -> Result<(), Reason> {
    let value = value.trim();
    check_length(Field::Password, value, rules.min_length, rules.max_length)?;

    if rules.require_numbers && !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(Reason::MissingDigit {
            description: rules.description.clone(),
        });
    }
    if rules.require_alphabets && !value.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(Reason::MissingLetter {
            description: rules.description.clone(),
        });
    }
    if rules.require_special_chars && !value.chars().any(|c| rules.special_chars.contains(c)) {
        return Err(Reason::MissingSpecialChar {
            description: rules.description.clone(),
        });
    }
    Ok(())
}
