//! Rejection reasons.

use std::fmt;

/// Which credential a reason refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Username => f.write_str("username"),
            Field::Password => f.write_str("password"),
        }
    }
}

/// A single user-facing reason for refusing input.
///
/// Every check has its own variant. Charset failures carry the rule set's
/// description verbatim; empty/length failures use fixed messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Reason {
    #[error("Please enter a {field}.")]
    Empty { field: Field },

    #[error("The {field} must be at least {min} characters long.")]
    TooShort { field: Field, min: usize },

    #[error("The {field} can be at most {max} characters long.")]
    TooLong { field: Field, max: usize },

    #[error("{description}")]
    PatternMismatch { description: String },

    #[error("The username rule cannot be applied: {detail}")]
    UnusablePattern { detail: String },

    #[error("{description}")]
    MissingDigit { description: String },

    #[error("{description}")]
    MissingLetter { description: String },

    #[error("{description}")]
    MissingSpecialChar { description: String },

    #[error("Please fill in {field}.")]
    MissingField { field: String },

    #[error("The password and its confirmation do not match.")]
    ConfirmationMismatch,

    #[error("'{value}' is not a valid {field}.")]
    InvalidValue { field: String, value: String },
}

impl Reason {
    /// Machine-readable code for logs and JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Reason::Empty { .. } => "EMPTY",
            Reason::TooShort { .. } => "TOO_SHORT",
            Reason::TooLong { .. } => "TOO_LONG",
            Reason::PatternMismatch { .. } => "PATTERN_MISMATCH",
            Reason::UnusablePattern { .. } => "UNUSABLE_PATTERN",
            Reason::MissingDigit { .. } => "MISSING_DIGIT",
            Reason::MissingLetter { .. } => "MISSING_LETTER",
            Reason::MissingSpecialChar { .. } => "MISSING_SPECIAL_CHAR",
            Reason::MissingField { .. } => "MISSING_FIELD",
            Reason::ConfirmationMismatch => "CONFIRMATION_MISMATCH",
            Reason::InvalidValue { .. } => "INVALID_VALUE",
        }
    }

    /// True for the min/max length checks.
    pub fn is_length(&self) -> bool {
        matches!(self, Reason::TooShort { .. } | Reason::TooLong { .. })
    }
}
