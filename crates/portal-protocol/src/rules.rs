//! Validation rule set served by `GET /validation-rules`.

use serde::{Deserialize, Serialize};

/// Username and password constraints declared by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRuleSet {
    pub username: UsernameRules,
    pub password: PasswordRules,
}

/// Username constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameRules {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Maximum length in characters.
    pub max_length: usize,
    /// Pattern the whole username must match (lookaround allowed).
    #[serde(alias = "pattern")]
    pub regex: String,
    /// Shown to the user when the pattern does not match.
    pub description: String,
}

impl Default for UsernameRules {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 20,
            regex: r"^(?!-)(?!.*--)[A-Za-z0-9-]+(?<!-)$".to_string(),
            description: "Only letters, digits and hyphens (-) are allowed; a username cannot \
                          start or end with a hyphen or contain consecutive hyphens."
                .to_string(),
        }
    }
}

/// Password constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRules {
    pub min_length: usize,
    pub max_length: usize,
    #[serde(default)]
    pub require_numbers: bool,
    #[serde(default)]
    pub require_alphabets: bool,
    #[serde(default)]
    pub require_special_chars: bool,
    /// Characters that count as "special".
    #[serde(default)]
    pub special_chars: String,
    /// Shown to the user when a required character class is missing.
    pub description: String,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 100,
            require_numbers: true,
            require_alphabets: true,
            require_special_chars: true,
            special_chars: r#"!@#$%^&*(),.?":{}|<>"#.to_string(),
            description: "At least 8 characters, including a digit, a letter and a special \
                          character."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_server_payload() {
        let json = r#"{
            "username": {
                "regex": "^[a-z]+$",
                "min_length": 3,
                "max_length": 20,
                "description": "lowercase only"
            },
            "password": {
                "min_length": 8,
                "max_length": 100,
                "require_numbers": true,
                "require_alphabets": true,
                "require_special_chars": false,
                "special_chars": "!@#",
                "description": "needs digits and letters"
            }
        }"#;

        let rules: ValidationRuleSet = serde_json::from_str(json).unwrap();
        assert_eq!(rules.username.regex, "^[a-z]+$");
        assert_eq!(rules.username.max_length, 20);
        assert!(rules.password.require_numbers);
        assert!(!rules.password.require_special_chars);
    }

    #[test]
    fn test_pattern_alias() {
        let json = r#"{"min_length": 1, "max_length": 2, "pattern": "^x$", "description": "d"}"#;
        let rules: UsernameRules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.regex, "^x$");
    }

    #[test]
    fn test_missing_flags_default_off() {
        let json = r#"{"min_length": 1, "max_length": 2, "description": "d"}"#;
        let rules: PasswordRules = serde_json::from_str(json).unwrap();
        assert!(!rules.require_numbers);
        assert!(!rules.require_alphabets);
        assert!(!rules.require_special_chars);
        assert!(rules.special_chars.is_empty());
    }

    #[test]
    fn test_defaults_mirror_backend() {
        let rules = ValidationRuleSet::default();
        assert_eq!(rules.username.min_length, 3);
        assert_eq!(rules.username.max_length, 20);
        assert_eq!(rules.password.min_length, 8);
        assert_eq!(rules.password.max_length, 100);
        assert!(rules.password.special_chars.contains('!'));
    }

    #[test]
    fn test_backend_fixture_matches_defaults() {
        let served: ValidationRuleSet =
            serde_json::from_str(include_str!("../fixtures/validation_rules.json")).unwrap();
        let defaults = ValidationRuleSet::default();
        assert_eq!(served.username.regex, defaults.username.regex);
        assert_eq!(served.username.min_length, defaults.username.min_length);
        assert_eq!(served.username.max_length, defaults.username.max_length);
        assert_eq!(served.password.special_chars, defaults.password.special_chars);
        assert!(served.password.require_special_chars);
    }
}
