// src/checker/registry.rs
// =============================================================================
// Maps the check names people write in the config file to the checks we
// actually know how to run.
//
// Every name is resolved while the config is being loaded, so a typo such as
// "chekStatus" stops the whole run before a single request is sent.
//
// Rust concepts:
// - Enums: One variant per kind of check
// - Slices of tuples: A tiny static lookup table
// - Result: Unknown names come back as a typed error
// =============================================================================

use std::fmt;

use crate::config::ConfigError;

/// The kinds of check a target can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// Path must answer 200 without following redirects
    Status,
    /// First redirect hop of path must be the expected URL
    Redirect,
    /// A response header must contain some text
    Header,
}

impl CheckKind {
    /// How many arguments one invocation of this check takes
    pub fn arity(self) -> usize {
        match self {
            CheckKind::Status => 1,
            CheckKind::Redirect => 2,
            CheckKind::Header => 3,
        }
    }

    /// Human description of the arguments, used in error messages
    pub fn usage(self) -> &'static str {
        match self {
            CheckKind::Status => "[path]",
            CheckKind::Redirect => "[path, expected_next_url]",
            CheckKind::Header => "[path, header_name, expected_substring]",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::Status => "checkStatus",
            CheckKind::Redirect => "checkRedirect",
            CheckKind::Header => "checkHeader",
        };
        f.write_str(name)
    }
}

// Names accepted in config files.
// The snake_case spellings are what older config files use.
const BUILTIN_CHECKS: &[(&str, CheckKind)] = &[
    ("checkStatus", CheckKind::Status),
    ("checkRedirect", CheckKind::Redirect),
    ("checkHeader", CheckKind::Header),
    ("check_200", CheckKind::Status),
    ("check_3xx", CheckKind::Redirect),
    ("check_header", CheckKind::Header),
];

/// Name -> check lookup
#[derive(Debug, Clone)]
pub struct CheckRegistry {
    entries: Vec<(String, CheckKind)>,
}

impl CheckRegistry {
    /// Registry holding every check this tool ships with
    pub fn builtin() -> Self {
        let entries = BUILTIN_CHECKS
            .iter()
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect();
        Self { entries }
    }

    /// Looks up a check by the name used in the config file
    ///
    /// `target` is only used to make the error message useful.
    pub fn resolve(&self, target: &str, name: &str) -> Result<CheckKind, ConfigError> {
        self.entries
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ConfigError::UnknownCheck {
                target: target.to_string(),
                check: name.to_string(),
            })
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
