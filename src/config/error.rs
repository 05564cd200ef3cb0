// src/config/error.rs
// Everything that can be wrong with a checks file. Any of these aborts the
// run before a request is made, and main() maps them to their own exit code.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", path.display())]
    UnreadableConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    MalformedConfig(String),

    #[error("invalid YAML")]
    Yaml(#[from] serde_yaml::Error),

    #[error("check {check} not implemented (target {target})")]
    UnknownCheck { target: String, check: String },

    #[error("{check} for {target} takes {expected} argument(s) {usage}, got {got}: {args:?}")]
    WrongArity {
        target: String,
        check: String,
        expected: usize,
        got: usize,
        usage: &'static str,
        args: Vec<String>,
    },

    #[error("target {0} is not in the config file")]
    UnknownTarget(String),
}
