// src/config/mod.rs
// =============================================================================
// This module reads the checks file and describes the targets in it.
//
// Submodules:
// - load: YAML -> Config (targets, checks, argument-sets), with validation
// - target: Parsing a target identifier into protocol + virtual host
// - error: ConfigError, the "fix your config file" family of errors
// =============================================================================

mod error;
mod load;
mod target;

pub use error::ConfigError;
pub use load::{load, Config, Invocation};
pub use target::Target;

#[cfg(test)]
pub use load::parse;
