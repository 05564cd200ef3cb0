// src/config/load.rs
// =============================================================================
// Reads the YAML checks file and turns it into plain Rust data.
//
// File layout:
//
//   www.example.com:            <- target identifier
//     checkStatus:              <- check name
//       - /                     <- one invocation, scalar = one argument
//       - /about
//     checkRedirect:
//       - [/old, /new]          <- one invocation, list = all its arguments
//
// Everything is validated here, up front:
// - Every check name must be known to the CheckRegistry
// - Every argument list must have the right number of arguments
// If anything is off we return a ConfigError and nothing gets requested.
//
// Order matters: serde_yaml::Mapping keeps keys in file order, and the report
// lists results in that same order.
// =============================================================================

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::error::ConfigError;
use crate::checker::{CheckKind, CheckRegistry};

/// The whole checks file
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub targets: Vec<TargetConfig>,
}

/// One target and the checks declared for it
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub identifier: String,
    pub checks: Vec<CheckSpec>,
}

/// One check name under a target, with all of its argument-sets
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSpec {
    /// Name as written in the file (so reports match what people typed)
    pub name: String,
    pub kind: CheckKind,
    pub arg_sets: Vec<Vec<String>>,
}

/// One concrete thing to run: a check with one argument-set
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub check: String,
    pub kind: CheckKind,
    pub args: Vec<String>,
}

impl Config {
    /// Total number of invocations across all targets
    pub fn invocation_count(&self) -> usize {
        self.targets.iter().map(|t| t.invocations().len()).sum()
    }

    pub fn target(&self, identifier: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.identifier == identifier)
    }

    // Keeps only the named targets (still in file order)
    //
    // Asking for a target the file doesn't have is a config error.
    pub fn retain_targets(&mut self, wanted: &[String]) -> Result<(), ConfigError> {
        if let Some(missing) = wanted.iter().find(|w| self.target(w).is_none()) {
            return Err(ConfigError::UnknownTarget(missing.clone()));
        }
        self.targets.retain(|t| wanted.contains(&t.identifier));
        Ok(())
    }
}

impl TargetConfig {
    /// Flattens checks into invocations, in declaration order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.checks
            .iter()
            .flat_map(|spec| {
                spec.arg_sets.iter().map(move |args| Invocation {
                    check: spec.name.clone(),
                    kind: spec.kind,
                    args: args.clone(),
                })
            })
            .collect()
    }
}

// Reads and validates a checks file from disk
pub fn load(path: &Path, registry: &CheckRegistry) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::UnreadableConfig {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, registry)
}

// Parses and validates checks from YAML text
pub fn parse(text: &str, registry: &CheckRegistry) -> Result<Config, ConfigError> {
    if text.trim().is_empty() {
        return Err(malformed("config file is empty"));
    }

    let root: Value = serde_yaml::from_str(text)?;

    let root = match root {
        Value::Mapping(map) => map,
        Value::Null => return Err(malformed("config file is empty")),
        _ => return Err(malformed("top level must be a mapping of targets")),
    };

    let mut targets = Vec::with_capacity(root.len());
    for (key, body) in root {
        let identifier = key_string(&key, "target")?;
        let checks = parse_target(&identifier, body, registry)?;
        targets.push(TargetConfig { identifier, checks });
    }

    Ok(Config { targets })
}

fn parse_target(
    identifier: &str,
    body: Value,
    registry: &CheckRegistry,
) -> Result<Vec<CheckSpec>, ConfigError> {
    let checks: Mapping = match body {
        Value::Mapping(map) => map,
        // "www.example.com:" with nothing under it
        Value::Null => return Ok(Vec::new()),
        _ => {
            return Err(malformed(format!(
                "target {identifier} must map check names to arguments"
            )))
        }
    };

    let mut specs = Vec::with_capacity(checks.len());
    for (key, value) in checks {
        let name = key_string(&key, "check")?;
        let kind = registry.resolve(identifier, &name)?;
        let arg_sets = normalize_arg_sets(identifier, &name, value)?;

        for args in &arg_sets {
            if args.len() != kind.arity() {
                return Err(ConfigError::WrongArity {
                    target: identifier.to_string(),
                    check: name.clone(),
                    expected: kind.arity(),
                    got: args.len(),
                    usage: kind.usage(),
                    args: args.clone(),
                });
            }
        }

        specs.push(CheckSpec { name, kind, arg_sets });
    }

    Ok(specs)
}

// scalar            -> one invocation with one argument
// [a, b]            -> two invocations, one argument each
// [[a, b], c]       -> invocation (a, b) then invocation (c)
fn normalize_arg_sets(
    target: &str,
    check: &str,
    value: Value,
) -> Result<Vec<Vec<String>>, ConfigError> {
    let context = || format!("{check} for {target}");

    match value {
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Sequence(args) => args
                    .into_iter()
                    .map(|arg| scalar_string(arg, &context))
                    .collect(),
                scalar => Ok(vec![scalar_string(scalar, &context)?]),
            })
            .collect(),
        Value::Null => Err(malformed(format!("{} has no arguments", context()))),
        scalar => Ok(vec![vec![scalar_string(scalar, &context)?]]),
    }
}

fn scalar_string(value: Value, context: &dyn Fn() -> String) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(malformed(format!("{}: empty argument", context()))),
        other => Err(malformed(format!(
            "{}: arguments must be plain values, got {other:?}",
            context()
        ))),
    }
}

fn key_string(key: &Value, what: &str) -> Result<String, ConfigError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        other => Err(malformed(format!("{what} names must be strings, got {other:?}"))),
    }
}

fn malformed(message: impl Into<String>) -> ConfigError {
    ConfigError::MalformedConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_str(text: &str) -> Result<Config, ConfigError> {
        parse(text, &CheckRegistry::builtin())
    }

    const SAMPLE: &str = r#"
www.example.com:
  checkStatus:
    - /
    - /about
  checkRedirect:
    - [/old, /new]
  checkHeader:
    - [/, X-Frame-Options, SAMEORIGIN]
http://legacy.example.com:
  check_200: /health
"#;

    #[test]
    fn test_parse_keeps_file_order() {
        let config = parse_str(SAMPLE).unwrap();
        let ids: Vec<_> = config.targets.iter().map(|t| t.identifier.as_str()).collect();
        assert_eq!(ids, vec!["www.example.com", "http://legacy.example.com"]);

        let names: Vec<_> = config.targets[0].checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["checkStatus", "checkRedirect", "checkHeader"]);
    }

    #[test]
    fn test_scalars_become_single_argument_sets() {
        let config = parse_str(SAMPLE).unwrap();
        let status = &config.targets[0].checks[0];
        assert_eq!(status.kind, CheckKind::Status);
        assert_eq!(status.arg_sets, vec![vec!["/".to_string()], vec!["/about".to_string()]]);

        // A bare scalar (not even in a list) is a single invocation
        let legacy = &config.targets[1].checks[0];
        assert_eq!(legacy.kind, CheckKind::Status);
        assert_eq!(legacy.arg_sets, vec![vec!["/health".to_string()]]);
    }

    #[test]
    fn test_invocations_flatten_in_declaration_order() {
        let config = parse_str(SAMPLE).unwrap();
        let invocations = config.targets[0].invocations();
        let flat: Vec<_> = invocations
            .iter()
            .map(|i| (i.check.as_str(), i.args.join(",")))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("checkStatus", "/".to_string()),
                ("checkStatus", "/about".to_string()),
                ("checkRedirect", "/old,/new".to_string()),
                ("checkHeader", "/,X-Frame-Options,SAMEORIGIN".to_string()),
            ]
        );
        assert_eq!(config.invocation_count(), 5);
    }

    #[test]
    fn test_numbers_are_rendered_as_strings() {
        let config = parse_str("a.example.com:\n  checkHeader:\n    - [/, X-Version, 2]\n").unwrap();
        assert_eq!(config.targets[0].checks[0].arg_sets[0][2], "2");
    }

    #[test]
    fn test_unknown_check_fails_whole_file() {
        let text = "a.example.com:\n  checkStatus: /\nb.example.com:\n  checkStatsu: /\n";
        match parse_str(text) {
            Err(ConfigError::UnknownCheck { target, check }) => {
                assert_eq!(target, "b.example.com");
                assert_eq!(check, "checkStatsu");
            }
            other => panic!("expected UnknownCheck, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let text = "a.example.com:\n  checkRedirect:\n    - /old\n";
        match parse_str(text) {
            Err(ConfigError::WrongArity { expected, got, .. }) => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected WrongArity, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_shapes() {
        assert!(matches!(parse_str(""), Err(ConfigError::MalformedConfig(_))));
        assert!(matches!(parse_str("- a\n- b\n"), Err(ConfigError::MalformedConfig(_))));
        assert!(matches!(
            parse_str("a.example.com: [1, 2]\n"),
            Err(ConfigError::MalformedConfig(_))
        ));
        assert!(matches!(
            parse_str("a.example.com:\n  checkStatus:\n"),
            Err(ConfigError::MalformedConfig(_))
        ));
        assert!(matches!(
            parse_str("a.example.com:\n  checkStatus:\n    - {path: /}\n"),
            Err(ConfigError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(parse_str("a: [unclosed"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_target_without_checks_is_allowed() {
        let config = parse_str("a.example.com:\n").unwrap();
        assert_eq!(config.targets.len(), 1);
        assert!(config.targets[0].checks.is_empty());
    }

    #[test]
    fn test_retain_targets() {
        let mut config = parse_str(SAMPLE).unwrap();
        config
            .retain_targets(&["http://legacy.example.com".to_string()])
            .unwrap();
        assert_eq!(config.targets.len(), 1);

        let err = config.retain_targets(&["nope.example.com".to_string()]);
        assert!(matches!(err, Err(ConfigError::UnknownTarget(t)) if t == "nope.example.com"));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load(file.path(), &CheckRegistry::builtin()).unwrap();
        assert_eq!(config.targets.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = load(&missing, &CheckRegistry::builtin()).unwrap_err();
        assert!(matches!(err, ConfigError::UnreadableConfig { .. }));
    }
}
