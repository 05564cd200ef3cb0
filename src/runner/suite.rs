// src/runner/suite.rs
// =============================================================================
// Runs a whole checks file, one target after another.
//
// For each target (in config order):
// 1. Work out protocol + virtual host from its identifier
// 2. Make a Checker (sharing one HTTP client) and a TargetRunner
// 3. Let the Scheduler run all of that target's invocations
// 4. Freeze the results into a TargetOutcome and move on
//
// The config is fully loaded and validated before step 1, so a bad file
// fails the run without sending any traffic.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::scheduler::{Scheduler, DEFAULT_CONCURRENCY};
use super::target::{TargetOutcome, TargetRunner};
use crate::checker::{build_client, CheckRegistry, Checker};
use crate::config::{self, Config, Target};

/// Knobs for one run
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    /// host[:port] every request connects to
    pub connect_host: String,
    /// Invocations in flight per target
    pub concurrency: usize,
    /// Per-request timeout; None waits as long as the server does
    pub timeout: Option<Duration>,
    /// Only run these targets (empty = all of them)
    pub only_targets: Vec<String>,
}

impl SuiteOptions {
    pub fn new(connect_host: impl Into<String>) -> Self {
        Self {
            connect_host: connect_host.into(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
            only_targets: Vec::new(),
        }
    }
}

/// Results for every target of one run, in config order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub targets: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.targets.iter().all(TargetOutcome::all_passed)
    }

    pub fn total(&self) -> usize {
        self.targets.iter().map(|outcome| outcome.total).sum()
    }

    pub fn passed(&self) -> usize {
        self.targets.iter().map(|outcome| outcome.passed).sum()
    }
}

// Loads a checks file and runs it
//
// Config problems come back as a ConfigError inside the anyhow::Error, so
// callers can downcast to tell them apart from everything else.
pub async fn run_file(path: &Path, options: &SuiteOptions) -> Result<RunReport> {
    let registry = CheckRegistry::builtin();
    let config = config::load(path, &registry)?;
    info!(
        path = %path.display(),
        targets = config.targets.len(),
        invocations = config.invocation_count(),
        "loaded checks"
    );
    run_suite(config, options).await
}

// Runs every target of an already-validated config
pub async fn run_suite(mut config: Config, options: &SuiteOptions) -> Result<RunReport> {
    if !options.only_targets.is_empty() {
        config.retain_targets(&options.only_targets)?;
    }

    let client = build_client(options.timeout).context("Failed to create HTTP client")?;
    let scheduler = Scheduler::new(options.concurrency);
    let mut report = RunReport::default();

    for target_config in &config.targets {
        let target = Target::parse(&target_config.identifier, &options.connect_host);
        let checker = Checker::new(client.clone(), target);
        let runner = TargetRunner::new(target_config.identifier.as_str());

        info!(
            target_id = %target_config.identifier,
            host = %checker.target().virtual_host,
            protocol = %checker.target().protocol,
            "running checks"
        );

        scheduler
            .run(&runner, target_config.invocations(), |invocation| {
                let checker = &checker;
                async move { checker.run(invocation.kind, &invocation.args).await }
            })
            .await;

        let outcome = runner.finish();
        info!(
            target_id = %outcome.target,
            passed = outcome.passed,
            failed = outcome.failed(),
            total = outcome.total,
            "target finished"
        );
        report.targets.push(outcome);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::test_server::{refused_addr, TestServer};
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn parse(text: &str) -> Config {
        config::parse(text, &CheckRegistry::builtin()).unwrap()
    }

    #[tokio::test]
    async fn test_full_run_against_local_server() {
        let server = TestServer::start().await;
        let config = parse(
            r#"
http://www.example.com:
  checkStatus:
    - /ok
    - /missing
    - /vhost
  checkRedirect:
    - [/old, /new]
    - [/ok, /new]
  checkHeader:
    - [/headers, X-Frame-Options, SAME]
    - [/ok, X-Frame-Options, SAME]
"#,
        );

        let report = run_suite(config, &SuiteOptions::new(server.connect_host()))
            .await
            .unwrap();

        let outcome = &report.targets[0];
        assert_eq!(outcome.target, "http://www.example.com");
        assert_eq!((outcome.total, outcome.passed), (7, 4));
        assert!(!report.all_passed());

        let messages: Vec<_> = outcome
            .records
            .iter()
            .map(|r| (r.check.as_str(), r.args[0].as_str(), r.result.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![
                ("checkStatus", "/ok", ""),
                ("checkStatus", "/missing", "Got 404"),
                ("checkStatus", "/vhost", ""),
                ("checkRedirect", "/old", ""),
                ("checkRedirect", "/ok", "No redirect found"),
                ("checkHeader", "/headers", ""),
                ("checkHeader", "/ok", "X-Frame-Options not found in headers"),
            ]
        );
    }

    #[tokio::test]
    async fn test_all_passing_target() {
        let server = TestServer::start().await;
        let config = parse("http://www.example.com:\n  checkStatus: [/ok, /new, /slow]\n");

        let report = run_suite(config, &SuiteOptions::new(server.connect_host()))
            .await
            .unwrap();

        assert!(report.all_passed());
        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 3);
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn test_unknown_check_sends_no_requests() {
        let server = TestServer::start().await;
        let file = write_config(
            "http://www.example.com:\n  checkStatus: [/ok, /new]\n  checkHedaer:\n    - [/, X-Frame-Options, SAME]\n",
        );

        let err = run_file(file.path(), &SuiteOptions::new(server.connect_host()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownCheck { .. })
        ));
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn test_dead_server_fails_checks_but_run_completes() {
        let addr = refused_addr().await;
        let config = parse(
            "http://a.example.com:\n  checkStatus: [/one, /two]\nhttp://b.example.com:\n  checkHeader:\n    - [/, X-Frame-Options, SAME]\n",
        );

        let report = run_suite(config, &SuiteOptions::new(addr)).await.unwrap();

        assert_eq!(report.targets.len(), 2);
        assert_eq!(report.total(), 3);
        assert_eq!(report.passed(), 0);
        for outcome in &report.targets {
            for record in &outcome.records {
                assert!(!record.passed());
                assert!(!record.result.message.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_targets_run_in_config_order_and_can_be_filtered() {
        let server = TestServer::start().await;
        let text = "http://www.example.com:\n  checkStatus: /vhost\nhttp://other.example.com:\n  checkStatus: /vhost\n";

        let report = run_suite(parse(text), &SuiteOptions::new(server.connect_host()))
            .await
            .unwrap();
        let order: Vec<_> = report.targets.iter().map(|t| t.target.as_str()).collect();
        assert_eq!(order, vec!["http://www.example.com", "http://other.example.com"]);
        // Only www.example.com is served at /vhost
        assert!(report.targets[0].all_passed());
        assert!(!report.targets[1].all_passed());

        let mut options = SuiteOptions::new(server.connect_host());
        options.only_targets = vec!["http://other.example.com".to_string()];
        let report = run_suite(parse(text), &options).await.unwrap();
        assert_eq!(report.targets.len(), 1);
        assert_eq!(report.targets[0].target, "http://other.example.com");
    }

    #[tokio::test]
    async fn test_unknown_target_filter_is_config_error() {
        let mut options = SuiteOptions::new("127.0.0.1:9");
        options.only_targets = vec!["nope.example.com".to_string()];

        let err = run_suite(parse("a.example.com:\n  checkStatus: /\n"), &options)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownTarget(_))
        ));
    }
}
