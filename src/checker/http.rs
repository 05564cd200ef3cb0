// src/checker/http.rs
// =============================================================================
// This module runs the actual checks against a server.
//
// Key functionality:
// - Connects to the server from the command line, but sends the target's
//   name in the Host header (so we can test virtual hosts before DNS points
//   at the server)
// - Never validates TLS certificates (test servers rarely have the right one)
// - Three checks: status is 200, first redirect goes where expected, a header
//   contains some text
//
// Failures are data, not errors:
// - A 404, a wrong redirect or a missing header is a failed CheckResult
// - So is "connection refused" - one dead path must not stop the run
//
// Rust concepts:
// - async/await: Requests are awaited so many can be in flight at once
// - Result<T, E>: Used internally, with a failed CheckResult as the error
// - Slice patterns: To unpack argument lists in run()
// =============================================================================

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::header::{HOST, LOCATION};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::registry::CheckKind;
use crate::config::Target;

/// How many redirects check_redirect follows before giving up
pub const MAX_REDIRECTS: usize = 10;

/// The outcome of one check invocation
///
/// `message` is empty when the check passed, and says what went wrong otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            passed: false,
            // A failure always says something
            message: if message.is_empty() {
                "check failed".to_string()
            } else {
                message
            },
        }
    }
}

// Builds the HTTP client shared by every check in the run
//
// - Redirects are never followed automatically; check_redirect walks the
//   chain itself so it can see every hop
// - Certificates are not validated
// - Proxy settings from the environment are ignored, we always want to talk
//   to the server we were given
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .user_agent(concat!("smoky/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// Runs checks for one target
#[derive(Debug, Clone)]
pub struct Checker {
    // Client is cheap to clone (it's an Arc inside), every Checker shares the pool
    client: Client,
    target: Target,
    base: Result<Url, String>,
}

impl Checker {
    pub fn new(client: Client, target: Target) -> Self {
        let base = Url::parse(&target.base_url())
            .map_err(|e| format!("Invalid server address {}: {}", target.connect_host, e));
        Self {
            client,
            target,
            base,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    // Dispatches one invocation to the check its kind names
    //
    // Arity is validated when the config is loaded, the fallback arm only
    // matters for hand-built invocations.
    pub async fn run(&self, kind: CheckKind, args: &[String]) -> CheckResult {
        match (kind, args) {
            (CheckKind::Status, [path]) => self.check_status(path).await,
            (CheckKind::Redirect, [path, next_url]) => self.check_redirect(path, next_url).await,
            (CheckKind::Header, [path, header, content]) => {
                self.check_header(path, header, content).await
            }
            _ => CheckResult::fail(format!(
                "{} takes {}, got {} argument(s)",
                kind,
                kind.usage(),
                args.len()
            )),
        }
    }

    /// Passes when `path` answers 200 (redirects are not followed)
    pub async fn check_status(&self, path: &str) -> CheckResult {
        self.try_check_status(path).await.unwrap_or_else(|failed| failed)
    }

    /// Passes when the first redirect of `path` is `next_url` and the chain ends in a 200
    pub async fn check_redirect(&self, path: &str, next_url: &str) -> CheckResult {
        self.try_check_redirect(path, next_url)
            .await
            .unwrap_or_else(|failed| failed)
    }

    /// Passes when `header` is present on `path` and contains `content`
    pub async fn check_header(&self, path: &str, header: &str, content: &str) -> CheckResult {
        self.try_check_header(path, header, content)
            .await
            .unwrap_or_else(|failed| failed)
    }

    async fn try_check_status(&self, path: &str) -> Result<CheckResult, CheckResult> {
        let url = self.make_url(path)?;
        let response = self.send(&url).await?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(CheckResult::pass())
        } else {
            Ok(CheckResult::fail(format!("Got {}", status.as_u16())))
        }
    }

    async fn try_check_redirect(&self, path: &str, next_url: &str) -> Result<CheckResult, CheckResult> {
        let url = self.make_url(path)?;
        let (chain, response) = self.follow_redirects(url).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(CheckResult::fail(format!("Got a {}", status.as_u16())));
        }

        let first_hop = match chain.get(1) {
            Some(hop) => hop,
            None => return Ok(CheckResult::fail("No redirect found")),
        };

        if hop_matches(&chain[0], first_hop, next_url) {
            Ok(CheckResult::pass())
        } else {
            Ok(CheckResult::fail(format!("Got: {} ({})", first_hop, status.as_u16())))
        }
    }

    async fn try_check_header(
        &self,
        path: &str,
        header: &str,
        content: &str,
    ) -> Result<CheckResult, CheckResult> {
        let url = self.make_url(path)?;
        let response = self.send(&url).await?;

        // HeaderMap lookups by &str are case-insensitive
        let values: Vec<String> = response
            .headers()
            .get_all(header)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();

        if values.is_empty() {
            return Ok(CheckResult::fail(format!("{} not found in headers", header)));
        }

        if values.join(", ").contains(content) {
            Ok(CheckResult::pass())
        } else {
            Ok(CheckResult::fail(format!("'{}' not found in {}", content, header)))
        }
    }

    // Follows redirects by hand and returns every URL visited
    //
    // chain[0] is the URL we asked for, chain[1] the first redirect target,
    // and the last element is where the final response came from.
    async fn follow_redirects(&self, url: Url) -> Result<(Vec<Url>, Response), CheckResult> {
        let mut response = self.send(&url).await?;
        let mut chain = vec![url];

        while response.status().is_redirection() {
            let current = &chain[chain.len() - 1];
            let next = match redirect_target(current, &response) {
                Some(next) => next,
                // 304 and friends: nothing to follow
                None => break,
            };

            if chain.len() > MAX_REDIRECTS {
                return Err(CheckResult::fail(format!("Exceeded {} redirects", MAX_REDIRECTS)));
            }

            debug!(from = %current, to = %next, "following redirect");
            response = self.send(&next).await?;
            chain.push(next);
        }

        Ok((chain, response))
    }

    // Sends one GET request
    //
    // The Host header override only applies while we're still talking to the
    // server under test. A redirect to some other site goes out as normal.
    async fn send(&self, url: &Url) -> Result<Response, CheckResult> {
        let mut request = self.client.get(url.clone());
        if self.is_server_under_test(url) {
            request = request.header(HOST, self.target.virtual_host.as_str());
        }

        match request.send().await {
            Ok(response) => {
                debug!(
                    %url,
                    host = %self.target.virtual_host,
                    status = response.status().as_u16(),
                    "response"
                );
                Ok(response)
            }
            Err(e) => {
                let message = describe_error(&e);
                debug!(%url, host = %self.target.virtual_host, error = %message, "request failed");
                Err(CheckResult::fail(message))
            }
        }
    }

    // Joins a config path onto the server's base URL
    //
    // "/about" replaces the path, "about" is resolved relative to it, and a
    // full URL replaces everything.
    fn make_url(&self, path: &str) -> Result<Url, CheckResult> {
        let base = self.base.as_ref().map_err(|e| CheckResult::fail(e.clone()))?;
        base.join(path)
            .map_err(|e| CheckResult::fail(format!("Invalid path {:?}: {}", path, e)))
    }

    fn is_server_under_test(&self, url: &Url) -> bool {
        match &self.base {
            Ok(base) => {
                url.host_str() == base.host_str()
                    && url.port_or_known_default() == base.port_or_known_default()
            }
            Err(_) => false,
        }
    }
}

// Where a 3xx response points, resolved against the URL that produced it
fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

// Compares the first redirect hop with what the config expects
//
// The expected value is resolved against the requested URL first, so
// "/new" and "https://www.example.com/new" both work. Anything that can't
// be resolved is compared as plain text.
fn hop_matches(requested: &Url, hop: &Url, expected: &str) -> bool {
    match requested.join(expected) {
        Ok(expected) => &expected == hop,
        Err(_) => hop.as_str() == expected,
    }
}

// reqwest's Display only shows the outermost error ("error sending request
// for url ..."), the interesting part (connection refused, dns error) is
// further down the source chain.
fn describe_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    message
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why follow redirects by hand?
//    - reqwest's redirect policy only tells us about the hop it is deciding on
//    - Walking the chain ourselves gives us every URL in order
//    - It also lets us decide per hop whether to send the Host override
//
// 2. Why Result<CheckResult, CheckResult>?
//    - The ? operator can bail out early on a failed request
//    - Both sides are a CheckResult, so unwrap_or_else(|failed| failed)
//      turns it back into a single value
//
// 3. Slice patterns in run():
//    - [path] only matches a one-element slice
//    - [path, header, content] binds all three at once
//    - Anything else falls through to the _ arm
// -----------------------------------------------------------------------------
