// src/config/target.rs
// =============================================================================
// Turns a target identifier from the config file into a Target.
//
// A target is a virtual host living on the server we are testing:
// - The TCP connection always goes to the server given on the command line
// - The target's name is what we put in the Host header
// - An optional http:// or https:// prefix picks the protocol
//
// Examples (server = "10.0.0.5:8080"):
//   "www.example.com"          -> https, Host: www.example.com
//   "http://legacy.example.com" -> http, Host: legacy.example.com
// =============================================================================

use std::fmt;

/// Which scheme we speak to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One virtual host under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub protocol: Protocol,
    /// host[:port] the TCP connection is made to
    pub connect_host: String,
    /// Value of the Host header
    pub virtual_host: String,
}

impl Target {
    // Parses a target identifier
    //
    // The scheme check is case-insensitive ("HTTP://x" is http).
    // Anything without a recognised scheme defaults to https.
    pub fn parse(identifier: &str, connect_host: &str) -> Self {
        let (protocol, rest) = if let Some(rest) = strip_prefix_ignore_case(identifier, "https://") {
            (Protocol::Https, rest)
        } else if let Some(rest) = strip_prefix_ignore_case(identifier, "http://") {
            (Protocol::Http, rest)
        } else {
            (Protocol::Https, identifier)
        };

        Self {
            protocol,
            connect_host: connect_host.to_string(),
            virtual_host: rest.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL every check path is joined onto
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.connect_host)
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
