// src/checker/mod.rs
// =============================================================================
// This module contains the checks themselves.
//
// Submodules:
// - http: The Checker, which makes requests and judges the responses
// - registry: Maps check names from the config file to check kinds
//
// This file (mod.rs) is the module root - it re-exports the public API so the
// rest of the app can write `checker::Checker` instead of
// `checker::http::Checker`.
// =============================================================================

mod http;
mod registry;

pub use http::{build_client, CheckResult, Checker};
pub use registry::{CheckKind, CheckRegistry};
