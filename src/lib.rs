//! # Portal
//!
//! `portal` is the backend half of a small business portal. It carries two
//! pieces:
//!
//! - [`wizard`]: the client-side authentication flows (sign-in, sign-up and the
//!   three-step password-reset wizard) as sans-IO state machines. Each flow
//!   validates its own form, hands out a typed request when a submission is
//!   accepted and applies the reply from an [`wizard::AuthGateway`]. Two
//!   gateways ship with the crate: [`wizard::SimulatedGateway`] (fixed delay,
//!   always succeeds) and [`wizard::HttpGateway`] (JSON over `reqwest`).
//! - [`api`]: the HTTP service. It exposes a single health check, the
//!   `OpenAPI` document and its UI, and renders every failure through one
//!   error handler.
//!
//! The [`cli`] module parses configuration from flags and `PORTAL_*`
//! environment variables and starts the service.

pub mod api;
pub mod cli;
pub mod wizard;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
