use crate::cli::{
    actions::{server::Args, Action},
    commands::{ARG_CORS_ORIGIN, ARG_ENVIRONMENT, ARG_PORT},
    globals::Environment,
};
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);
    let cors_origin = matches
        .get_one::<String>(ARG_CORS_ORIGIN)
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty());
    let environment = matches
        .get_one::<Environment>(ARG_ENVIRONMENT)
        .copied()
        .unwrap_or_default();

    Ok(Action::Server(Args {
        port,
        cors_origin,
        environment,
    }))
}
