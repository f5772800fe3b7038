pub mod logging;

use crate::cli::globals::Environment;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_CORS_ORIGIN: &str = "cors-origin";
pub const ARG_ENVIRONMENT: &str = "environment";

#[must_use]
pub fn validator_environment() -> ValueParser {
    ValueParser::from(|value: &str| value.parse::<Environment>())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("portal")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("5000")
                .env("PORTAL_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long("cors-origin")
                .help("Origin allowed to make credentialed cross-origin requests")
                .long_help(
                    "Origin allowed to make credentialed cross-origin requests, example: http://localhost:5173. When unset no cross-origin access is granted.",
                )
                .env("PORTAL_CORS_ORIGIN"),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .short('e')
                .long("env")
                .help("Deployment environment: development or production")
                .default_value("production")
                .env("PORTAL_ENV")
                .value_parser(validator_environment()),
        );

    logging::with_args(command)
}
