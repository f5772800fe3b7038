use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// `PORTAL_LOG_LEVEL` takes a level name or its index (0 = error, 4 = trace).
fn parse_level(level: &str) -> std::result::Result<u8, String> {
    let level = level.trim().to_lowercase();

    level
        .parse::<u8>()
        .ok()
        .filter(|index| usize::from(*index) < LEVELS.len())
        .or_else(|| {
            LEVELS
                .iter()
                .position(|name| *name == level)
                .and_then(|index| u8::try_from(index).ok())
        })
        .ok_or_else(|| {
            format!(
                "invalid log level: {level} (expected one of {})",
                LEVELS.join(", ")
            )
        })
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise log verbosity: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE (default: ERROR). Also read from PORTAL_LOG_LEVEL")
            .env("PORTAL_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
