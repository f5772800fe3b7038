use crate::{
    api,
    cli::globals::{Environment, GlobalArgs},
};
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub cors_origin: Option<String>,
    pub environment: Environment,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the CORS origin is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let mut globals = GlobalArgs::new(args.environment);

    if let Some(origin) = args.cors_origin {
        globals.set_cors_origin(origin);
    }

    debug!("Global args: {:?}", globals);

    api::new(args.port, &globals).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("environment", args.environment.to_string()),
        (
            "cors_origin",
            args.cors_origin
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
