#[macro_use]
extern crate tracing;

mod app;

pub use app::App;
use color_eyre::Result;
pub use oss_stats_config::{
    Args,
    Command,
    Config,
};
use tracing_subscriber::{
    prelude::*,
    EnvFilter,
};

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// Logs go to stderr so stdout only carries command output such as the commit message.
/// `RUST_LOG` overrides the level chosen by `--verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "oss_stats={level},oss_stats_config={level},oss_stats_gatherer={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}
