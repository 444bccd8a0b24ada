//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Level priority: `--log-level`, then the `ISH_LOG` environment variable,
//! then `warn`. Records go to stderr; stdout belongs to the commands.

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

const LOG_ENV: &str = "ISH_LOG";

/// Installs the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
	let level = match cli_level {
		Some(lvl) => level_from_log_level(lvl),
		None => std::env::var(LOG_ENV)
			.ok()
			.and_then(|s| parse_level_str(&s))
			.unwrap_or(tracing::Level::WARN),
	};

	fmt()
		.with_max_level(level)
		.with_target(false)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
	match lvl {
		LogLevel::Error => tracing::Level::ERROR,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Trace => tracing::Level::TRACE,
	}
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
	match s.trim().to_lowercase().as_str() {
		"error" => Some(tracing::Level::ERROR),
		"warn" | "warning" => Some(tracing::Level::WARN),
		"info" => Some(tracing::Level::INFO),
		"debug" => Some(tracing::Level::DEBUG),
		"trace" => Some(tracing::Level::TRACE),
		_ => None,
	}
}
