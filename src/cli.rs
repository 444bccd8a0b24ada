//! Command-line arguments for the `ish` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
	name = "ish",
	version,
	about = "A small Unix shell: pipelines, redirections and background jobs.",
	long_about = None
)]
pub struct CliArgs {
	/// Run this one line and exit instead of reading from stdin.
	#[arg(short = 'c', value_name = "LINE")]
	pub command: Option<String>,

	/// Session log read by `history` and `lastcommand`.
	///
	/// Default: `$HOME/.ish_history`.
	#[arg(long, value_name = "PATH")]
	pub history_file: Option<PathBuf>,

	/// Logging level (error, warn, info, debug, trace).
	///
	/// If omitted, `ISH_LOG` or `warn` is used.
	#[arg(long, value_enum, value_name = "LEVEL")]
	pub log_level: Option<LogLevel>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

pub fn parse() -> CliArgs {
	CliArgs::parse()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let args = CliArgs::try_parse_from(["ish"]).unwrap();
		assert_eq!(args.command, None);
		assert_eq!(args.history_file, None);
		assert_eq!(args.log_level, None);
	}

	#[test]
	fn all_flags() {
		let args = CliArgs::try_parse_from([
			"ish", "-c", "ls | wc", "--history-file", "/tmp/h", "--log-level", "debug",
		]).unwrap();
		assert_eq!(args.command.as_deref(), Some("ls | wc"));
		assert_eq!(args.history_file, Some(PathBuf::from("/tmp/h")));
		assert_eq!(args.log_level, Some(LogLevel::Debug));
	}
}
