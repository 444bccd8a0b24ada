use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use nix::unistd;
use tracing::debug;

use crate::errors::{Cause, ChdirError};
use crate::global::Config;
use crate::types::CommandStep;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin { Cd, Exit, Pwd, History, LastCommand }

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(Builtin::Cd),
		"exit" => Some(Builtin::Exit),
		"pwd" => Some(Builtin::Pwd),
		"history" => Some(Builtin::History),
		"lastcommand" => Some(Builtin::LastCommand),
		_ => None,
	}
}

/// Where `cd path` should go: home for an empty path, tilde-expanded for
/// `~` forms, verbatim otherwise.
pub fn cd_target(config: &Config, path: &str) -> String {
	if path.is_empty() {
		config.home.clone()
	} else {
		config.expand_tilde(path).into_owned()
	}
}

/// Changes the working directory of the calling process. On failure the
/// directory is left as it was.
pub fn change_directory(config: &Config, path: &str) -> Result<PathBuf, ChdirError> {
	let target = cd_target(config, path);
	if target.is_empty() {
		return Err(ChdirError { path: path.to_string(), cause: Cause::NotFound });
	}
	unistd::chdir(target.as_str())
		.map_err(|e| ChdirError { path: target.clone(), cause: Cause::from_errno(e) })?;
	debug!(%target, "changed directory");
	Ok(PathBuf::from(target))
}

pub fn pwd<W: Write>(out: &mut W) -> io::Result<()> {
	let cwd = env::current_dir()?;
	writeln!(out, "{}", cwd.display())?;
	out.flush()
}

/// The external command `history` and `lastcommand` hand off to, reading the
/// session log. Extra arguments go before the log path.
pub fn log_dump_step(builtin: Builtin, config: &Config, arguments: &[String]) -> Option<CommandStep> {
	let (name, mut args) = match builtin {
		Builtin::History => ("cat", vec![]),
		Builtin::LastCommand => ("tail", vec!["-n".to_string(), "1".to_string()]),
		_ => return None,
	};
	args.extend(arguments.iter().cloned());
	args.push(config.history_file.to_string_lossy().into_owned());
	Some(CommandStep::new(name, args, vec![]))
}
