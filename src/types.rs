use std::os::unix::io::RawFd;

use crate::global::Config;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectMode { Truncate, Append, Read }

/// One stream remapping request: rebind `from` to `target` before the step runs.
///
/// `target` is a path (possibly `~`-prefixed) or `&N` to alias descriptor `N`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RedirectSpec {
	pub from: RawFd,
	pub mode: RedirectMode,
	pub target: String,
}

impl RedirectSpec {
	pub fn new(from: RawFd, mode: RedirectMode, target: impl Into<String>) -> RedirectSpec {
		RedirectSpec { from: from, mode: mode, target: target.into() }
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommandStep {
	pub name: String,
	pub arguments: Vec<String>,
	pub redirects: Vec<RedirectSpec>,
}

impl CommandStep {
	pub fn new(name: impl Into<String>, arguments: Vec<String>, redirects: Vec<RedirectSpec>) -> CommandStep {
		let name = name.into();
		debug_assert!(!name.is_empty(), "command name must not be empty");
		CommandStep { name: name, arguments: arguments, redirects: redirects }
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub steps: Vec<CommandStep>,
	pub is_background: bool,
}

impl Pipeline {
	pub fn new(steps: Vec<CommandStep>, is_background: bool) -> Pipeline {
		Pipeline { steps: steps, is_background: is_background }
	}

	/// The single step of a one-command pipeline, if that is what this is.
	pub fn sole_step(&self) -> Option<&CommandStep> {
		match self.steps.as_slice() {
			[step] => Some(step),
			_ => None,
		}
	}
}

/// Everything typed on one line, bound to the session configuration.
#[derive(Debug)]
pub struct Sequence<'a> {
	pub pipelines: Vec<Pipeline>,
	pub config: &'a Config,
}

impl<'a> Sequence<'a> {
	pub fn new(config: &'a Config, pipelines: Vec<Pipeline>) -> Sequence<'a> {
		Sequence { pipelines: pipelines, config: config }
	}
}
