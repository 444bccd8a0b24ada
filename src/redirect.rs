//! Turning a step's redirect list into descriptor bindings.
//!
//! Redirects are evaluated in two phases. [`RedirectPlan::build`] opens every
//! target and records, per descriptor, where it should finally point; nothing
//! in the process changes yet. An `&N` alias is captured as a private
//! duplicate of `N` at that moment, so later redirects of `N` cannot change
//! it. [`RedirectPlan::apply`] then performs the `dup2` calls. Every source
//! descriptor is owned by the plan and closed when it drops, whether or not
//! it was applied.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::{self, FcntlArg};
use nix::unistd;
use tracing::debug;

use crate::errors::{Cause, RedirectError};
use crate::global::Config;
use crate::types::{RedirectMode, RedirectSpec};

#[derive(Debug)]
pub enum Binding {
	File(File),
	Descriptor(OwnedFd),
}

impl Binding {
	fn raw_fd(&self) -> RawFd {
		match *self {
			Binding::File(ref f) => f.as_raw_fd(),
			Binding::Descriptor(ref fd) => fd.as_raw_fd(),
		}
	}
}

#[derive(Debug, Default)]
pub struct RedirectPlan {
	bindings: BTreeMap<RawFd, Binding>,
}

fn open_target(path: &str, mode: RedirectMode) -> std::io::Result<File> {
	let mut oopt = OpenOptions::new();
	let _ = match mode {
		RedirectMode::Read => oopt.read(true),
		RedirectMode::Truncate => oopt.write(true).create(true).truncate(true),
		RedirectMode::Append => oopt.append(true).create(true),
	};
	oopt.open(path)
}

/// `&N` targets: `Some(Some(N))` when well formed, `Some(None)` when not.
fn parse_alias(target: &str) -> Option<Option<RawFd>> {
	target.strip_prefix('&').map(|n| n.parse::<RawFd>().ok().filter(|fd| *fd >= 0))
}

fn bad_descriptor(target: &str) -> RedirectError {
	RedirectError { target: target.to_string(), cause: Cause::Other("Bad file descriptor".to_string()) }
}

/// Duplicates `fd` onto the lowest free descriptor `>= min`, close-on-exec.
fn dup_above(fd: RawFd, min: RawFd) -> nix::Result<OwnedFd> {
	let new = fcntl::fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(min))?;
	// Freshly duplicated and owned by nobody else.
	Ok(unsafe { OwnedFd::from_raw_fd(new) })
}

impl RedirectPlan {
	/// Opens every target of `redirects` in order. A later redirect for the
	/// same descriptor replaces the earlier binding. All failures are
	/// returned together; files opened so far are closed on that path.
	pub fn build(redirects: &[RedirectSpec], config: &Config) -> Result<RedirectPlan, Vec<RedirectError>> {
		let mut plan = RedirectPlan::default();
		let mut errors = vec![];
		for redirect in redirects {
			match plan.resolve(redirect, config) {
				Ok(binding) => { plan.bindings.insert(redirect.from, binding); },
				Err(e) => errors.push(e),
			}
		}
		if errors.is_empty() { Ok(plan) } else { Err(errors) }
	}

	fn resolve(&self, redirect: &RedirectSpec, config: &Config) -> Result<Binding, RedirectError> {
		if let Some(alias) = parse_alias(&redirect.target) {
			let fd = alias.ok_or_else(|| bad_descriptor(&redirect.target))?;
			// An earlier redirect of `fd` in this step wins over the inherited one.
			let source = self.bindings.get(&fd).map_or(fd, Binding::raw_fd);
			return dup_above(source, 0)
				.map(Binding::Descriptor)
				.map_err(|_| bad_descriptor(&redirect.target));
		}
		let path = config.expand_tilde(&redirect.target);
		open_target(&path, redirect.mode)
			.map(Binding::File)
			.map_err(|e| RedirectError { target: path.into_owned(), cause: Cause::from_io(&e) })
	}

	pub fn binding(&self, fd: RawFd) -> Option<&Binding> {
		self.bindings.get(&fd)
	}

	/// Rebinds every touched descriptor of the calling process. Descriptors no
	/// redirect mentioned keep whatever they were inherited as.
	///
	/// Sources are first moved above the highest target so no `dup2` can
	/// overwrite a source still waiting to be applied, and no target is left
	/// sharing a number with a close-on-exec source.
	pub fn apply(mut self) -> nix::Result<()> {
		let top = match self.bindings.keys().next_back() {
			Some(&fd) => fd,
			None => return Ok(()),
		};
		for binding in self.bindings.values_mut() {
			if binding.raw_fd() <= top {
				*binding = Binding::Descriptor(dup_above(binding.raw_fd(), top + 1)?);
			}
		}
		for (&fd, binding) in &self.bindings {
			let source = binding.raw_fd();
			debug!(fd, source, "rebinding descriptor");
			unistd::dup2(source, fd)?;
		}
		Ok(())
	}
}
