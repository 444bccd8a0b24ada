//! Error types shared by the engine.

use std::{ffi, fmt, io};

use nix::errno::Errno;
use thiserror::Error;

/// Low-level failure while setting up or replacing a process.
#[derive(Error, Debug)]
pub enum ExecError {
	#[error("{0}")]
	Nix(#[from] nix::Error),

	#[error("{0}")]
	Io(#[from] io::Error),

	#[error("argument contains a nul byte: {0}")]
	Nul(#[from] ffi::NulError),
}

/// Why an open or a directory change failed, reduced from errno.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause {
	NotFound,
	PermissionDenied,
	IsADirectory,
	NotADirectory,
	Other(String),
}

impl Cause {
	pub fn from_errno(errno: Errno) -> Cause {
		match errno {
			Errno::ENOENT => Cause::NotFound,
			Errno::EACCES | Errno::EPERM => Cause::PermissionDenied,
			Errno::EISDIR => Cause::IsADirectory,
			Errno::ENOTDIR => Cause::NotADirectory,
			e => Cause::Other(e.desc().to_string()),
		}
	}

	pub fn from_io(e: &io::Error) -> Cause {
		match e.raw_os_error() {
			Some(code) => Cause::from_errno(Errno::from_i32(code)),
			None => Cause::Other(e.to_string()),
		}
	}
}

impl fmt::Display for Cause {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Cause::NotFound => f.write_str("No such file or directory"),
			Cause::PermissionDenied => f.write_str("Permission denied"),
			Cause::IsADirectory => f.write_str("Is a directory"),
			Cause::NotADirectory => f.write_str("Not a directory"),
			Cause::Other(ref msg) => f.write_str(msg),
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{target}: {cause}")]
pub struct RedirectError {
	pub target: String,
	pub cause: Cause,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cd: {path}: {cause}")]
pub struct ChdirError {
	pub path: String,
	pub cause: Cause,
}

/// A step that could not reach its program.
#[derive(Error, Debug)]
pub enum InvokeError {
	#[error("{}", join_lines(.0))]
	Redirect(Vec<RedirectError>),

	#[error("{name}: {source}")]
	Exec {
		name: String,
		#[source]
		source: ExecError,
	},
}

fn join_lines(errors: &[RedirectError]) -> String {
	errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn errno_taxonomy() {
		assert_eq!(Cause::from_errno(Errno::ENOENT), Cause::NotFound);
		assert_eq!(Cause::from_errno(Errno::EACCES), Cause::PermissionDenied);
		assert_eq!(Cause::from_errno(Errno::EISDIR), Cause::IsADirectory);
		assert_eq!(Cause::from_errno(Errno::ENOTDIR), Cause::NotADirectory);
		assert!(matches!(Cause::from_errno(Errno::EBADF), Cause::Other(_)));
	}

	#[test]
	fn io_errors_use_raw_errno() {
		let e = io::Error::from_raw_os_error(libc::ENOTDIR);
		assert_eq!(Cause::from_io(&e), Cause::NotADirectory);
		let e = io::Error::new(io::ErrorKind::Other, "synthetic");
		assert_eq!(Cause::from_io(&e), Cause::Other("synthetic".to_string()));
	}

	#[test]
	fn redirect_errors_are_listed_one_per_line() {
		let err = InvokeError::Redirect(vec![
			RedirectError { target: "a".to_string(), cause: Cause::NotFound },
			RedirectError { target: "b".to_string(), cause: Cause::IsADirectory },
		]);
		assert_eq!(err.to_string(), "a: No such file or directory\nb: Is a directory");
	}

	#[test]
	fn chdir_message() {
		let err = ChdirError { path: "/nope".to_string(), cause: Cause::NotFound };
		assert_eq!(err.to_string(), "cd: /nope: No such file or directory");
	}
}
