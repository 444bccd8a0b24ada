use std::path::{Path, PathBuf};

use nix::unistd::{self, AccessFlags};
use tracing::trace;

const LITERAL_PREFIXES: [&str; 3] = ["./", "../", "/"];

/// Splits a `PATH`-style value on `:`. Empty segments are kept; they stand
/// for the current directory.
pub fn resolve_search_paths(path_var: &str) -> Vec<String> {
	path_var.split(':').map(String::from).collect()
}

fn exists(path: &Path) -> bool {
	unistd::access(path, AccessFlags::F_OK).is_ok()
}

/// Finds the file to execute for `name`.
///
/// Path-like names (`./x`, `../x`, `/x`) are only checked literally. Bare
/// names are looked up in `search_paths`, first hit wins. This is an
/// existence test only; permissions are left for `execve` to judge.
pub fn resolve_executable(name: &str, search_paths: &[String]) -> Option<PathBuf> {
	if LITERAL_PREFIXES.iter().any(|p| name.starts_with(p)) {
		let path = PathBuf::from(name);
		return if exists(&path) { Some(path) } else { None };
	}
	for dir in search_paths {
		let dir = if dir.is_empty() { "." } else { dir.as_str() };
		let candidate = PathBuf::from(format!("{}/{}", dir, name));
		trace!(candidate = %candidate.display(), "checking candidate");
		if exists(&candidate) {
			return Some(candidate);
		}
	}
	None
}
