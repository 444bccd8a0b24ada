use std::borrow::Cow;
use std::env;
use std::path::{Path, PathBuf};

use crate::search;

const PATH_KEY: &str = "PATH";
const HOME_KEY: &str = "HOME";
pub const HISTORY_FILE_NAME: &str = ".ish_history";

/// Session-wide settings, captured once at startup and never re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub search_paths: Vec<String>,
	pub home: String,
	pub history_file: PathBuf,
}

impl Config {
	pub fn from_env() -> Config {
		let search_paths = env::var(PATH_KEY)
			.map(|p| search::resolve_search_paths(&p))
			.unwrap_or_default();
		let home = env::var(HOME_KEY).unwrap_or_default();
		Config::new(search_paths, home)
	}

	pub fn new(search_paths: Vec<String>, home: impl Into<String>) -> Config {
		let home = home.into();
		let history_file = Path::new(&home).join(HISTORY_FILE_NAME);
		Config { search_paths: search_paths, home: home, history_file: history_file }
	}

	pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Config {
		self.history_file = path.into();
		self
	}

	/// `~` becomes the home directory and `~/rest` becomes `home/rest`.
	/// Anything else, or any input when home is unknown, is returned as is.
	pub fn expand_tilde<'s>(&self, s: &'s str) -> Cow<'s, str> {
		if self.home.is_empty() {
			return Cow::Borrowed(s);
		}
		if s == "~" {
			Cow::Owned(self.home.clone())
		} else if let Some(rest) = s.strip_prefix("~/") {
			Cow::Owned(format!("{}/{}", self.home.trim_end_matches('/'), rest))
		} else {
			Cow::Borrowed(s)
		}
	}
}
