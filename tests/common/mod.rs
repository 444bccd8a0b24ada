#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn ish() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_ish"));
	cmd.env_remove("ISH_LOG").env("LC_ALL", "C");
	cmd
}

pub fn run(line: &str) -> Output {
	ish().arg("-c").arg(line).output().unwrap()
}

pub fn run_in(dir: &Path, line: &str) -> Output {
	ish().arg("-c").arg(line).current_dir(dir).output().unwrap()
}

pub fn stdout(output: &Output) -> String {
	String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
	String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn path_str(path: &Path) -> &str {
	path.to_str().unwrap()
}

pub fn canonical(path: &Path) -> PathBuf {
	path.canonicalize().unwrap()
}
