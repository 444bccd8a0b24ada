mod common;

use std::fs;
use std::path::Path;

use common::*;

#[test]
fn input_from_file() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("in.txt");
	fs::write(&input, "from the file\n").unwrap();
	let out = run(&format!("cat < {}", path_str(&input)));
	assert_eq!(stdout(&out), "from the file\n");
}

#[test]
fn later_redirect_wins() {
	let dir = tempfile::tempdir().unwrap();
	let a = dir.path().join("a");
	let b = dir.path().join("b");
	run(&format!("printf %s x > {} > {}", path_str(&a), path_str(&b)));
	assert_eq!(fs::read_to_string(&a).unwrap(), "");
	assert_eq!(fs::read_to_string(&b).unwrap(), "x");
}

#[test]
fn truncate_then_append() {
	let dir = tempfile::tempdir().unwrap();
	let f = dir.path().join("f");
	fs::write(&f, "stale content").unwrap();
	run(&format!("printf %s a > {f}; printf %s b >> {f}", f = path_str(&f)));
	assert_eq!(fs::read_to_string(&f).unwrap(), "ab");
}

#[test]
fn stderr_follows_stdout_into_file() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing");
	let log = dir.path().join("log");
	let out = run(&format!("cat {} > {} 2>&1", path_str(&missing), path_str(&log)));
	assert_eq!(stderr(&out), "");
	assert!(fs::read_to_string(&log).unwrap().contains("No such file or directory"));
}

#[test]
fn stderr_into_pipe() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing");
	let out = run(&format!("cat {} 2>&1 | tr a-z A-Z", path_str(&missing)));
	assert!(stdout(&out).contains("NO SUCH FILE OR DIRECTORY"));
}

#[test]
fn redirect_overrides_pipe() {
	let dir = tempfile::tempdir().unwrap();
	let f = dir.path().join("f");
	let out = run(&format!("printf %s x > {} | wc -c", path_str(&f)));
	assert_eq!(stdout(&out).trim(), "0");
	assert_eq!(fs::read_to_string(&f).unwrap(), "x");
}

#[test]
fn failed_open_aborts_only_that_step() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing.txt");
	let out = run(&format!("cat < {}; printf %s next", path_str(&missing)));
	let expected = format!("{}: No such file or directory", path_str(&missing));
	assert!(stderr(&out).contains(&expected));
	assert_eq!(stdout(&out), "next");
}

#[test]
fn every_failed_redirect_is_reported() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing.txt");
	let out = run(&format!("cat < {} > {}", path_str(&missing), path_str(dir.path())));
	let err = stderr(&out);
	assert!(err.contains("No such file or directory"));
	assert!(err.contains("Is a directory"));
}

#[test]
fn tilde_target_uses_home() {
	let home = tempfile::tempdir().unwrap();
	let out = ish()
		.env("HOME", home.path())
		.arg("-c")
		.arg("printf %s t > ~/out.txt")
		.output()
		.unwrap();
	assert!(out.status.success());
	assert_eq!(fs::read_to_string(home.path().join("out.txt")).unwrap(), "t");
}

#[test]
fn builtin_output_can_be_redirected() {
	let dir = tempfile::tempdir().unwrap();
	let f = dir.path().join("cwd");
	run_in(dir.path(), &format!("pwd > {}", path_str(&f)));
	let printed = fs::read_to_string(&f).unwrap();
	assert_eq!(canonical(Path::new(printed.trim())), canonical(dir.path()));
}

#[test]
fn alias_before_file_keeps_original_stdout() {
	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("missing");
	let log = dir.path().join("log");
	let out = run(&format!("cat {} 2>&1 > {}", path_str(&missing), path_str(&log)));
	assert!(stdout(&out).contains("No such file or directory"));
	assert_eq!(fs::read_to_string(&log).unwrap(), "");
}

fn script(dir: &Path, name: &str, body: &str) {
	use std::os::unix::fs::PermissionsExt;
	let path = dir.join(name);
	fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
	fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn extra_descriptor_opened_on_its_own_number() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("b"), "B").unwrap();
	script(dir.path(), "read3.sh", "cat <&3");
	let out = run_in(dir.path(), "./read3.sh 3< b");
	assert_eq!(stderr(&out), "");
	assert_eq!(stdout(&out), "B");
}

#[test]
fn extra_descriptors_with_crossed_numbers() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("a"), "A").unwrap();
	fs::write(dir.path().join("b"), "B").unwrap();
	script(dir.path(), "read34.sh", "cat <&3\ncat <&4");
	// `a` is opened first and lands on 3, `b` on 4: the reverse of their targets.
	let out = run_in(dir.path(), "./read34.sh 4< a 3< b");
	assert_eq!(stderr(&out), "");
	assert_eq!(stdout(&out), "BA");
}

#[test]
fn alias_of_extra_descriptor() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("in.txt"), "via three").unwrap();
	let out = run_in(dir.path(), "cat 3< in.txt <&3");
	assert_eq!(stdout(&out), "via three");
}
