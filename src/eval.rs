//! Running a parsed line.
//!
//! Three roles, each in its own process:
//!
//! * the session ([`Sequence::execute`]) runs `cd`/`exit` itself and forks one
//!   coordinator per remaining pipeline;
//! * the coordinator ([`execute_pipeline`]) creates the pipes, forks one step
//!   process per command and waits for all of them;
//! * a step ([`invoke`]) wires its streams and replaces itself with the
//!   program.

use std::convert::Infallible;
use std::env;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use nix::unistd::{self, ForkResult, Pid};
use tracing::{debug, error, info};

use crate::builtin::{self, Builtin};
use crate::errors::{ExecError, InvokeError};
use crate::global::Config;
use crate::job::{self, WaitStatusExt};
use crate::redirect::RedirectPlan;
use crate::search;
use crate::types::{CommandStep, Pipeline, Sequence};

/// Status of a process that could not create its pipes or children.
pub const EXIT_FATAL: i32 = 1;
/// Status of a step whose redirects failed to open.
pub const EXIT_REDIRECT: i32 = 1;
/// Status of a step whose program was found but could not be executed.
pub const EXIT_EXEC: i32 = 126;
/// Status of a session-level `cd` that failed.
pub const EXIT_CD: i32 = 1;

/// What the caller of [`Sequence::execute`] should do next. `Continue`
/// carries the status of the last pipeline that ran.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Control { Continue(i32), Exit }

/// How a step ended when it did not replace its image.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitOutcome {
	/// A built-in ran to completion in the step process.
	Success,
	/// `cd` or `exit` inside a pipeline; warned and did nothing.
	NoOp,
	/// The program name did not resolve.
	NotFound,
}

impl ExitOutcome {
	/// Lookup misses deliberately share status 0 with successful built-ins.
	pub fn code(self) -> i32 {
		match self {
			ExitOutcome::Success | ExitOutcome::NoOp | ExitOutcome::NotFound => 0,
		}
	}
}

fn flush_stdio() {
	let _ = io::stdout().flush();
	let _ = io::stderr().flush();
}

/// Leaves a forked child without running the parent's exit handlers.
fn exit_process(code: i32) -> ! {
	flush_stdio();
	unsafe { libc::_exit(code) }
}

/// Body of a forked child. A panic must not unwind back into the code that
/// forked it, so it ends the process like any other fatal error.
fn child_main<F: FnOnce() -> i32>(f: F) -> ! {
	match panic::catch_unwind(AssertUnwindSafe(f)) {
		Ok(code) => exit_process(code),
		Err(_) => exit_process(EXIT_FATAL),
	}
}

impl<'a> Sequence<'a> {
	/// Runs every pipeline in order.
	///
	/// Returns [`Control::Exit`] as soon as a lone `exit` is reached; the
	/// pipelines after it do not run. Pipelines without steps are skipped.
	pub fn execute(&self) -> Control {
		let reaped = job::reap_finished();
		if reaped > 0 {
			debug!(reaped, "collected finished background pipelines");
		}
		let mut status = 0;
		for pipeline in &self.pipelines {
			if pipeline.steps.is_empty() {
				continue;
			}
			if let Some(step) = pipeline.sole_step() {
				match builtin::match_builtin(&step.name) {
					Some(Builtin::Cd) => {
						let path = step.arguments.first().map(String::as_str).unwrap_or("");
						status = match builtin::change_directory(self.config, path) {
							Ok(_) => 0,
							Err(e) => {
								eprintln!("{}", e);
								EXIT_CD
							},
						};
						continue;
					},
					Some(Builtin::Exit) => return Control::Exit,
					_ => {},
				}
			}
			status = launch(self.config, pipeline).unwrap_or_else(|e| {
				eprintln!("ish: {}", e);
				EXIT_FATAL
			});
		}
		Control::Continue(status)
	}
}

/// Forks the coordinator for `pipeline` and, unless it runs in the
/// background, waits for it and returns its status. A background pipeline
/// counts as status 0.
///
/// The session holds no pipe descriptors before or after this call.
fn launch(config: &Config, pipeline: &Pipeline) -> Result<i32, ExecError> {
	flush_stdio();
	match unsafe { unistd::fork() }? {
		ForkResult::Parent { child } => {
			if pipeline.is_background {
				info!(pid = %child, "pipeline started in background");
				return Ok(0);
			}
			let code = job::wait_for(child)?.code();
			debug!(pid = %child, code, "pipeline finished");
			Ok(code)
		},
		ForkResult::Child => child_main(|| run_coordinator(config, pipeline)),
	}
}

fn run_coordinator(config: &Config, pipeline: &Pipeline) -> i32 {
	match execute_pipeline(config, pipeline) {
		Ok(code) => code,
		Err(e) => {
			error!(error = %e, "pipeline aborted");
			eprintln!("ish: {}", e);
			EXIT_FATAL
		},
	}
}

struct Pipe {
	read: OwnedFd,
	write: OwnedFd,
}

fn open_pipes(count: usize) -> Result<Vec<Pipe>, ExecError> {
	(0 .. count).map(|_| -> Result<Pipe, ExecError> {
		let (read, write) = unistd::pipe()?;
		// Freshly created and owned by nobody else.
		let pipe = unsafe { Pipe { read: OwnedFd::from_raw_fd(read), write: OwnedFd::from_raw_fd(write) } };
		Ok(pipe)
	}).collect()
}

/// Coordinator role: runs every step of `pipeline` and returns the exit code
/// of the last one.
///
/// All `n - 1` pipes exist before the first fork; if any cannot be created
/// nothing runs. On return every pipe descriptor has been closed here and all
/// forked steps have been waited for, including when a fork fails midway.
pub fn execute_pipeline(config: &Config, pipeline: &Pipeline) -> Result<i32, ExecError> {
	let n = pipeline.steps.len();
	if n == 0 {
		return Ok(0);
	}

	let mut pipes = open_pipes(n - 1)?;
	let mut children = Vec::with_capacity(n);
	let spawned = spawn_steps(config, pipeline, &mut pipes, &mut children);
	drop(pipes);

	let statuses = job::wait_all(&children);
	debug!(steps = n, waited = statuses.len(), "pipeline steps finished");
	spawned?;
	Ok(statuses.last().map_or(0, |s| s.code()))
}

fn spawn_steps(config: &Config, pipeline: &Pipeline, pipes: &mut Vec<Pipe>, children: &mut Vec<Pid>) -> Result<(), ExecError> {
	let n = pipeline.steps.len();
	for (i, step) in pipeline.steps.iter().enumerate() {
		flush_stdio();
		match unsafe { unistd::fork() }? {
			ForkResult::Parent { child } => {
				debug!(pid = %child, step = %step.name, index = i, "spawned step");
				children.push(child);
			},
			ForkResult::Child => child_main(|| {
				let wired = wire_step(pipes, i, n);
				drop(std::mem::take(pipes));
				if let Err(e) = wired {
					eprintln!("ish: {}: {}", step.name, e);
					return EXIT_FATAL;
				}
				exec_step(config, step)
			}),
		}
	}
	Ok(())
}

/// Points stdout at pipe `i` and stdin at pipe `i - 1` where those exist.
fn wire_step(pipes: &[Pipe], i: usize, n: usize) -> nix::Result<()> {
	if i + 1 < n {
		unistd::dup2(pipes[i].write.as_raw_fd(), libc::STDOUT_FILENO)?;
	}
	if i > 0 {
		unistd::dup2(pipes[i - 1].read.as_raw_fd(), libc::STDIN_FILENO)?;
	}
	Ok(())
}

/// Step role entry point. On entry the process holds no pipe descriptors
/// other than its own stdin/stdout. Returns only when no program replaced
/// the process, with the status the step should exit with.
fn exec_step(config: &Config, step: &CommandStep) -> i32 {
	match invoke(config, step) {
		Ok(outcome) => outcome.code(),
		Err(e) => {
			eprintln!("{}", e);
			match e {
				InvokeError::Redirect(_) => EXIT_REDIRECT,
				InvokeError::Exec { .. } => EXIT_EXEC,
			}
		},
	}
}

/// Applies the step's redirects and runs it.
///
/// Does not return when a program was executed. Built-ins and lookup misses
/// come back as an [`ExitOutcome`]; a step that could not be set up comes back
/// as an error, with every redirect file it opened already closed.
pub fn invoke(config: &Config, step: &CommandStep) -> Result<ExitOutcome, InvokeError> {
	let plan = RedirectPlan::build(&step.redirects, config).map_err(InvokeError::Redirect)?;
	plan.apply().map_err(|e| exec_error(step, e.into()))?;

	match builtin::match_builtin(&step.name) {
		Some(Builtin::Cd) | Some(Builtin::Exit) => {
			eprintln!("{}: does not work inside a pipeline", step.name);
			Ok(ExitOutcome::NoOp)
		},
		Some(Builtin::Pwd) => {
			builtin::pwd(&mut io::stdout()).map_err(|e| exec_error(step, e.into()))?;
			Ok(ExitOutcome::Success)
		},
		Some(b @ Builtin::History) | Some(b @ Builtin::LastCommand) => {
			match builtin::log_dump_step(b, config, &step.arguments) {
				Some(dump) => run_program(config, &dump),
				None => Ok(ExitOutcome::NoOp),
			}
		},
		None => run_program(config, step),
	}
}

fn run_program(config: &Config, step: &CommandStep) -> Result<ExitOutcome, InvokeError> {
	let path = match search::resolve_executable(&step.name, &config.search_paths) {
		Some(path) => path,
		None => {
			eprintln!("{}: command not found", step.name);
			return Ok(ExitOutcome::NotFound);
		},
	};
	match exec_program(config, &path, step) {
		Ok(never) => match never {},
		Err(e) => Err(exec_error(step, e)),
	}
}

/// Replaces the process image. The argument and environment vectors are
/// owned by this frame and stay alive across the `execve` call.
fn exec_program(config: &Config, path: &Path, step: &CommandStep) -> Result<Infallible, ExecError> {
	let program = CString::new(path.as_os_str().as_bytes())?;
	let mut argv: Vec<CString> = Vec::with_capacity(step.arguments.len() + 1);
	argv.push(CString::new(step.name.as_str())?);
	for arg in &step.arguments {
		let arg = if arg == "~" && !config.home.is_empty() { config.home.as_str() } else { arg.as_str() };
		argv.push(CString::new(arg)?);
	}
	let envp: Vec<CString> = env::vars_os()
		.map(|(k, v)| {
			let mut kv = k.into_vec();
			kv.push(b'=');
			kv.extend(v.into_vec());
			CString::new(kv)
		})
		.collect::<Result<_, _>>()?;
	debug!(program = %path.display(), argc = argv.len(), "exec");
	flush_stdio();
	let never = unistd::execve(&program, &argv, &envp)?;
	Ok(never)
}

fn exec_error(step: &CommandStep, source: ExecError) -> InvokeError {
	InvokeError::Exec { name: step.name.clone(), source: source }
}
