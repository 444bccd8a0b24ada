//! Waiting on child processes. There is no job table: a pipeline's
//! coordinator waits for exactly the steps it forked, and the session only
//! ever waits for the coordinator of a foreground pipeline.

use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, trace};

pub trait WaitStatusExt {
	fn is_terminated(&self) -> bool;
	fn code(&self) -> i32;
}

impl WaitStatusExt for WaitStatus {
	fn is_terminated(&self) -> bool {
		matches!(*self, WaitStatus::Exited(..) | WaitStatus::Signaled(..))
	}

	/// Shell-style status: the exit code, or 128 + signal for a killed child.
	fn code(&self) -> i32 {
		match *self {
			WaitStatus::Exited(_, code) => code,
			WaitStatus::Signaled(_, sig, _) => 128 + sig as i32,
			_ => 0,
		}
	}
}

/// Blocks until `pid` has terminated.
pub fn wait_for(pid: Pid) -> nix::Result<WaitStatus> {
	loop {
		match wait::waitpid(pid, None) {
			Ok(status) if status.is_terminated() => {
				trace!(%pid, ?status, "child terminated");
				return Ok(status);
			},
			Ok(_) | Err(Errno::EINTR) => continue,
			Err(e) => return Err(e),
		}
	}
}

/// Waits for every pid in order. A pid that can no longer be waited for is
/// skipped rather than aborting the rest.
pub fn wait_all(pids: &[Pid]) -> Vec<WaitStatus> {
	pids.iter()
		.filter_map(|&pid| match wait_for(pid) {
			Ok(status) => Some(status),
			Err(e) => {
				debug!(%pid, error = %e, "wait failed");
				None
			},
		})
		.collect()
}

/// Collects children that have already exited, without blocking.
pub fn reap_finished() -> usize {
	let mut reaped = 0;
	loop {
		match wait::waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
			Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
			Ok(status) => {
				debug!(?status, "reaped background child");
				reaped += 1;
			},
			Err(Errno::EINTR) => continue,
			Err(_) => break,
		}
	}
	reaped
}
