//! Process orchestration: "spawn a closure, await its status".
//!
//! Concurrency in the engine comes exclusively from forked OS processes.
//! Running a branch through [`spawn`] gives it a copy-on-write snapshot of
//! the working directory and environment, which is exactly the isolation
//! the pipe/parallel operators need for builtin side effects.

use std::os::fd::{AsRawFd, OwnedFd};
use std::process;

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, fork, ForkResult, Pid};

use crate::error::SIGNAL_STATUS_BASE;

/// Handle to a spawned child; must be reaped with [`wait`].
#[derive(Debug)]
pub struct ChildHandle {
    pid: Pid,
}

impl ChildHandle {
    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }
}

/// How a child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Exited(i32),
    Signaled(i32),
}

impl ProcessStatus {
    /// Collapse into a single exit status; signal deaths land in the
    /// conventional 128+signo range, never 0.
    pub fn code(&self) -> i32 {
        match *self {
            ProcessStatus::Exited(code) => code,
            ProcessStatus::Signaled(signo) => SIGNAL_STATUS_BASE + signo,
        }
    }
}

/// Fork; the child runs `child_main` and exits with the status it returns.
///
/// The closure never returns in the child: its status goes straight to
/// `process::exit`, so no child-side stack unwinds back into the caller.
pub fn spawn<F>(child_main: F) -> Result<ChildHandle, Errno>
where
    F: FnOnce() -> i32,
{
    // Safety: the child only runs engine code that either execs, exits, or
    // recurses into the interpreter; it never returns into the caller.
    match unsafe { fork() }? {
        ForkResult::Parent { child } => {
            debug!("spawned child {}", child);
            Ok(ChildHandle { pid: child })
        }
        ForkResult::Child => {
            let code = child_main();
            process::exit(code);
        }
    }
}

/// Block until the child terminates. Stop/continue events cannot occur
/// (no WUNTRACED), so anything other than exit/signal is retried.
pub fn wait(child: ChildHandle) -> Result<ProcessStatus, Errno> {
    loop {
        match waitpid(child.pid, None) {
            Ok(WaitStatus::Exited(pid, code)) => {
                debug!("child {} exited with {}", pid, code);
                return Ok(ProcessStatus::Exited(code));
            }
            Ok(WaitStatus::Signaled(pid, signal, _core_dumped)) => {
                debug!("child {} killed by signal {}", pid, signal);
                return Ok(ProcessStatus::Signaled(signal as i32));
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Anonymous unidirectional channel: `(read_end, write_end)`.
pub fn pipe_channel() -> Result<(OwnedFd, OwnedFd), Errno> {
    unistd::pipe()
}

/// Producer side of a pipe, called in the left child: the read end is
/// closed, the write end replaces stdout. Both raw fds are gone afterwards
/// so the consumer sees EOF as soon as this process (and its children) are
/// done writing.
pub fn bind_pipe_writer(read_end: &OwnedFd, write_end: &OwnedFd) -> Result<(), Errno> {
    unistd::close(read_end.as_raw_fd())?;
    unistd::dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO)?;
    unistd::close(write_end.as_raw_fd())?;
    Ok(())
}

/// Consumer side, called in the right child: write end closed, read end
/// replaces stdin.
pub fn bind_pipe_reader(read_end: &OwnedFd, write_end: &OwnedFd) -> Result<(), Errno> {
    unistd::close(write_end.as_raw_fd())?;
    unistd::dup2(read_end.as_raw_fd(), libc::STDIN_FILENO)?;
    unistd::close(read_end.as_raw_fd())?;
    Ok(())
}
