//! Simple-command execution: builtin dispatch, environment assignment, and
//! external program launch.

use std::env;
use std::ffi::CString;
use std::fs::File;
use std::os::unix::ffi::OsStrExt;
use std::process;

use log::{debug, error, warn};
use nix::unistd::execv;

use super::ast::SimpleCommand;
use super::interpreter::Engine;
use super::redirect;
use super::word::WordResolver;
use super::process as proc;
use crate::error::{EngineError, STATUS_CANNOT_EXEC, STATUS_NOT_FOUND};
use crate::utils::path::find_program;

impl<R: WordResolver> Engine<R> {
    /// Execute one leaf. Dispatch order: `cd`, `exit`/`quit`, environment
    /// assignment, external program.
    pub(super) fn exec_simple(&self, cmd: &SimpleCommand) -> Result<i32, EngineError> {
        let verb = self.resolver().resolve(&cmd.verb)?;

        match verb.as_str() {
            "cd" => {
                debug!("builtin cd");
                self.builtin_cd(cmd)
            }
            "exit" | "quit" => {
                debug!("builtin {} - terminating", verb);
                process::exit(0);
            }
            _ if verb.contains('=') && cmd.arguments.is_empty() => {
                debug!("assignment {}", verb);
                self.assign(&verb)
            }
            _ => self.run_external(&verb, cmd),
        }
    }

    /// Change the process-wide working directory.
    ///
    /// Like any simple command, `cd` has its output redirection evaluated:
    /// the target file is created/truncated even though nothing is written
    /// to it. Runs in the calling process, no fork.
    fn builtin_cd(&self, cmd: &SimpleCommand) -> Result<i32, EngineError> {
        if let Some(out) = &cmd.stdout {
            let path = self.resolver().resolve(out)?;
            if let Err(e) = File::create(&path) {
                warn!("cd: cannot touch redirection target {}: {}", path, e);
            }
        }

        let target = match cmd.arguments.first() {
            Some(word) => self.resolver().resolve(word)?,
            None => String::from("~"),
        };
        let target = shellexpand::tilde(&target);

        env::set_current_dir(target.as_ref())
            .map_err(|e| EngineError::Builtin(format!("cd: {}: {}", target, e)))?;
        Ok(0)
    }

    /// `NAME=VALUE` in the verb position: set a process-wide environment
    /// variable, visible to every process launched afterwards.
    ///
    /// Compatibility quirk: with more than one `=`, the value stops at the
    /// second one and the rest is dropped (`A=b=c` sets `A=b`). Strict mode
    /// rejects such assignments instead.
    fn assign(&self, verb: &str) -> Result<i32, EngineError> {
        let (name, rest) = verb
            .split_once('=')
            .ok_or_else(|| EngineError::Builtin(format!("not an assignment: {}", verb)))?;
        if name.is_empty() {
            return Err(EngineError::Builtin(format!("bad assignment: {}", verb)));
        }

        let value = match rest.split_once('=') {
            Some(_) if self.config().strict_assignments => {
                return Err(EngineError::Builtin(format!(
                    "malformed assignment: {}",
                    verb
                )));
            }
            Some((head, _discarded)) => head,
            None => rest,
        };

        if name.contains('\0') || value.contains('\0') {
            return Err(EngineError::Builtin(format!("bad assignment: {}", verb)));
        }

        env::set_var(name, value);
        Ok(0)
    }

    /// Fork, set up redirections in the child, replace its image with the
    /// named program, and reap it. Normal exit yields the child's code;
    /// signal death yields 128+signo, never success.
    fn run_external(&self, verb: &str, cmd: &SimpleCommand) -> Result<i32, EngineError> {
        debug!("launching external command {}", verb);
        let child = proc::spawn(|| self.exec_child(verb, cmd))?;
        Ok(proc::wait(child)?.code())
    }

    /// Child side of an external launch. Never returns control to the
    /// parent's code path: every failure becomes this child's exit status.
    fn exec_child(&self, verb: &str, cmd: &SimpleCommand) -> i32 {
        if let Err(e) = redirect::apply(self.resolver(), cmd) {
            error!("shtree: {}", e);
            return e.status();
        }

        let mut argv = Vec::with_capacity(cmd.arguments.len() + 1);
        match CString::new(verb) {
            Ok(arg0) => argv.push(arg0),
            Err(_) => {
                error!("shtree: verb contains NUL: {}", verb);
                return 1;
            }
        }
        for word in &cmd.arguments {
            let text = match self.resolver().resolve(word) {
                Ok(text) => text,
                Err(e) => {
                    error!("shtree: {}", e);
                    return EngineError::from(e).status();
                }
            };
            match CString::new(text) {
                Ok(arg) => argv.push(arg),
                Err(_) => {
                    error!("shtree: argument contains NUL");
                    return 1;
                }
            }
        }

        let program = match find_program(verb) {
            Some(path) => path,
            None => {
                error!("shtree: {}", EngineError::NotFound(verb.to_string()));
                return STATUS_NOT_FOUND;
            }
        };
        let program = match CString::new(program.as_os_str().as_bytes()) {
            Ok(path) => path,
            Err(_) => {
                error!("shtree: program path contains NUL");
                return STATUS_NOT_FOUND;
            }
        };

        // Inherits the child's environment, including assignments made
        // earlier in the tree.
        match execv(&program, &argv) {
            Err(errno) => {
                error!(
                    "shtree: {}",
                    EngineError::Launch {
                        program: verb.to_string(),
                        source: errno,
                    }
                );
                STATUS_CANNOT_EXEC
            }
            Ok(infallible) => match infallible {},
        }
    }
}
