//! The recursive tree-walking interpreter over the command tree.

use log::{debug, error, warn};

use super::ast::Command;
use super::process as proc;
use super::word::{EnvResolver, WordResolver};
use crate::error::EngineError;
use crate::utils::config::Config;

/// The execution engine. Entered once per top-level command tree; walks it
/// depth-first and produces a single exit status.
///
/// Sequential and conditional children run in this process, so their
/// builtin side effects (working directory, environment) persist. Parallel
/// and pipe children run forked, so the same side effects stay private to
/// the branch.
pub struct Engine<R: WordResolver = EnvResolver> {
    resolver: R,
    config: Config,
}

impl Engine<EnvResolver> {
    /// Engine with configuration taken from the environment.
    pub fn new() -> Self {
        Self::with_config(Config::new())
    }

    pub fn with_config(config: Config) -> Self {
        let resolver = if config.strict_vars {
            EnvResolver::strict()
        } else {
            EnvResolver::new()
        };
        Self { resolver, config }
    }
}

impl Default for Engine<EnvResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: WordResolver> Engine<R> {
    /// Engine with a caller-supplied word resolution policy.
    pub fn with_resolver(resolver: R, config: Config) -> Self {
        Self { resolver, config }
    }

    pub(super) fn resolver(&self) -> &R {
        &self.resolver
    }

    pub(super) fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a command tree and return its exit status (0 = success).
    ///
    /// Every failure below this point has already been collapsed into a
    /// status; the walk itself cannot fail.
    pub fn run(&self, tree: &Command) -> i32 {
        match tree {
            Command::Simple(cmd) => match self.exec_simple(cmd) {
                Ok(status) => status,
                Err(e) => {
                    error!("shtree: {}", e);
                    e.status()
                }
            },
            Command::Sequence(left, right) => {
                let _ = self.run(left);
                self.run(right)
            }
            Command::AndIf(left, right) => {
                let status = self.run(left);
                if status == 0 {
                    self.run(right)
                } else {
                    status
                }
            }
            Command::OrIf(left, right) => {
                let status = self.run(left);
                if status != 0 {
                    self.run(right)
                } else {
                    status
                }
            }
            Command::Parallel(left, right) => self
                .run_parallel(left, right)
                .unwrap_or_else(|e| {
                    error!("shtree: {}", e);
                    e.status()
                }),
            Command::Pipe(left, right) => self.run_pipe(left, right).unwrap_or_else(|e| {
                error!("shtree: {}", e);
                e.status()
            }),
        }
    }

    /// Fork both branches, wait for both, report the status of the branch
    /// observed last (the right one). No ordering between the branches'
    /// side effects; each runs on its own copy of cwd and environment.
    fn run_parallel(&self, left: &Command, right: &Command) -> Result<i32, EngineError> {
        debug!("parallel: forking both branches");
        let left_child = proc::spawn(|| self.run(left))?;
        let right_child = match proc::spawn(|| self.run(right)) {
            Ok(child) => child,
            Err(e) => {
                let _ = proc::wait(left_child);
                return Err(e.into());
            }
        };

        if let Err(e) = proc::wait(left_child) {
            warn!("parallel: losing left branch status: {}", e);
        }
        Ok(proc::wait(right_child)?.code())
    }

    /// `left | right`: left's stdout feeds right's stdin through an
    /// anonymous pipe. The node's status is the consumer's, per pipeline
    /// convention; the producer is still always reaped.
    fn run_pipe(&self, left: &Command, right: &Command) -> Result<i32, EngineError> {
        debug!("pipe: forking producer and consumer");
        let (read_end, write_end) = proc::pipe_channel()?;

        let producer = proc::spawn(|| {
            if let Err(errno) = proc::bind_pipe_writer(&read_end, &write_end) {
                error!("shtree: pipe writer setup failed: {}", errno);
                return EngineError::from(errno).status();
            }
            self.run(left)
        })?;

        let consumer = match proc::spawn(|| {
            if let Err(errno) = proc::bind_pipe_reader(&read_end, &write_end) {
                error!("shtree: pipe reader setup failed: {}", errno);
                return EngineError::from(errno).status();
            }
            self.run(right)
        }) {
            Ok(child) => child,
            Err(e) => {
                drop(read_end);
                drop(write_end);
                let _ = proc::wait(producer);
                return Err(e.into());
            }
        };

        // The parent holds copies of both ends; the consumer only sees EOF
        // once they are gone.
        drop(read_end);
        drop(write_end);

        if let Err(e) = proc::wait(producer) {
            warn!("pipe: losing producer status: {}", e);
        }
        Ok(proc::wait(consumer)?.code())
    }
}
