//! shtree — a command-tree execution engine.
//!
//! An external parser hands the engine an immutable [`Command`] tree
//! (simple commands, sequencing, pipes, conditional and parallel
//! composition); the engine realizes it as OS processes, wires up stream
//! redirections, and returns one integer exit status for the whole tree.
//!
//! ```no_run
//! use shtree::{Command, Config, Engine, SimpleCommand};
//!
//! let tree = Command::and_if(
//!     SimpleCommand::new("mkdir").arg("build").into(),
//!     SimpleCommand::new("make").stdout("build/log.txt").into(),
//! );
//! let status = Engine::with_config(Config::default()).run(&tree);
//! assert_eq!(status, 0);
//! ```

pub mod engine;
pub mod error;
pub mod utils;

pub use engine::{
    Command, Engine, EnvResolver, RedirectFlags, ResolveError, SimpleCommand, Word, WordPart,
    WordResolver,
};
pub use error::{EngineError, SIGNAL_STATUS_BASE, STATUS_CANNOT_EXEC, STATUS_NOT_FOUND};
pub use utils::config::Config;
