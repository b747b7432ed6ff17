pub mod ast;
mod executor;
pub mod interpreter;
pub mod process;
mod redirect;
pub mod word;

pub use ast::{Command, RedirectFlags, SimpleCommand, Word, WordPart};
pub use interpreter::Engine;
pub use word::{EnvResolver, ResolveError, WordResolver};
