use std::env;

use thiserror::Error;

use super::ast::{Word, WordPart};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("undefined variable: {0}")]
    Undefined(String),
    #[error("variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// Turns a parsed [`Word`] into a plain string.
///
/// The engine calls this wherever a verb, argument or redirection target is
/// needed; custom resolvers can plug in their own substitution policy.
pub trait WordResolver {
    fn resolve(&self, word: &Word) -> Result<String, ResolveError>;
}

/// Default resolver: variable parts are looked up in the process
/// environment. An unset variable resolves to the empty string, like a
/// POSIX shell without `set -u`; strict mode makes it an error instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvResolver {
    strict: bool,
}

impl EnvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl WordResolver for EnvResolver {
    fn resolve(&self, word: &Word) -> Result<String, ResolveError> {
        let mut result = String::new();
        for part in word.parts() {
            match part {
                WordPart::Literal(text) => result.push_str(text),
                WordPart::Var(name) => match env::var(name) {
                    Ok(value) => result.push_str(&value),
                    Err(env::VarError::NotPresent) if !self.strict => {}
                    Err(env::VarError::NotPresent) => {
                        return Err(ResolveError::Undefined(name.clone()))
                    }
                    Err(env::VarError::NotUnicode(_)) => {
                        return Err(ResolveError::NotUnicode(name.clone()))
                    }
                },
            }
        }
        Ok(result)
    }
}
