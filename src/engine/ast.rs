//! The command tree handed to the engine by an external parser.
//!
//! The engine only ever reads these nodes; the parser builds them once and
//! the caller owns them for the duration of one execution.

/// One fragment of a word: literal text, or a variable reference resolved
/// at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    Literal(String),
    Var(String),
}

/// An already-parsed word, possibly needing run-time resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    parts: Vec<WordPart>,
}

impl Word {
    pub fn new(parts: Vec<WordPart>) -> Self {
        Self { parts }
    }

    /// A word that is a single variable reference, e.g. `$HOME`.
    pub fn var(name: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Var(name.into())],
        }
    }

    pub fn parts(&self) -> &[WordPart] {
        &self.parts
    }
}

impl From<&str> for Word {
    fn from(text: &str) -> Self {
        Self {
            parts: vec![WordPart::Literal(text.to_string())],
        }
    }
}

impl From<String> for Word {
    fn from(text: String) -> Self {
        Self {
            parts: vec![WordPart::Literal(text)],
        }
    }
}

/// Append vs. truncate-create for the two output streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectFlags {
    pub append_stdout: bool,
    pub append_stderr: bool,
}

/// A leaf of the tree: one verb, its arguments, and redirection targets.
///
/// `verb` is never empty in a well-formed tree. For an environment
/// assignment the verb carries the whole `NAME=VALUE` text.
#[derive(Debug, Clone)]
pub struct SimpleCommand {
    pub verb: Word,
    pub arguments: Vec<Word>,
    pub stdin: Option<Word>,
    pub stdout: Option<Word>,
    pub stderr: Option<Word>,
    pub flags: RedirectFlags,
}

impl SimpleCommand {
    pub fn new(verb: impl Into<Word>) -> Self {
        Self {
            verb: verb.into(),
            arguments: Vec::new(),
            stdin: None,
            stdout: None,
            stderr: None,
            flags: RedirectFlags::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Word>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, W>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<Word>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, target: impl Into<Word>) -> Self {
        self.stdin = Some(target.into());
        self
    }

    pub fn stdout(mut self, target: impl Into<Word>) -> Self {
        self.stdout = Some(target.into());
        self
    }

    pub fn stdout_append(mut self, target: impl Into<Word>) -> Self {
        self.stdout = Some(target.into());
        self.flags.append_stdout = true;
        self
    }

    pub fn stderr(mut self, target: impl Into<Word>) -> Self {
        self.stderr = Some(target.into());
        self
    }

    pub fn stderr_append(mut self, target: impl Into<Word>) -> Self {
        self.stderr = Some(target.into());
        self.flags.append_stderr = true;
        self
    }

    /// `&> target`: stdout and stderr share one truncate-created file.
    pub fn combined_output(mut self, target: impl Into<Word>) -> Self {
        let word = target.into();
        self.stdout = Some(word.clone());
        self.stderr = Some(word);
        self
    }
}

/// The command tree: leaves are simple commands, internal nodes carry the
/// combining operator. One variant per operator keeps the interpreter a
/// plain structural recursion.
#[derive(Debug, Clone)]
pub enum Command {
    Simple(SimpleCommand),
    /// `left ; right` — run left, discard its status, run right.
    Sequence(Box<Command>, Box<Command>),
    /// `left & right` — both branches run concurrently in their own process.
    Parallel(Box<Command>, Box<Command>),
    /// `left | right` — left's stdout feeds right's stdin.
    Pipe(Box<Command>, Box<Command>),
    /// `left && right` — right runs only if left exited 0.
    AndIf(Box<Command>, Box<Command>),
    /// `left || right` — right runs only if left exited non-zero.
    OrIf(Box<Command>, Box<Command>),
}

impl Command {
    pub fn simple(cmd: SimpleCommand) -> Self {
        Command::Simple(cmd)
    }

    pub fn sequence(left: Command, right: Command) -> Self {
        Command::Sequence(Box::new(left), Box::new(right))
    }

    pub fn parallel(left: Command, right: Command) -> Self {
        Command::Parallel(Box::new(left), Box::new(right))
    }

    pub fn pipe(left: Command, right: Command) -> Self {
        Command::Pipe(Box::new(left), Box::new(right))
    }

    pub fn and_if(left: Command, right: Command) -> Self {
        Command::AndIf(Box::new(left), Box::new(right))
    }

    pub fn or_if(left: Command, right: Command) -> Self {
        Command::OrIf(Box::new(left), Box::new(right))
    }
}

impl From<SimpleCommand> for Command {
    fn from(cmd: SimpleCommand) -> Self {
        Command::Simple(cmd)
    }
}
