//! Stream rebinding for a simple command, run in the child before exec.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

use log::debug;
use nix::unistd::dup2;

use super::ast::SimpleCommand;
use super::word::WordResolver;
use crate::error::EngineError;

const FILE_MODE: u32 = 0o644;

/// Rebind fds 0/1/2 according to the command's redirection fields.
///
/// stdin is handled on its own; the output cases form one chain in which
/// exactly one branch fires, mirroring shell `>>`/`2>>`/`&>`/`>`/`2>`
/// precedence. A failure here must keep the program image from loading, so
/// callers turn the error into the child's exit status.
pub fn apply<R: WordResolver>(resolver: &R, cmd: &SimpleCommand) -> Result<(), EngineError> {
    if let Some(word) = &cmd.stdin {
        let path = resolver.resolve(word)?;
        debug!("stdin < {}", path);
        let file = open_for(&path, Disposition::Read)?;
        bind(&file, &path, libc::STDIN_FILENO)?;
    }

    match (&cmd.stdout, &cmd.stderr) {
        (Some(out), _) if cmd.flags.append_stdout => {
            let path = resolver.resolve(out)?;
            debug!("stdout >> {}", path);
            let file = open_for(&path, Disposition::Append)?;
            bind(&file, &path, libc::STDOUT_FILENO)?;
        }
        (_, Some(err)) if cmd.flags.append_stderr => {
            let path = resolver.resolve(err)?;
            debug!("stderr >> {}", path);
            let file = open_for(&path, Disposition::Append)?;
            bind(&file, &path, libc::STDERR_FILENO)?;
        }
        (Some(out), Some(err)) => {
            let out_path = resolver.resolve(out)?;
            let err_path = resolver.resolve(err)?;
            if out_path == err_path {
                // &> form: one file, both streams.
                debug!("stdout & stderr &> {}", out_path);
                let file = open_for(&out_path, Disposition::Truncate)?;
                bind(&file, &out_path, libc::STDOUT_FILENO)?;
                bind(&file, &out_path, libc::STDERR_FILENO)?;
            } else {
                debug!("stdout > {}, stderr 2> {}", out_path, err_path);
                let file = open_for(&out_path, Disposition::Truncate)?;
                bind(&file, &out_path, libc::STDOUT_FILENO)?;
                drop(file);
                let file = open_for(&err_path, Disposition::Truncate)?;
                bind(&file, &err_path, libc::STDERR_FILENO)?;
            }
        }
        (Some(out), None) => {
            let path = resolver.resolve(out)?;
            debug!("stdout > {}", path);
            let file = open_for(&path, Disposition::Truncate)?;
            bind(&file, &path, libc::STDOUT_FILENO)?;
        }
        (None, Some(err)) => {
            let path = resolver.resolve(err)?;
            debug!("stderr 2> {}", path);
            let file = open_for(&path, Disposition::Truncate)?;
            bind(&file, &path, libc::STDERR_FILENO)?;
        }
        (None, None) => {}
    }

    Ok(())
}

enum Disposition {
    Read,
    Truncate,
    Append,
}

fn open_for(path: &str, disposition: Disposition) -> Result<File, EngineError> {
    let result = match disposition {
        Disposition::Read => File::open(path),
        Disposition::Truncate => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(FILE_MODE)
            .open(path),
        Disposition::Append => OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .mode(FILE_MODE)
            .open(path),
    };
    result.map_err(|source| EngineError::Io {
        path: path.to_string(),
        source,
    })
}

/// dup2 the file over a standard stream. The `File` stays owned by the
/// caller and is dropped (closed) as soon as it goes out of scope, so no
/// descriptor outlives its duplication.
fn bind(file: &File, path: &str, stream: i32) -> Result<(), EngineError> {
    dup2(file.as_raw_fd(), stream).map_err(|errno| EngineError::Io {
        path: path.to_string(),
        source: io::Error::from_raw_os_error(errno as i32),
    })?;
    Ok(())
}
