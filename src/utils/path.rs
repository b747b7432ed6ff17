use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::warn;

/// Locate the program image for a verb.
///
/// A verb containing `/` is taken as a path and only checked for existence;
/// anything else is searched on `PATH`, requiring an execute bit. `None`
/// means "command not found" (exit status 127 territory); a located but
/// non-executable image surfaces later as an exec failure.
pub fn find_program(verb: &str) -> Option<PathBuf> {
    if verb.contains('/') {
        let path = PathBuf::from(verb);
        return path.exists().then_some(path);
    }

    let env_path = match env::var("PATH") {
        Ok(value) => value,
        Err(e) => {
            warn!("shtree: cannot read PATH: {:?}", e);
            return None;
        }
    };

    for dir in env_path.split(':') {
        if dir.is_empty() {
            continue;
        }
        let candidate = Path::new(dir).join(verb);
        match fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => {
                if meta.permissions().mode() & 0o111 != 0 {
                    return Some(candidate);
                }
            }
            _ => continue,
        }
    }
    None
}
