use std::fs::{self, File};
use std::io::Write;
use std::process;

use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::utils::config::Config;

/// Set up logging for an embedding program.
///
/// Optional: the engine itself only emits through the `log` facade, so a
/// host that already installed a logger can skip this entirely.
pub fn init_logger(config: &Config) {
    let level = match &config.logger_level {
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };

    let mut writers: Vec<Box<dyn Write + Send + Sync>> = vec![Box::new(std::io::stderr())];
    if let Some(dir) = &config.logger_dir {
        match open_log_file(dir) {
            Ok(file) => writers.push(Box::new(file)),
            Err(e) => eprintln!("shtree: cannot open log file in {}: {}", dir.display(), e),
        }
    }

    let _ = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(MultiWriter { writers })))
        .filter(Some("shtree"), level)
        .filter(None, LevelFilter::Warn)
        .try_init();
}

fn open_log_file(dir: &std::path::Path) -> std::io::Result<File> {
    fs::create_dir_all(dir)?;
    let date = Local::now().format("%Y-%m-%d");
    File::create(dir.join(format!("shtree_{}.log", date)))
}

struct MultiWriter {
    writers: Vec<Box<dyn Write + Send + Sync>>,
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}
