//! Logging setup: `log` + `env_logger` to stderr by default, or redirected
//! to a timestamped file under `log/` when `--log` is given.
//!
//! Grounded on spec.md §6's `--log` redirection rule
//! (`log/<domainStem>_<yyyymmdd_HHMMSS>[_n].log`) and on the teacher's
//! `env_logger`-over-`log` pairing used by `logicaffeine_lsp`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::HarnessError;

/// Initialize the global logger, writing to stderr.
pub fn init_stderr() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Initialize the global logger, writing to a fresh file under `log/`
/// named from `domain_path`'s stem and the current local time, with a
/// `_n` repetition suffix if a file for this second already exists.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if `log/` cannot be created or the log
/// file cannot be opened.
pub fn init_file(domain_path: &Path) -> Result<PathBuf, HarnessError> {
    let dir = Path::new("log");
    fs::create_dir_all(dir)?;

    let stem = domain_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("domain");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

    let path = next_available_path(dir, stem, &timestamp);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let target = Box::new(file);
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Pipe(target))
        .try_init();

    Ok(path)
}

fn next_available_path(dir: &Path, stem: &str, timestamp: &str) -> PathBuf {
    let base = dir.join(format!("{stem}_{timestamp}.log"));
    if !base.exists() {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_{timestamp}_{n}.log"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Append a line to `path`, used by [`crate::dataset`]/`--results_file`
/// writers that need a plain append rather than the `log` facade.
pub fn append_line(path: &Path, line: &str) -> Result<(), HarnessError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Touch (create, truncate) a file, used before a sequence of `append_line`
/// calls so reruns don't concatenate onto a stale file.
pub fn truncate(path: &Path) -> Result<(), HarnessError> {
    File::create(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repetition_suffix_avoids_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = next_available_path(dir.path(), "coin", "20260101_000000");
        fs::write(&first, "x").unwrap();
        let second = next_available_path(dir.path(), "coin", "20260101_000000");
        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("_1.log"));
    }
}
