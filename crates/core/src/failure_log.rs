use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Append-only log of per-item corrective failures.
///
/// Appends are serialized through a mutex so concurrent instance fan-out
/// cannot interleave lines. The log accumulates across runs unless the
/// operator clears it.
#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FailureLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one rejected corrective request. Response bodies are folded
    /// onto one line so the log stays line-oriented.
    pub fn append(&self, instance: &str, item: &str, status: u16, body: &str) -> Result<()> {
        let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            // A writer that panicked mid-append cannot corrupt a whole-line
            // write; keep logging.
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(file, "{}\t{instance}\t{item}\t{status}\t{body}", unix_ms())?;
        file.flush()?;
        Ok(())
    }

    pub fn clear(path: impl AsRef<Path>) -> Result<()> {
        match std::fs::remove_file(path.as_ref()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_accumulate_across_opens() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("failures.log");

        let log = FailureLog::open(&path).unwrap();
        log.append("http://a", "node 5", 500, "boom").unwrap();
        drop(log);

        let log = FailureLog::open(&path).unwrap();
        log.append("http://a", "node 6", 503, "busy\nretry later").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("node 5"));
        assert!(lines[1].contains("busy retry later"));
    }

    #[test]
    fn clear_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("failures.log");
        FailureLog::clear(&path).unwrap();
        FailureLog::open(&path).unwrap().append("i", "n", 500, "x").unwrap();
        FailureLog::clear(&path).unwrap();
        assert!(!path.exists());
    }
}
