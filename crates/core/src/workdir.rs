use crate::canonical::{AclTuple, ItemKind};
use crate::{ReconcileError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-run working files under one base directory.
///
/// Each artifact is a flat list, one entry per line. File presence is a
/// phase signal: the fix phase skips any kind whose missing-file does not
/// exist, so `verify` and `fix` can run as separate invocations.
#[derive(Debug, Clone)]
pub struct WorkingStore {
    base: PathBuf,
}

impl WorkingStore {
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn canonical_path(&self, kind: ItemKind) -> PathBuf {
        self.base.join(format!("{kind}.ids"))
    }

    pub fn missing_path(&self, kind: ItemKind) -> PathBuf {
        self.base.join(format!("missing-{kind}.ids"))
    }

    pub fn acl_tuples_path(&self) -> PathBuf {
        self.base.join("acl-tuples.tsv")
    }

    pub fn missing_acl_tuples_path(&self) -> PathBuf {
        self.base.join("missing-acl-tuples.tsv")
    }

    pub fn error_ids_path(&self) -> PathBuf {
        self.base.join("error-nodes.ids")
    }

    pub fn purge_ids_path(&self) -> PathBuf {
        self.base.join("purge-nodes.ids")
    }

    pub fn failure_log_path(&self) -> PathBuf {
        self.base.join("failures.log")
    }

    pub fn write_ids(&self, path: &Path, ids: &[u64]) -> Result<()> {
        let mut out = String::with_capacity(ids.len() * 8);
        for id in ids {
            out.push_str(&id.to_string());
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Read an id list; `Ok(None)` when the file does not exist.
    pub fn read_ids(&self, path: &Path) -> Result<Option<Vec<u64>>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut ids = Vec::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let id = line.parse::<u64>().map_err(|_| ReconcileError::WorkingFile {
                path: path.display().to_string(),
                detail: format!("not an id: {line:?}"),
            })?;
            ids.push(id);
        }
        Ok(Some(ids))
    }

    pub fn write_tuples(&self, path: &Path, tuples: &[AclTuple]) -> Result<()> {
        let mut file = fs::File::create(path)?;
        for t in tuples {
            writeln!(file, "{}\t{}\t{}", t.acl_id, t.txn_id, t.changeset_id)?;
        }
        Ok(())
    }

    pub fn read_tuples(&self, path: &Path) -> Result<Option<Vec<AclTuple>>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut tuples = Vec::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(ReconcileError::WorkingFile {
                    path: path.display().to_string(),
                    detail: format!("expected 3 columns: {line:?}"),
                });
            }
            let parse = |f: &str| -> Result<u64> {
                f.parse::<u64>().map_err(|_| ReconcileError::WorkingFile {
                    path: path.display().to_string(),
                    detail: format!("not an id: {f:?}"),
                })
            };
            tuples.push(AclTuple {
                acl_id: parse(fields[0])?,
                txn_id: parse(fields[1])?,
                changeset_id: parse(fields[2])?,
            });
        }
        Ok(Some(tuples))
    }
}
