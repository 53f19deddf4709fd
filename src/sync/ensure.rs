//! ensure - create missing directories, segment by segment

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{BifrostError, Result};

/// Directories created by one `ensure` call (empty on a no-op)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnsureOutcome {
    pub created: Vec<Utf8PathBuf>,
}

impl EnsureOutcome {
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

fn sync_err(path: &Utf8Path, source: io::Error) -> BifrostError {
    BifrostError::FilesystemSync {
        path: path.to_string(),
        source,
    }
}

/// Create `path` and any missing ancestors
///
/// Existence is rechecked per segment, and `AlreadyExists` from a racing
/// creator counts as success. A segment that exists as a file fails.
#[instrument(skip_all, fields(path = %path.as_ref()))]
pub fn ensure(path: impl AsRef<Utf8Path>) -> Result<EnsureOutcome> {
    let path = path.as_ref();
    let mut chain: Vec<&Utf8Path> = path
        .ancestors()
        .filter(|p| !p.as_str().is_empty())
        .collect();
    chain.reverse();

    let mut outcome = EnsureOutcome::default();
    for dir in chain {
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => {
                return Err(sync_err(
                    dir,
                    io::Error::other("path exists and is not a directory"),
                ));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => match fs::create_dir(dir) {
                Ok(()) => {
                    debug!(dir = %dir, "Created directory");
                    outcome.created.push(dir.to_owned());
                }
                // Lost a race to another creator
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
                Err(e) => return Err(sync_err(dir, e)),
            },
            Err(e) => return Err(sync_err(dir, e)),
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn creates_missing_segments() {
        let tmp = TempDir::new().unwrap();
        let target = utf8(&tmp).join("show/shots/sh010/work");
        let outcome = ensure(&target).unwrap();
        assert_eq!(outcome.created.len(), 4);
        assert_eq!(outcome.created.last(), Some(&target));
        assert!(target.is_dir());
    }

    #[test]
    fn second_call_is_noop() {
        let tmp = TempDir::new().unwrap();
        let target = utf8(&tmp).join("a/b/c");
        assert!(!ensure(&target).unwrap().is_noop());
        assert!(ensure(&target).unwrap().is_noop());
    }

    #[test]
    fn file_segment_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let base = utf8(&tmp);
        fs::write(base.join("blocker"), b"x").unwrap();
        let err = ensure(base.join("blocker/child")).unwrap_err();
        assert_eq!(err.code(), "BIF-040");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn concurrent_callers_all_succeed() {
        let tmp = TempDir::new().unwrap();
        let target = utf8(&tmp).join("race/x/y/z");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = target.clone();
                std::thread::spawn(move || ensure(&t))
            })
            .collect();
        let mut created = 0;
        for h in handles {
            created += h.join().unwrap().unwrap().created.len();
        }
        assert_eq!(created, 4);
        assert!(target.is_dir());
    }
}
