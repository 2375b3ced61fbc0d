//! Advisory single-flight lock around a read-merge-write sequence.
//!
//! The lock is a file created with `create_new`, holding the owner's PID and
//! a per-acquisition token. A lock file older than the configured staleness
//! is assumed to belong to a crashed run and is replaced once. A lock is only
//! ever removed by the holder whose token it carries.

use std::{
  fs::{self, OpenOptions},
  io::{ErrorKind, Write},
  path::{Path, PathBuf},
  time::{Duration, SystemTime},
};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Error, Result};

/// Held for the duration of a run; released on drop.
#[derive(Debug)]
pub struct RunLock {
  path:  PathBuf,
  /// The exact line this holder wrote: `"<pid> <uuid>"`.
  token: String,
}

impl RunLock {
  /// Take the lock at `path`, failing with [`Error::Locked`] if another run
  /// holds a fresh one.
  pub fn acquire(path: impl Into<PathBuf>, stale_after: Duration) -> Result<Self> {
    let path = path.into();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let token = format!("{} {}", std::process::id(), Uuid::new_v4());

    if try_create(&path, &token)? {
      debug!(path = %path.display(), "run lock acquired");
      return Ok(Self { path, token });
    }

    let holder = read_holder(&path)?.unwrap_or_default();
    if !is_stale(&path, stale_after) {
      return Err(Error::Locked {
        path,
        holder: describe(&holder),
      });
    }

    // Another run may have replaced the stale file since it was read.
    if read_holder(&path)?.is_some_and(|current| current != holder) {
      return Err(concurrent(path));
    }

    warn!(path = %path.display(), holder = %describe(&holder), "replacing stale run lock");
    match fs::remove_file(&path) {
      Ok(()) => {}
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => return Err(Error::io(&path, e)),
    }

    if !try_create(&path, &token)? {
      return Err(concurrent(path));
    }
    if read_holder(&path)?.as_deref() != Some(token.as_str()) {
      return Err(concurrent(path));
    }
    Ok(Self { path, token })
  }

  pub fn path(&self) -> &Path { &self.path }
}

impl Drop for RunLock {
  fn drop(&mut self) {
    match read_holder(&self.path) {
      Ok(Some(holder)) if holder == self.token => {
        if let Err(e) = fs::remove_file(&self.path) {
          warn!(path = %self.path.display(), error = %e, "failed to release run lock");
        }
      }
      Ok(Some(holder)) => {
        warn!(
          path = %self.path.display(),
          holder = %describe(&holder),
          "run lock was taken over; leaving it in place"
        );
      }
      Ok(None) => {}
      Err(e) => warn!(path = %self.path.display(), error = %e, "failed to release run lock"),
    }
  }
}

/// `Ok(false)` when the file already exists.
fn try_create(path: &Path, token: &str) -> Result<bool> {
  match OpenOptions::new().write(true).create_new(true).open(path) {
    Ok(mut file) => {
      writeln!(file, "{token}").map_err(|e| Error::io(path, e))?;
      Ok(true)
    }
    Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
    Err(e) => Err(Error::io(path, e)),
  }
}

/// The trimmed lock contents, or `None` when there is no lock file.
fn read_holder(path: &Path) -> Result<Option<String>> {
  match fs::read_to_string(path) {
    Ok(s) => Ok(Some(s.trim().to_string())),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
    Err(e) => Err(Error::io(path, e)),
  }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
  fs::metadata(path)
    .and_then(|m| m.modified())
    .map(|modified| {
      SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default()
        >= stale_after
    })
    .unwrap_or(false)
}

fn concurrent(path: PathBuf) -> Error {
  Error::Locked {
    path,
    holder: "a concurrent run".into(),
  }
}

fn describe(holder: &str) -> String {
  match holder.split_whitespace().next() {
    Some(pid) => format!("pid {pid}"),
    None => "unknown holder".into(),
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  const HOUR: Duration = Duration::from_secs(3600);

  fn pid_of(path: &Path) -> String {
    let contents = fs::read_to_string(path).unwrap();
    contents.split_whitespace().next().unwrap().to_string()
  }

  #[test]
  fn second_acquire_fails_until_release() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync.lock");

    let lock = RunLock::acquire(&path, HOUR).unwrap();
    assert_eq!(pid_of(&path), std::process::id().to_string());

    assert!(matches!(RunLock::acquire(&path, HOUR), Err(Error::Locked { .. })));

    drop(lock);
    assert!(!path.exists());
    RunLock::acquire(&path, HOUR).unwrap();
  }

  #[test]
  fn stale_lock_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync.lock");
    fs::write(&path, "999999 3f1c\n").unwrap();

    let lock = RunLock::acquire(&path, Duration::ZERO).unwrap();
    assert_eq!(lock.path(), path.as_path());
    assert_eq!(fs::read_to_string(&path).unwrap().trim(), lock.token);
    assert_eq!(pid_of(&path), std::process::id().to_string());
  }

  #[test]
  fn release_leaves_a_successors_lock_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync.lock");

    let overran = RunLock::acquire(&path, HOUR).unwrap();
    fs::write(&path, "4242 successor\n").unwrap();
    drop(overran);

    assert_eq!(fs::read_to_string(&path).unwrap(), "4242 successor\n");
    assert!(matches!(
      RunLock::acquire(&path, HOUR),
      Err(Error::Locked { holder, .. }) if holder == "pid 4242"
    ));
  }

  #[test]
  fn holders_in_one_process_are_distinct() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync.lock");

    let first = RunLock::acquire(&path, Duration::ZERO).unwrap();
    let second = RunLock::acquire(&path, Duration::ZERO).unwrap();
    assert_ne!(first.token, second.token);

    drop(first);
    assert!(path.exists());
    drop(second);
    assert!(!path.exists());
  }

  #[test]
  fn creates_missing_parent_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run").join("sync.lock");
    let _lock = RunLock::acquire(&path, HOUR).unwrap();
    assert!(path.exists());
  }
}
