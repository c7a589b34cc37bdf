use crate::types::{MosaicError, MosaicResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryState {
    Pending,
    Ready,
    Failed(String),
}

/// Reprojected VRTs claimed during one run, shared by every tile task
///
/// `reserve` is the only way in: the first caller for a path owns the
/// reprojection and must `publish` its outcome; later callers `wait_ready`.
#[derive(Debug, Default)]
pub struct ReprojectionCache {
    entries: Mutex<HashMap<PathBuf, EntryState>>,
    published: Condvar,
}

impl ReprojectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, EntryState>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `path` if absent; returns whether it was already present
    pub fn reserve(&self, path: &Path) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(path) {
            return true;
        }
        entries.insert(path.to_path_buf(), EntryState::Pending);
        false
    }

    /// Record the outcome of a reservation and wake any waiting tasks
    pub fn publish(&self, path: &Path, outcome: Result<(), String>) {
        let state = match outcome {
            Ok(()) => EntryState::Ready,
            Err(message) => EntryState::Failed(message),
        };
        self.lock().insert(path.to_path_buf(), state);
        self.published.notify_all();
    }

    /// Block until the owner of `path` has published
    pub fn wait_ready(&self, path: &Path) -> MosaicResult<()> {
        let mut entries = self.lock();
        loop {
            match entries.get(path).cloned() {
                Some(EntryState::Ready) => return Ok(()),
                Some(EntryState::Failed(message)) => {
                    return Err(MosaicError::Reprojection {
                        path: path.to_path_buf(),
                        message,
                    })
                }
                Some(EntryState::Pending) => {
                    entries = self
                        .published
                        .wait(entries)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => {
                    return Err(MosaicError::Processing(format!(
                        "{} was never reserved",
                        path.display()
                    )))
                }
            }
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Paths whose reprojection completed successfully, sorted
    pub fn ready_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .lock()
            .iter()
            .filter(|(_, state)| **state == EntryState::Ready)
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

/// Outcome recorded when an owner unwinds without publishing
const ABORTED: &str = "reprojection aborted";

/// Ownership of a path obtained from a `reserve` that returned `false`
///
/// Dropping it without `complete` publishes a failure, so waiters never block
/// on an owner that panicked.
pub struct Reservation<'a> {
    cache: &'a ReprojectionCache,
    path: PathBuf,
    published: bool,
}

impl<'a> Reservation<'a> {
    pub fn new(cache: &'a ReprojectionCache, path: &Path) -> Self {
        Self {
            cache,
            path: path.to_path_buf(),
            published: false,
        }
    }

    pub fn complete(mut self, outcome: Result<(), String>) {
        self.published = true;
        self.cache.publish(&self.path, outcome);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.published {
            log::warn!("Reservation for {} dropped unpublished", self.path.display());
            self.cache.publish(&self.path, Err(ABORTED.to_string()));
        }
    }
}
