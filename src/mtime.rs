use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::DependsError;

/// A last-modified timestamp, nanoseconds since the Unix epoch. Pre-epoch
/// timestamps clamp to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mtime(u128);

impl Mtime {
    pub fn as_nanos(self) -> u128 {
        self.0
    }

    fn of(time: SystemTime) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        Mtime(nanos)
    }
}

/// Lazily populated, per-session cache of path modification times.
///
/// An entry is created on first lookup and lives until
/// [`invalidate`](Self::invalidate) removes it. Anything that changes a
/// path's timestamp must invalidate that path's entry, or later lookups
/// will answer with the stale cached value. External writers are not
/// detected; the owning session invalidates on their behalf.
#[derive(Debug, Default)]
pub struct MtimeCache {
    entries: HashMap<Utf8PathBuf, Option<Mtime>>,
}

impl MtimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a path's mtime, consulting the cache first. With
    /// `required`, a missing path is a [`DependsError::NotFound`];
    /// otherwise it reads as `None`.
    pub fn get(&mut self, path: &Utf8Path, required: bool) -> Result<Option<Mtime>, DependsError> {
        let cached = self.lookup(path)?;
        if required && cached.is_none() {
            return Err(DependsError::NotFound(path.to_owned()));
        }
        Ok(cached)
    }

    /// Whether `src` was modified strictly later than `dst`. Both paths
    /// must exist; callers check existence before asking.
    pub fn is_newer(&mut self, src: &Utf8Path, dst: &Utf8Path) -> Result<bool, DependsError> {
        Ok(self.required(src)? > self.required(dst)?)
    }

    /// Removes the cached entry for a path. No-op if absent.
    pub fn invalidate(&mut self, path: &Utf8Path) {
        self.entries.remove(path);
    }

    fn required(&mut self, path: &Utf8Path) -> Result<Mtime, DependsError> {
        self.lookup(path)?
            .ok_or_else(|| DependsError::NotFound(path.to_owned()))
    }

    fn lookup(&mut self, path: &Utf8Path) -> Result<Option<Mtime>, DependsError> {
        if let Some(cached) = self.entries.get(path) {
            return Ok(*cached);
        }

        let observed = match fs::metadata(path) {
            Ok(meta) => {
                let modified = meta.modified().map_err(|source| DependsError::Stat {
                    path: path.to_owned(),
                    source,
                })?;
                Some(Mtime::of(modified))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                return Err(DependsError::Stat {
                    path: path.to_owned(),
                    source,
                });
            }
        };

        self.entries.insert(path.to_owned(), observed);
        Ok(observed)
    }
}

/// Creates `path` if missing and sets its mtime to now. The caller is
/// responsible for invalidating any cache entry afterwards.
pub(crate) fn touch(path: &Utf8Path) -> Result<(), DependsError> {
    let wrap = |source| DependsError::Touch {
        path: path.to_owned(),
        source,
    };

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(wrap)?;
    file.set_modified(SystemTime::now()).map_err(wrap)
}
