use std::collections::HashMap;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};

use crate::fingerprint::Fingerprint;

/// Versioned extended-attribute slot holding the fingerprint of the last
/// successful run.
pub(crate) const FINGERPRINT_ATTR: &str = "user.depends.hash.v1";

/// A narrow interface over an out-of-band metadata slot attached to a
/// filesystem path.
///
/// Both operations are best-effort: unsupported filesystems, permission
/// problems and missing paths all read as "absent" and write as a no-op.
/// Unsupported metadata is an environment fact, not a caller error, so
/// nothing here ever surfaces an error to its caller.
pub trait MetadataStore {
    fn read(&self, path: &Utf8Path) -> Option<String>;
    fn write(&self, path: &Utf8Path, value: &str);
}

/// Extended-attribute backend.
pub struct XattrStore;

impl MetadataStore for XattrStore {
    fn read(&self, path: &Utf8Path) -> Option<String> {
        let raw = xattr::get(path.as_std_path(), FINGERPRINT_ATTR).ok().flatten()?;
        String::from_utf8(raw).ok()
    }

    fn write(&self, path: &Utf8Path, value: &str) {
        if let Err(err) = xattr::set(path.as_std_path(), FINGERPRINT_ATTR, value.as_bytes()) {
            tracing::debug!("couldn't store fingerprint on {path}: {err}");
        }
    }
}

/// Fallback for platforms without extended attributes. Reading always
/// answers "absent", which makes verification fail and the task re-run.
pub struct NoopStore;

impl MetadataStore for NoopStore {
    fn read(&self, _path: &Utf8Path) -> Option<String> {
        None
    }

    fn write(&self, _path: &Utf8Path, _value: &str) {}
}

/// In-process backend. Useful in tests and in embeddings that want
/// deterministic behavior regardless of filesystem support; nothing
/// survives the process.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<Utf8PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryStore {
    fn read(&self, path: &Utf8Path) -> Option<String> {
        self.slots.lock().unwrap().get(path).cloned()
    }

    fn write(&self, path: &Utf8Path, value: &str) {
        self.slots
            .lock()
            .unwrap()
            .insert(path.to_owned(), value.to_owned());
    }
}

/// Capability probe: the native backend where the platform supports
/// extended attributes, the no-op fallback everywhere else.
pub fn detect() -> Box<dyn MetadataStore> {
    if xattr::SUPPORTED_PLATFORM {
        Box::new(XattrStore)
    } else {
        Box::new(NoopStore)
    }
}

/// True only if a value was actually retrieved and equals `expected`.
/// Absence is verification failure, so a path with no prior fingerprint
/// always re-runs.
pub(crate) fn verify(store: &dyn MetadataStore, path: &Utf8Path, expected: &Fingerprint) -> bool {
    match store.read(path) {
        Some(found) => found == expected.to_hex(),
        None => false,
    }
}
