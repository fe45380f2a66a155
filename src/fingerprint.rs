use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::invocation::{Arg, Invocation};

/// Canonical shape fed to the digest: positional arguments in call order,
/// named arguments keyed by sorted name (the map is a `BTreeMap`, so key
/// order never depends on insertion order).
#[derive(Serialize)]
struct Canonical<'a> {
    args: &'a [Arg],
    kwargs: &'a BTreeMap<String, Value>,
}

/// A 32-byte BLAKE3 digest of an invocation's argument values.
///
/// This is a staleness key, not a security boundary: it only needs to be
/// collision-resistant enough that distinct argument sets don't alias.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Digests an invocation. A leading execution-context argument is
    /// dropped first; two calls with identical effective arguments yield
    /// byte-identical fingerprints.
    pub fn of(invocation: &Invocation) -> Self {
        let canonical = Canonical {
            args: invocation.semantic_args(),
            kwargs: &invocation.named,
        };
        let blob = serde_json::to_vec(&canonical).expect("json values always serialize");

        Fingerprint(blake3::Hasher::new().update(&blob).finalize().into())
    }

    /// Lowercase hex rendering, the form persisted in the metadata slot.
    pub fn to_hex(self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut acc = vec![0u8; 64];

        for (i, &byte) in self.0.iter().enumerate() {
            acc[i * 2] = HEX[(byte >> 4) as usize];
            acc[i * 2 + 1] = HEX[(byte & 0xF) as usize];
        }

        String::from_utf8(acc).unwrap()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}
