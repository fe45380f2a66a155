use std::fmt;

use camino::Utf8PathBuf;

use crate::error::DependsError;
use crate::fingerprint::Fingerprint;
use crate::mtime::MtimeCache;
use crate::store::{self, MetadataStore};

/// Why a task must run (or doesn't have to). Renders as the human-readable
/// reason line used in verbose reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// Nothing to make stale-safe.
    NoOutputs,
    /// An output is missing.
    Missing(Utf8PathBuf),
    /// An input was modified after the output.
    OlderThan {
        output: Utf8PathBuf,
        input: Utf8PathBuf,
    },
    /// The stored fingerprint differs from the invocation's.
    ContextChanged(Utf8PathBuf),
    /// Every output passed every check.
    UpToDate,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::NoOutputs => write!(f, "no outputs given"),
            Reason::Missing(output) => write!(f, "{output}: missing file"),
            Reason::OlderThan { output, input } => write!(f, "{output}: older than {input}"),
            Reason::ContextChanged(output) => write!(f, "{output}: context changed"),
            Reason::UpToDate => write!(f, "up to date"),
        }
    }
}

/// The outcome of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub must_run: bool,
    pub reason: Reason,
}

impl Decision {
    fn run(reason: Reason) -> Self {
        Decision {
            must_run: true,
            reason,
        }
    }
}

/// Decides whether a task must run, first disqualifier wins.
///
/// Per output, in declared order: the output must exist, no input may be
/// newer than it, and its stored fingerprint must verify against
/// `fingerprint`. The first output failing any check mandates a run and
/// names the reason; with no declared outputs the task always runs.
pub fn decide(
    fingerprint: &Fingerprint,
    inputs: &[Utf8PathBuf],
    outputs: &[Utf8PathBuf],
    mtimes: &mut MtimeCache,
    store: &dyn MetadataStore,
) -> Result<Decision, DependsError> {
    if outputs.is_empty() {
        return Ok(Decision::run(Reason::NoOutputs));
    }

    for output in outputs {
        if mtimes.get(output, false)?.is_none() {
            return Ok(Decision::run(Reason::Missing(output.clone())));
        }

        // Existence is confirmed, so required-mode lookups are safe here.
        for input in inputs {
            if mtimes.is_newer(input, output)? {
                return Ok(Decision::run(Reason::OlderThan {
                    output: output.clone(),
                    input: input.clone(),
                }));
            }
        }

        if !store::verify(store, output, fingerprint) {
            return Ok(Decision::run(Reason::ContextChanged(output.clone())));
        }
    }

    Ok(Decision {
        must_run: false,
        reason: Reason::UpToDate,
    })
}
