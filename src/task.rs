use std::collections::BTreeMap;

use camino::Utf8Path;

use crate::error::DependsError;
use crate::fingerprint::Fingerprint;
use crate::invocation::{Invocation, Signature};
use crate::mtime::{self, MtimeCache};
use crate::stale::{self, Reason};
use crate::store::{self, MetadataStore};
use crate::template::{Template, Templates, expand, substitute};

/// Default template for the verbose decision report. Recognized
/// placeholders: `${func_name}` and `${reason}`.
pub const DEFAULT_REPORT_FORMAT: &str = "[depends] ${func_name} -> ${reason}";

/// The result of one wrapped invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<R> {
    /// The body ran and produced this value.
    Ran(R),
    /// Every output was up to date; the body was not invoked.
    Skipped,
}

impl<R> Outcome<R> {
    /// The body's return value, if it ran.
    pub fn ran(self) -> Option<R> {
        match self {
            Outcome::Ran(value) => Some(value),
            Outcome::Skipped => None,
        }
    }

    pub fn was_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }
}

/// Shared state of one build session: the mtime cache and the fingerprint
/// store backend.
///
/// Sessions are independent; two sessions in one process never share cache
/// entries. A session is used through `&mut`, so a single-threaded
/// embedding needs no locking discipline at all.
pub struct Session {
    pub(crate) mtimes: MtimeCache,
    pub(crate) store: Box<dyn MetadataStore>,
}

impl Session {
    /// A session over the platform's native metadata backend (probed at
    /// startup, see [`detect`](crate::detect)).
    pub fn new() -> Self {
        Self::with_store(store::detect())
    }

    /// A session over an explicit metadata backend.
    pub fn with_store(store: Box<dyn MetadataStore>) -> Self {
        Self {
            mtimes: MtimeCache::new(),
            store,
        }
    }

    /// The session's mtime cache. External writers are invisible to the
    /// cache; invalidate here on their behalf.
    pub fn mtimes(&mut self) -> &mut MtimeCache {
        &mut self.mtimes
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a task body with declared input/output dependencies and skips the
/// body when every output is up to date.
///
/// This is explicit composition rather than decorator magic: the wrapper
/// holds the body and its configuration and exposes [`call`](Self::call)
/// with the body's calling contract, returning [`Outcome::Skipped`] in
/// place of a value when no run was needed.
pub struct Depends<F> {
    name: String,
    body: F,
    signature: Signature,
    inputs: Vec<Template>,
    outputs: Vec<Template>,
    touch_outputs: bool,
    verbose: bool,
    report_format: String,
}

impl<F, R> Depends<F>
where
    F: FnMut(&Invocation) -> anyhow::Result<R>,
{
    pub fn new(name: impl Into<String>, body: F) -> Self {
        Self {
            name: name.into(),
            body,
            signature: Signature::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            touch_outputs: false,
            verbose: false,
            report_format: DEFAULT_REPORT_FORMAT.to_string(),
        }
    }

    /// Declares the task's parameter list, used for template expansion.
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Declares the input path templates. May be empty.
    pub fn inputs(mut self, templates: impl Into<Templates>) -> Self {
        self.inputs = templates.into().flatten();
        self
    }

    /// Declares the output path templates. An empty set forces
    /// unconditional execution.
    pub fn outputs(mut self, templates: impl Into<Templates>) -> Self {
        self.outputs = templates.into().flatten();
        self
    }

    /// Force-update output timestamps after a successful run even if the
    /// body did not modify them. Supports marker/sentinel outputs.
    pub fn touch_outputs(mut self, enable: bool) -> Self {
        self.touch_outputs = enable;
        self
    }

    /// Print a one-line decision report on every call.
    pub fn verbose(mut self, enable: bool) -> Self {
        self.verbose = enable;
        self
    }

    /// Template for the decision report; see [`DEFAULT_REPORT_FORMAT`].
    pub fn report_format(mut self, format: impl Into<String>) -> Self {
        self.report_format = format.into();
        self
    }

    /// Runs one invocation end to end: expand templates, fingerprint the
    /// arguments, decide, and either skip or run the body and record state
    /// for every output.
    ///
    /// A body failure propagates with no output bookkeeping performed, so
    /// the next invocation decides to re-run.
    pub fn call(
        &mut self,
        session: &mut Session,
        invocation: &Invocation,
    ) -> Result<Outcome<R>, DependsError> {
        let inputs = expand(&self.inputs, &self.signature, invocation)?;
        let outputs = expand(&self.outputs, &self.signature, invocation)?;
        let fingerprint = Fingerprint::of(invocation);

        let decision = stale::decide(
            &fingerprint,
            &inputs,
            &outputs,
            &mut session.mtimes,
            session.store.as_ref(),
        )?;
        tracing::debug!(
            task = %self.name,
            must_run = decision.must_run,
            reason = %decision.reason,
            "staleness decision"
        );
        self.report(&decision.reason);

        if !decision.must_run {
            return Ok(Outcome::Skipped);
        }

        let value = (self.body)(invocation)
            .map_err(|source| DependsError::Body(self.name.clone(), source))?;

        for output in &outputs {
            self.record(session, output, &fingerprint)?;
        }

        Ok(Outcome::Ran(value))
    }

    /// Post-run bookkeeping for one output: the body presumably wrote it,
    /// so its cache entry is dropped before anything else.
    fn record(
        &self,
        session: &mut Session,
        output: &Utf8Path,
        fingerprint: &Fingerprint,
    ) -> Result<(), DependsError> {
        session.mtimes.invalidate(output);
        session.store.write(output, &fingerprint.to_hex());

        if self.touch_outputs {
            mtime::touch(output)?;
        }
        Ok(())
    }

    fn report(&self, reason: &Reason) {
        if !self.verbose {
            return;
        }

        let mut context = BTreeMap::new();
        context.insert("func_name".to_string(), self.name.clone());
        context.insert("reason".to_string(), reason.to_string());

        println!("{}", substitute(&self.report_format, &context));
    }
}
