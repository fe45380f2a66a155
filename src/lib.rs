#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod error;
mod fingerprint;
mod invocation;
mod mtime;
mod stale;
mod store;
mod task;
mod template;

pub use crate::error::{BindingError, DependsError};
pub use crate::fingerprint::Fingerprint;
pub use crate::invocation::{Arg, Invocation, Param, Signature};
pub use crate::mtime::{Mtime, MtimeCache};
pub use crate::stale::{Decision, Reason, decide};
pub use crate::store::{MemoryStore, MetadataStore, NoopStore, XattrStore, detect};
pub use crate::task::{DEFAULT_REPORT_FORMAT, Depends, Outcome, Session};
pub use crate::template::{Template, Templates};
