//! Command and query contracts.
//!
//! Domains describe their commands as one sum type and their queries as
//! another. The ledger only needs to know a value's kind name and, for
//! commands, how to spell the no-op that revisions substitute.

use std::fmt::Debug;

use serde::Serialize;

/// A state-change request that is appended to the log once accepted.
///
/// Implementors must serialize in serde's adjacently tagged shape,
/// `{"type": "<kind>", "message": {..}}`, which is what
/// [`JsonCodec`](crate::JsonCodec) reads back. Deriving with
/// `#[serde(tag = "type", content = "message")]` on an enum gives exactly that.
pub trait Command: Clone + Debug + Serialize + Send + Sync + 'static {
    /// The registry key for this command, e.g. `"PostLink"`.
    fn kind(&self) -> &'static str;

    /// The command that every module silently accepts and ignores.
    ///
    /// A revision with no replacement stores this in place of the original.
    fn noop() -> Self;

    fn is_noop(&self) -> bool;
}

/// A read-only request against derived state. Never logged.
pub trait Query: Debug + Send + Sync + 'static {
    fn kind(&self) -> &'static str;
}

/// A command as it comes back out of the log.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedCommand<C> {
    /// Monotonic, gap-free, starting at 1.
    pub id: u64,
    pub message: C,
}

impl<C> PersistedCommand<C> {
    pub fn new(id: u64, message: C) -> Self {
        Self { id, message }
    }
}

/// Binds a concrete query struct to its variant in the domain's query and
/// result sum types, so callers get a typed answer from
/// [`App::ask`](crate::App::ask).
pub trait TypedQuery<Q, R>: Sized {
    type Output;

    fn into_query(self) -> Q;

    /// `None` when the result is some other variant.
    fn from_result(result: R) -> Option<Self::Output>;
}
