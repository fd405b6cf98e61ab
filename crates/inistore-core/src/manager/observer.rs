//! Change notification delivered when an update transaction commits.

use std::fmt;

use crate::field::FieldId;
use crate::settings::ChangeSet;

/// Who opened an update transaction.
///
/// Observers use this to avoid echoing a change back to the peer that made
/// it, e.g. an RPC layer skipping the client a `set` request came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    /// The application itself (load-time fixups, local UI, CLI).
    #[default]
    Local,
    /// An external peer, identified by an opaque name.
    Remote(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Local => f.write_str("local"),
            Origin::Remote(peer) => write!(f, "remote:{peer}"),
        }
    }
}

/// Receives the set of changed fields after each committing transaction.
///
/// Called after the new values have been stored (or the store attempt has
/// failed) and before the changed bitmap is cleared.
pub trait ChangeObserver<F: FieldId> {
    fn settings_changed(&mut self, origin: &Origin, changes: &ChangeSet<F>);
}

/// Adapts a closure to [`ChangeObserver`].
pub(crate) struct FnObserver<C>(pub(crate) C);

impl<F, C> ChangeObserver<F> for FnObserver<C>
where
    F: FieldId,
    C: FnMut(&Origin, &ChangeSet<F>),
{
    fn settings_changed(&mut self, origin: &Origin, changes: &ChangeSet<F>) {
        (self.0)(origin, changes)
    }
}
