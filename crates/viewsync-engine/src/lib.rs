pub mod classify;
pub mod diff;
pub mod drag;
pub mod error;
pub mod host;
pub mod ledger;
pub mod model;
pub mod pending;
pub mod reconcile;
pub mod selection_sync;
pub mod surface;
pub mod timer;

// Re-export key types for easier usage
pub use error::{ModelError, ReconcileError};
pub use host::{
    ContentParser, EditorHooks, HookContext, Host, HostNodeId, HostPoint, HostSelection,
    HostSpan, NodeDescriptor, ParseOutcome, ParseRequest, PresentationAdapter, SyntheticKey,
};
pub use ledger::MappingLedger;
pub use model::{
    Bias, EditChannel, EditListener, Fragment, Mapping, Mark, Node, NodeKind, ResolvedPos,
    Selection, SelectionOrigin, Slice, Snapshot, Transaction,
};
pub use pending::{ChangeRange, PendingChange};
pub use surface::EditorSurface;
pub use timer::{TimerQueue, TimerTask};
pub use viewsync_config::{SelectionStrategy, SyncConfig};
