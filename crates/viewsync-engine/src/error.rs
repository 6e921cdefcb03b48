use thiserror::Error;

/// Failures raised by the document model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("position {pos} is outside of content of size {size}")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("inserted content is deeper than the insertion position")]
    InsertTooDeep,

    #[error("inconsistent open depths")]
    InconsistentOpenDepths,

    #[error("cannot join {sub} onto {main}")]
    CannotJoin {
        main: &'static str,
        sub: &'static str,
    },

    #[error("invalid content for {0}")]
    InvalidContent(&'static str),

    #[error("transaction was built against a different snapshot")]
    MismatchedTransaction,
}

/// Failures inside the reconciliation pipeline.
///
/// None of these reach the dispatch path: the surface logs them and falls
/// back to resynchronising the host against the live snapshot.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("mapping ledger has no path to the live snapshot")]
    StaleMapping,

    #[error("no host container can address {from}..{to}")]
    UnaddressableRange { from: usize, to: usize },

    #[error("selection {anchor}..{head} exceeds document size {size}")]
    SelectionOutOfBounds {
        anchor: usize,
        head: usize,
        size: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}
