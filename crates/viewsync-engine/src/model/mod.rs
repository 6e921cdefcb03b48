/*!
 * # Document Model
 *
 * The immutable document model the reconciliation engine reads and edits.
 *
 * - **`node`** / **`fragment`**: shared, structurally comparable trees. Text
 *   is counted in characters, every other node adds an opening and closing
 *   token around its content.
 * - **`resolved`**: positions resolved to their ancestor path.
 * - **`replace`**: slices and the structural replace algorithm.
 * - **`mapping`**: position maps for applied steps, backed by xi-rope deltas.
 * - **`selection`**: text and node selections.
 * - **`state`**: reference-identity snapshots and the transaction builder.
 * - **`channel`**: the edit-broadcast channel every applied transaction is
 *   published on.
 */

pub mod builders;
pub mod channel;
pub mod fragment;
pub mod mapping;
pub mod mark;
pub mod node;
pub mod replace;
pub mod resolved;
pub mod selection;
pub mod state;

pub use channel::{EditChannel, EditListener, SubscriptionId};
pub use fragment::Fragment;
pub use mapping::{Bias, Mapping, StepMap};
pub use mark::Mark;
pub use node::{Node, NodeKind};
pub use replace::Slice;
pub use resolved::ResolvedPos;
pub use selection::Selection;
pub use state::{SelectionOrigin, Snapshot, Transaction};
