//! Layout instances and the per-exam session that manages them.
//!
//! An instance moves from temporary (negative id, exam not yet saved) to
//! persisted (positive id) on the first save, or is persisted directly when
//! attached to an existing exam. It never goes back.

mod model;
mod session;

pub use model::{ExamId, InstanceId, InstanceState, LayoutId, LayoutInstance, LayoutTemplate};
pub use session::{ExamSession, FullDataOutcome, LoadTicket, RegenerateOutcome, SaveReport};
