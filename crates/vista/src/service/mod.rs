//! Services the exam session persists through.

mod memory;
mod provider;

pub use memory::MemoryStore;
pub use provider::{ComponentDataService, LayoutInstanceService, NewInstance};
