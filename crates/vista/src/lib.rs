//! Vista: exam layout composition and cross-schema data aggregation.
//!
//! A clinical exam is assembled from layout instances, each an arrangement of
//! typed measurement cards. Vista keeps the structure of those layouts and the
//! data behind every card, moves values between different measurement types,
//! and can synthesize one packed "full data" layout showing everything
//! recorded on the exam.
//!
//! # Core Principles
//!
//! - **Closed catalog**: component types and their field schemas are an enum
//! - **Additive copies**: copying never blanks a target field
//! - **Soft outcomes**: empty or incompatible results are values, not errors
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vista::{ExamConfig, ExamSession, MemoryStore};
//! use vista::layout::LayoutData;
//!
//! # async fn example() -> vista::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let mut session = ExamSession::new(ExamConfig::default(), store.clone(), store);
//!
//! let layout = LayoutData::from_json(r#"[{"id": "r1", "cards": [{"id": "a", "type": "objective"}]}]"#)?;
//! session.attach_layout(None, layout).await?;
//!
//! let outcome = session.create_full_data().await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod bucket;
pub mod catalog;
pub mod clipboard;
pub mod error;
pub mod exam;
pub mod instance;
pub mod layout;
pub mod mapping;
pub mod persistence;
pub mod service;

pub use catalog::{ComponentRecord, ComponentType, FieldValue};
pub use clipboard::{Clipboard, ClipboardEntry, CopyOutcome, PasteOutcome};
pub use error::{Result, VistaError};
pub use exam::{ExamConfig, ExamPage, SaveOutcome};
pub use instance::{
    ExamId, ExamSession, FullDataOutcome, InstanceId, LayoutId, LayoutInstance, LayoutTemplate,
    RegenerateOutcome, SaveReport,
};
pub use layout::{Card, CardKey, LayoutData, Row};
pub use persistence::ExamSnapshot;
pub use service::{ComponentDataService, LayoutInstanceService, MemoryStore};
