//! Component type catalog.
//!
//! The catalog is the closed set of measurement types an exam layout can be
//! built from. Every type carries a fixed, ordered field schema; records are
//! sparse maps over those fields.

mod component;
mod record;

pub use component::{fields_for_slug, ComponentType};
pub use record::{ComponentRecord, FieldValue};
