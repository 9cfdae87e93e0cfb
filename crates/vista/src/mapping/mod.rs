//! Field mapping between component types.
//!
//! Values move between structurally different measurement types through a
//! per-pair mapping: identity on shared field names for compatible types, or
//! an explicit table for related fields with different names.
//!
//! # Example
//!
//! ```
//! use vista::catalog::{ComponentRecord, ComponentType, FieldValue};
//! use vista::mapping::copy_data;
//!
//! let keratometry = ComponentRecord::new().with_field("r_k1", 44.5);
//! let objective = ComponentRecord::new();
//!
//! let result = copy_data(
//!     &keratometry,
//!     &objective,
//!     ComponentType::Keratometer,
//!     ComponentType::Objective,
//! );
//! assert_eq!(result.get("r_sph"), Some(&FieldValue::Number(44.5)));
//! ```

mod overrides;
mod resolver;

pub use resolver::{
    available_targets, clear_data, copy_data, mapping, mapping_for_slugs, FieldMapping,
};
