//! CLI command implementations.

pub mod catalog;
pub mod full_data;
pub mod mapping;
pub mod status;
