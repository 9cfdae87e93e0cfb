//! The full data view: every recorded card of an exam in one packed layout.
//!
//! Aggregation merges instance buckets (first non-empty record per card key
//! wins). The builder turns the merged map into cards, packs them into rows
//! and filters a bucket down to exactly the keys the new layout shows.

mod builder;
mod collector;

pub use builder::{
    allowed_keys, build_full_data, build_full_data_bucket, build_full_data_layout, FullDataPlan,
};
pub use collector::aggregate_all_data;
