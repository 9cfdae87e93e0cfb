//! In-memory form data: one bucket of card records per layout instance.

mod buffer;
mod store;

pub use buffer::InputBuffer;
pub use store::{Bucket, BucketStore};
