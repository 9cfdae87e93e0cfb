//! Collecting recorded data across instance buckets.

use tracing::debug;

use crate::bucket::Bucket;

/// Merge buckets into one map of every recorded card.
///
/// Buckets are visited in the given order and the first non-empty record
/// seen for a card key wins. Records with nothing recorded for their type are
/// dropped and never claim a key.
pub fn aggregate_all_data<'a>(buckets: impl IntoIterator<Item = &'a Bucket>) -> Bucket {
    let mut aggregated = Bucket::new();
    let mut skipped = 0usize;

    for bucket in buckets {
        for (key, record) in bucket.iter() {
            if aggregated.contains(key) {
                continue;
            }
            if record.is_empty_for(key.component()) {
                skipped += 1;
                continue;
            }
            aggregated.insert(key.clone(), record.clone());
        }
    }

    debug!(
        records = aggregated.len(),
        empty = skipped,
        "Aggregated exam data"
    );
    aggregated
}
