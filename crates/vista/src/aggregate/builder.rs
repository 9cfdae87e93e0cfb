//! Building the full data layout and its bucket.

use std::collections::HashSet;

use tracing::debug;

use crate::bucket::Bucket;
use crate::catalog::ComponentType;
use crate::instance::InstanceId;
use crate::layout::{pack_cards, Card, CardKey, LayoutData, PackingConfig};

/// A synthesized layout together with the data it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FullDataPlan {
    pub layout: LayoutData,
    pub bucket: Bucket,
}

/// Derive one card per aggregated key and pack them into rows.
///
/// Notes and cover-test cards keep the card id stored in their key, with one
/// cover-test card per card id however many tabs it has. Other cards reuse
/// the id of the same type in `previous` (the layout being regenerated) or
/// get a fresh one. Custom widths are never carried over.
///
/// Returns `None` when there is nothing to show.
pub fn build_full_data_layout(
    aggregated: &Bucket,
    previous: Option<&LayoutData>,
    config: &PackingConfig,
) -> Option<LayoutData> {
    let mut cards = Vec::new();
    let mut cover_cards = HashSet::new();

    for (key, record) in aggregated.iter() {
        let card = match key {
            CardKey::Notes { card_id } => {
                let card = Card::new(card_id.as_str(), ComponentType::Notes);
                match record.title() {
                    Some(title) => card.with_title(title),
                    None => card,
                }
            }
            CardKey::CoverTest { card_id, .. } => {
                if !cover_cards.insert(card_id.clone()) {
                    continue;
                }
                Card::new(card_id.as_str(), ComponentType::CoverTest)
            }
            CardKey::Singleton(component) => {
                let card = previous
                    .and_then(|layout| layout.first_of(*component))
                    .map(|existing| Card::new(existing.id.as_str(), *component))
                    .unwrap_or_else(|| Card::generate(*component));
                match record.title().filter(|_| component.supports_title()) {
                    Some(title) => card.with_title(title),
                    None => card,
                }
            }
        };
        cards.push(card);
    }

    if cards.is_empty() {
        return None;
    }

    let rows = pack_cards(cards, config);
    debug!(rows = rows.len(), "Packed full data layout");
    Some(LayoutData::new(rows))
}

/// Keys of `aggregated` that the cards of `layout` display, in card order.
pub fn allowed_keys(layout: &LayoutData, aggregated: &Bucket) -> Vec<CardKey> {
    let mut keys = Vec::new();
    for card in layout.cards() {
        match card.component {
            ComponentType::Notes => keys.push(CardKey::notes(card.id.as_str())),
            ComponentType::CoverTest => keys.extend(
                aggregated
                    .keys()
                    .filter(|key| key.component() == ComponentType::CoverTest)
                    .filter(|key| key.card_id() == Some(card.id.as_str()))
                    .cloned(),
            ),
            component => keys.extend(CardKey::singleton(component)),
        }
    }
    keys.retain(|key| aggregated.contains(key));
    keys
}

/// Copy the aggregated records that `layout` displays into a bucket owned by
/// `instance`.
pub fn build_full_data_bucket(
    instance: InstanceId,
    layout: &LayoutData,
    aggregated: &Bucket,
) -> Bucket {
    let mut bucket = Bucket::new();

    for key in allowed_keys(layout, aggregated) {
        let Some(source) = aggregated.get(&key) else {
            continue;
        };
        let mut record = source.clone();
        record.id = None;
        record.layout_instance_id = Some(instance);
        if let Some(card_id) = key.card_id() {
            record.card_instance_id = Some(card_id.to_string());
        }
        bucket.insert(key, record);
    }

    bucket
}

/// Build both the layout and its bucket, or `None` when there is no data.
pub fn build_full_data(
    instance: InstanceId,
    aggregated: &Bucket,
    previous: Option<&LayoutData>,
    config: &PackingConfig,
) -> Option<FullDataPlan> {
    let layout = build_full_data_layout(aggregated, previous, config)?;
    let bucket = build_full_data_bucket(instance, &layout, aggregated);
    Some(FullDataPlan { layout, bucket })
}
