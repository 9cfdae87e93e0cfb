//! Property-based tests for mapping, card keys, aggregation and packing.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p vista --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p vista --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use vista::aggregate::{aggregate_all_data, build_full_data_bucket, build_full_data_layout};
use vista::bucket::Bucket;
use vista::catalog::{ComponentRecord, ComponentType, FieldValue};
use vista::instance::InstanceId;
use vista::layout::{pack_cards, Card, CardKey, LayoutData, PackingConfig};
use vista::mapping::{clear_data, copy_data, mapping};

// =============================================================================
// Test Strategies
// =============================================================================

fn component() -> impl Strategy<Value = ComponentType> {
    (0..ComponentType::ALL.len()).prop_map(|i| ComponentType::ALL[i])
}

fn singleton_component() -> impl Strategy<Value = ComponentType> {
    component().prop_filter("singleton types only", |c| !c.is_repeatable())
}

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        Just(FieldValue::Text(String::new())),
        Just(FieldValue::Text("  ".to_string())),
        any::<bool>().prop_map(FieldValue::Bool),
        (-20.0..20.0f64).prop_map(FieldValue::Number),
        "[a-z0-9/]{1,6}".prop_map(FieldValue::Text),
    ]
}

/// A record whose fields are drawn from `component`'s schema.
fn record_for(component: ComponentType) -> impl Strategy<Value = ComponentRecord> {
    let fields = component.fields();
    proptest::collection::vec((any::<prop::sample::Index>(), field_value()), 0..8).prop_map(
        move |entries| {
            let mut record = ComponentRecord::new();
            for (index, value) in entries {
                record.set(*index.get(fields), value);
            }
            record
        },
    )
}

// Notes and cover-test card ids never overlap, as in a real layout.
fn notes_card_id() -> impl Strategy<Value = String> {
    "n[a-z]{0,3}(-[a-z0-9]{1,4})?"
}

fn cover_card_id() -> impl Strategy<Value = String> {
    "c[a-z]{0,3}(-[a-z0-9]{1,4})?"
}

fn tab_id() -> impl Strategy<Value = String> {
    "t[a-z0-9]{1,5}"
}

fn card_key() -> impl Strategy<Value = CardKey> {
    prop_oneof![
        singleton_component().prop_map(CardKey::Singleton),
        notes_card_id().prop_map(CardKey::notes),
        (cover_card_id(), tab_id()).prop_map(|(card, tab)| CardKey::cover_test(card, tab)),
    ]
}

fn keyed_record() -> impl Strategy<Value = (CardKey, ComponentRecord)> {
    card_key().prop_flat_map(|key| {
        let component = key.component();
        (Just(key), record_for(component))
    })
}

fn bucket() -> impl Strategy<Value = Bucket> {
    proptest::collection::vec(keyed_record(), 0..10).prop_map(|entries| entries.into_iter().collect())
}

// =============================================================================
// Field mapping
// =============================================================================

proptest! {
    /// Compatible pairs map every shared field name onto itself.
    #[test]
    fn shared_fields_map_to_themselves(source in component()) {
        for target in source.compatible_targets() {
            let m = mapping(source, *target);
            for field in source.fields() {
                if target.has_field(field) {
                    prop_assert_eq!(m.target_of(field), Some(*field));
                }
            }
        }
    }

    /// Mapping is a pure function of the two types.
    #[test]
    fn mapping_is_deterministic(source in component(), target in component()) {
        prop_assert_eq!(mapping(source, target), mapping(source, target));
    }

    /// Empty source values never overwrite the target.
    #[test]
    fn copy_never_writes_empty_values(
        (source_type, source) in component().prop_flat_map(|c| (Just(c), record_for(c))),
        (target_type, target) in component().prop_flat_map(|c| (Just(c), record_for(c))),
    ) {
        let result = copy_data(&source, &target, source_type, target_type);

        let written: HashSet<&str> = mapping(source_type, target_type)
            .transfers()
            .filter(|(src, _)| source.get(src).is_some_and(|v| !v.is_empty()))
            .map(|(_, dst)| dst)
            .collect();

        for (name, value) in &target.fields {
            if !written.contains(name.as_str()) {
                prop_assert_eq!(result.get(name), Some(value));
            }
        }
        for name in result.fields.keys() {
            prop_assert!(target.fields.contains_key(name) || written.contains(name.as_str()));
        }
        for (_, value) in &result.fields {
            if !target.fields.values().any(|v| v == value) {
                prop_assert!(!value.is_empty());
            }
        }
    }

    /// Clearing keeps identity and blanks every field.
    #[test]
    fn clear_keeps_identity(
        (component, record) in component().prop_flat_map(|c| (Just(c), record_for(c))),
        id in proptest::option::of(1i64..1000),
        instance in -2000i64..2000,
    ) {
        let mut record = record.with_instance(InstanceId(instance));
        record.id = id;

        let cleared = clear_data(&record);
        prop_assert_eq!(cleared.id, record.id);
        prop_assert_eq!(cleared.layout_instance_id, record.layout_instance_id);
        prop_assert!(cleared.fields.values().all(|v| *v == FieldValue::Null));
        prop_assert!(cleared.is_empty_for(component));
    }
}

// =============================================================================
// Card keys
// =============================================================================

proptest! {
    /// The string form parses back to the same key.
    #[test]
    fn card_key_string_round_trip(key in card_key()) {
        let text = key.to_string();
        prop_assert_eq!(CardKey::parse(&text), Some(key.clone()));
        prop_assert_eq!(CardKey::parse_with_card(&text, key.card_id()), Some(key));
    }

    /// Distinct keys never share a string form.
    #[test]
    fn card_key_is_injective(a in card_key(), b in card_key()) {
        if a != b {
            prop_assert_ne!(a.to_string(), b.to_string());
        } else {
            prop_assert_eq!(a.to_string(), b.to_string());
        }
    }
}

// =============================================================================
// Aggregation and packing
// =============================================================================

proptest! {
    /// Aggregating twice, or re-aggregating the result, changes nothing.
    #[test]
    fn aggregation_is_idempotent(buckets in proptest::collection::vec(bucket(), 0..4)) {
        let first = aggregate_all_data(&buckets);
        let second = aggregate_all_data(&buckets);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(aggregate_all_data([&first]), first.clone());

        for (key, record) in first.iter() {
            prop_assert!(!record.is_empty_for(key.component()));
        }
    }

    /// The full data bucket holds exactly the keys its layout shows.
    #[test]
    fn full_data_bucket_matches_layout(buckets in proptest::collection::vec(bucket(), 1..4)) {
        let aggregated = aggregate_all_data(&buckets);
        let Some(layout) = build_full_data_layout(&aggregated, None, &PackingConfig::default()) else {
            prop_assert!(aggregated.is_empty());
            return Ok(());
        };

        let bucket = build_full_data_bucket(InstanceId(900), &layout, &aggregated);
        prop_assert_eq!(bucket.len(), aggregated.len());

        for key in bucket.keys() {
            let shown = match key.card_id() {
                Some(card_id) => layout.find_card(card_id).is_some_and(|c| c.component == key.component()),
                None => layout.first_of(key.component()).is_some(),
            };
            prop_assert!(shown, "key {} has no card", key);
        }
        for card in layout.cards() {
            let has_data = bucket.keys().any(|key| match key.card_id() {
                Some(card_id) => card_id == card.id,
                None => key.component() == card.component,
            });
            prop_assert!(has_data, "card {} has no data", card.id);
        }
        prop_assert!(layout.custom_widths.is_empty());
    }

    /// Packing keeps every card in order and respects the row budget.
    #[test]
    fn packing_respects_budget(
        types in proptest::collection::vec(component(), 0..30),
        max_cards in 1usize..5,
    ) {
        let config = PackingConfig::default().with_max_cards_per_row(max_cards);
        let cards: Vec<Card> = types.iter().copied().map(Card::generate).collect();
        let ids: Vec<String> = cards.iter().map(|c| c.id.clone()).collect();

        let layout = LayoutData::new(pack_cards(cards, &config));

        let packed: Vec<String> = layout.cards().map(|c| c.id.clone()).collect();
        prop_assert_eq!(packed, ids);
        for row in &layout.rows {
            prop_assert!(!row.cards.is_empty());
            prop_assert!(row.cards.len() <= max_cards);
            let width: u32 = row.cards.iter().map(|c| c.component.nominal_width()).sum();
            prop_assert!(width <= config.row_width_budget || row.cards.len() == 1);
        }
    }
}
