//! Card keys: the address of a card's data within a bucket.

use std::fmt;

use crate::catalog::ComponentType;

use super::card::Card;
use super::tabs::CardTabs;

const NOTES_PREFIX: &str = "notes-";
const COVER_TEST_PREFIX: &str = "cover-test-";

/// Address of one card's record within a layout instance's bucket.
///
/// Singleton types are addressed by type alone; notes by card; cover tests
/// by card and tab. The string form (`objective`, `notes-<card>`,
/// `cover-test-<card>-<tab>`) is only used at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardKey {
    Singleton(ComponentType),
    Notes { card_id: String },
    CoverTest { card_id: String, tab_id: String },
}

impl CardKey {
    /// Key for a non-repeatable type.
    pub fn singleton(component: ComponentType) -> Option<Self> {
        (!component.is_repeatable()).then_some(CardKey::Singleton(component))
    }

    pub fn notes(card_id: impl Into<String>) -> Self {
        CardKey::Notes {
            card_id: card_id.into(),
        }
    }

    /// Key for one tab of a cover-test card. `tab_id` must not contain `-`,
    /// or the string form stops being unique.
    pub fn cover_test(card_id: impl Into<String>, tab_id: impl Into<String>) -> Self {
        CardKey::CoverTest {
            card_id: card_id.into(),
            tab_id: tab_id.into(),
        }
    }

    /// The component type addressed by this key.
    pub fn component(&self) -> ComponentType {
        match self {
            CardKey::Singleton(component) => *component,
            CardKey::Notes { .. } => ComponentType::Notes,
            CardKey::CoverTest { .. } => ComponentType::CoverTest,
        }
    }

    /// The owning card id, for repeatable types.
    pub fn card_id(&self) -> Option<&str> {
        match self {
            CardKey::Singleton(_) => None,
            CardKey::Notes { card_id } | CardKey::CoverTest { card_id, .. } => Some(card_id),
        }
    }

    pub fn tab_id(&self) -> Option<&str> {
        match self {
            CardKey::CoverTest { tab_id, .. } => Some(tab_id),
            _ => None,
        }
    }

    /// Parse the string form of a key.
    ///
    /// A cover-test suffix is split at its last `-`, since tab ids never
    /// contain one.
    pub fn parse(key: &str) -> Option<Self> {
        Self::parse_with_card(key, None)
    }

    /// Parse the string form of a key, using the record's card id (when known)
    /// to split a cover-test suffix exactly.
    pub fn parse_with_card(key: &str, card_id: Option<&str>) -> Option<Self> {
        if let Some(rest) = key.strip_prefix(COVER_TEST_PREFIX) {
            let split = card_id
                .and_then(|card| rest.strip_prefix(card).map(|tail| (card, tail)))
                .and_then(|(card, tail)| tail.strip_prefix('-').map(|tab| (card, tab)))
                .filter(|(_, tab)| is_tab_id(tab))
                .or_else(|| rest.rsplit_once('-'));

            return match split {
                Some((card, tab)) if !card.is_empty() && !tab.is_empty() => {
                    Some(CardKey::cover_test(card, tab))
                }
                _ => None,
            };
        }

        if let Some(card) = key.strip_prefix(NOTES_PREFIX) {
            return (!card.is_empty()).then(|| CardKey::notes(card));
        }

        ComponentType::from_slug(key).and_then(CardKey::singleton)
    }
}

/// Whether `tab_id` can be used as a tab id: non-empty and free of `-`.
pub fn is_tab_id(tab_id: &str) -> bool {
    !tab_id.is_empty() && !tab_id.contains('-')
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardKey::Singleton(component) => f.write_str(component.slug()),
            CardKey::Notes { card_id } => write!(f, "{}{}", NOTES_PREFIX, card_id),
            CardKey::CoverTest { card_id, tab_id } => {
                write!(f, "{}{}-{}", COVER_TEST_PREFIX, card_id, tab_id)
            }
        }
    }
}

/// Derive the key for a card.
///
/// Returns `None` for a cover-test card with no resolvable active tab; callers
/// treat that as a no-op.
pub fn card_key(card: &Card, tabs: &CardTabs) -> Option<CardKey> {
    match card.component {
        ComponentType::Notes => Some(CardKey::notes(&card.id)),
        ComponentType::CoverTest => tabs
            .active_tab(&card.id)
            .map(|tab| CardKey::cover_test(&card.id, tab)),
        component => CardKey::singleton(component),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms() {
        assert_eq!(
            CardKey::singleton(ComponentType::Objective).unwrap().to_string(),
            "objective"
        );
        assert_eq!(CardKey::notes("n1").to_string(), "notes-n1");
        assert_eq!(CardKey::cover_test("c1", "t2").to_string(), "cover-test-c1-t2");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            CardKey::parse("final-prescription"),
            CardKey::singleton(ComponentType::FinalPrescription)
        );
        assert_eq!(
            CardKey::parse("notes-notes-1700000000000-1a2b"),
            Some(CardKey::notes("notes-1700000000000-1a2b"))
        );
        assert_eq!(
            CardKey::parse("cover-test-cover-test-17-ab-t9"),
            Some(CardKey::cover_test("cover-test-17-ab", "t9"))
        );
    }

    #[test]
    fn test_parse_with_card_hint() {
        assert_eq!(
            CardKey::parse_with_card("cover-test-card-1-t1", Some("card-1")),
            Some(CardKey::cover_test("card-1", "t1"))
        );
        assert_eq!(
            CardKey::parse_with_card("cover-test-a-b-c", Some("a-b")),
            Some(CardKey::cover_test("a-b", "c"))
        );
        // A hint that does not match falls back to the last hyphen
        assert_eq!(
            CardKey::parse_with_card("cover-test-card-1-t1", Some("other")),
            Some(CardKey::cover_test("card-1", "t1"))
        );
    }

    #[test]
    fn test_hyphenated_tab_hint_is_ignored() {
        // "a" + "b-c" would print the same as "a-b" + "c"
        assert_eq!(
            CardKey::parse_with_card("cover-test-a-b-c", Some("a")),
            Some(CardKey::cover_test("a-b", "c"))
        );

        let key = CardKey::cover_test("cover-test-17-ab", "t9");
        assert_eq!(
            CardKey::parse_with_card(&key.to_string(), key.card_id()),
            Some(key)
        );
    }

    #[test]
    fn test_tab_id_check() {
        assert!(is_tab_id("t1a2b3c"));
        assert!(!is_tab_id(""));
        assert!(!is_tab_id("b-c"));
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert_eq!(CardKey::parse("notes"), None);
        assert_eq!(CardKey::parse("notes-"), None);
        assert_eq!(CardKey::parse("cover-test"), None);
        assert_eq!(CardKey::parse("cover-test-onlycard"), None);
        assert_eq!(CardKey::parse("phoropter"), None);
    }

    #[test]
    fn test_card_key_derivation() {
        let mut tabs = CardTabs::new();

        let objective = Card::new("o1", ComponentType::Objective);
        assert_eq!(
            card_key(&objective, &tabs),
            CardKey::singleton(ComponentType::Objective)
        );

        let notes = Card::new("n1", ComponentType::Notes);
        assert_eq!(card_key(&notes, &tabs), Some(CardKey::notes("n1")));

        let cover = Card::new("c1", ComponentType::CoverTest);
        assert_eq!(card_key(&cover, &tabs), None);

        let tab = tabs.add_tab("c1");
        assert_eq!(card_key(&cover, &tabs), Some(CardKey::cover_test("c1", tab)));
    }
}
