//! Packing a flat card list into rows.

use serde::{Deserialize, Serialize};

use super::card::{Card, Row};

/// Row budget used when packing cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingConfig {
    /// Maximum number of cards in one row.
    pub max_cards_per_row: usize,
    /// Sum of nominal card widths (percent) a row may hold.
    pub row_width_budget: u32,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            max_cards_per_row: 3,
            row_width_budget: 100,
        }
    }
}

impl PackingConfig {
    pub fn with_max_cards_per_row(mut self, max: usize) -> Self {
        self.max_cards_per_row = max;
        self
    }

    pub fn with_row_width_budget(mut self, budget: u32) -> Self {
        self.row_width_budget = budget;
        self
    }
}

/// Fill rows in card order, starting a new row whenever the next card would
/// exceed the card count or width budget.
///
/// A card wider than the whole budget gets a row of its own.
pub fn pack_cards(cards: Vec<Card>, config: &PackingConfig) -> Vec<Row> {
    let max_cards = config.max_cards_per_row.max(1);
    let mut rows = Vec::new();
    let mut current = Row::generate();
    let mut used = 0u32;

    for card in cards {
        let width = card.component.nominal_width();
        let full = current.cards.len() >= max_cards || used + width > config.row_width_budget;

        if !current.is_empty() && full {
            rows.push(std::mem::replace(&mut current, Row::generate()));
            used = 0;
        }

        used += width;
        current.cards.push(card);
    }

    if !current.is_empty() {
        rows.push(current);
    }

    rows
}
