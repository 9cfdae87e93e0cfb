//! Layout structure: rows of cards, card keys and tabs, and row packing.

mod card;
mod data;
mod key;
mod packing;
mod tabs;

pub use card::{Card, Row};
pub use data::{CopyDirection, CustomWidths, LayoutData};
pub use key::{card_key, CardKey};
pub use packing::{pack_cards, PackingConfig};
pub use tabs::CardTabs;
