//! Scryfall adapter for card lookup and search.
//!
//! Implements [`deck_core::CardLookup`] and [`deck_core::CardSearch`] over the
//! public REST API, normalizing multi-faced cards into a single
//! [`deck_core::CardRecord`].

pub mod client;
pub mod error;
pub mod types;

pub use client::{ScryfallClient, DEFAULT_BASE_URL};
pub use error::{ScryfallError, ScryfallResult};
