//! Domain types and collaborator contracts shared by the deck forge crates.

pub mod domain;
pub mod error;
pub mod ports;

pub use domain::*;
pub use error::{CoreError, CoreResult};
pub use ports::{CardCatalog, CardLookup, CardSearch, InventorySource, TextOracle};
