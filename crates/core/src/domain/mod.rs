pub mod card;
pub mod color;
pub mod commander;
pub mod deck;

pub use card::*;
pub use color::*;
pub use commander::*;
pub use deck::*;
