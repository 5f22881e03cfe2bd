//! API endpoint implementations.

mod characters;
mod health;

pub use characters::CharactersApi;
pub use health::HealthApi;
