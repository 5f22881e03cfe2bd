//! HTTP client for the diary backend.
//!
//! This crate provides a typed client for the character roster endpoints
//! and implements the roster cache's collaborator traits on top of it.
//!
//! # Example
//!
//! ```no_run
//! use diary_client::{DiaryClient, Result};
//! use diary_types::UserId;
//!
//! # async fn example() -> Result<()> {
//! let client = DiaryClient::builder()
//!     .base_url("http://localhost:8080")
//!     .api_key("secret")
//!     .build()?;
//!
//! if client.health().is_healthy().await {
//!     println!("Backend is healthy!");
//! }
//!
//! let user = UserId::new("user-1");
//! for character in client.characters().roster(&user).await? {
//!     println!("{} following={}", character.name, character.is_following);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
mod source;
pub mod types;

pub use client::{ClientBuilder, DiaryClient};
pub use error::{Error, Result};
pub use types::*;
