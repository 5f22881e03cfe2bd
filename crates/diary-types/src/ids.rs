//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of an authenticated user.
    UserId
);

string_id!(
    /// Identifier of a character (persona), assigned by the backend.
    CharacterId
);

string_id!(
    /// Identifier of the per-user relationship row for a character.
    RelationId
);

/// Prefix used for relation ids minted locally before the backend confirms.
const TEMPORARY_PREFIX: &str = "temp-";

impl RelationId {
    /// Mint a placeholder id for an optimistic relationship.
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMPORARY_PREFIX, Uuid::new_v4()))
    }

    /// Whether this id is a local placeholder rather than a backend id.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }
}
