//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing an OrderId where an IdempotencyKey is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
///
/// The `prefix` form also gets a `generate()` constructor producing a
/// random, prefixed token.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
    ($name:ident, prefix = $prefix:literal) => {
        define_id!($name);

        impl $name {
            /// Generate a new random ID.
            pub fn generate() -> Self {
                Self(random_token($prefix))
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);
define_id!(SessionId, prefix = "sess");
define_id!(IdempotencyKey, prefix = "idem");

/// `<prefix>_` followed by 18 random bytes, URL-safe base64 without padding.
fn random_token(prefix: &str) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 18] = rand::thread_rng().gen();
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("tshirt");
        assert_eq!(id.as_str(), "tshirt");
    }

    #[test]
    fn test_generated_key_format() {
        let key = IdempotencyKey::generate();
        assert!(key.as_str().starts_with("idem_"));
        // 18 bytes encode to 24 base64 characters.
        assert_eq!(key.as_str().len(), 5 + 24);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
        assert_ne!(IdempotencyKey::generate(), IdempotencyKey::generate());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = OrderId::new("ord_42");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""ord_42""#);

        let back: OrderId = serde_json::from_str(r#""ord_42""#).unwrap();
        assert_eq!(back, id);
    }
}
