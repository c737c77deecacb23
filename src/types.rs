//! NewType wrappers for identity values that flow through tokens and storage.
//!
//! A user id, an email and an OAuth subject are all strings on the wire; the
//! wrappers keep them from being swapped in key construction and lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// True when the wrapped string is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
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

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype_string!(
    /// Stable identifier of a user account.
    ///
    /// This is the value carried in the `id` claim of every issued token and
    /// the middle segment of every session key.
    UserId
);

newtype_string!(
    /// Email address used for password sign-in.
    Email
);

newtype_string!(
    /// OAuth provider name, e.g. "google" or "line".
    AuthProvider
);

newtype_string!(
    /// Subject identifier assigned to the user by an OAuth provider.
    ExternalUserId
);

impl UserId {
    /// Generate a fresh random user id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
