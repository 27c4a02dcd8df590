//! Strongly-typed string identifiers.
//!
//! Agents reference landmarks by [`LandmarkKey`] and senders by
//! [`SenderId`]; none of these hold a pointer back to the thing they
//! name.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a string as this identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_string())
            }
        }

        impl From<String> for $name {
            fn from(v: String) -> Self {
                Self(v)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identity of one externally tracked worker.
    ///
    /// Assigned by the server; stable for the lifetime of the worker.
    AgentId
}

string_id! {
    /// Key of a landmark building, e.g. `barn` or `forge`.
    LandmarkKey
}

string_id! {
    /// Author identity on the message feed.
    SenderId
}

string_id! {
    /// Worker role, e.g. `researcher` or `worker`.
    ///
    /// Roles are free-form: the landmark registry decides which roles
    /// attract agents to which building.
    Role
}

impl Role {
    /// The role assigned when nothing more specific is known.
    pub fn generic() -> Self {
        Self::new("generic")
    }
}
