// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-assigned identifiers.
//!
//! Jobs and runs are numbered sequentially by the store, starting at 1, so
//! operators can type `cw run watch -r 12` straight from a listing.

use thiserror::Error;

/// Error parsing an id from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid id '{input}': expected a positive integer")]
pub struct ParseIdError {
    pub input: String,
}

/// Parse a positive integer id, accepting surrounding whitespace.
pub fn parse_id(s: &str) -> Result<u64, ParseIdError> {
    match s.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseIdError { input: s.to_string() }),
    }
}

/// Define a sequential numeric id newtype.
///
/// Generates `new()`, `get()`, `next()`, `Display`, `FromStr`, and
/// `From<u64>`. Serializes as a bare integer.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct RunId;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            /// The id the store hands out after this one.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self(n)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::id::ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::id::parse_id(s).map(Self)
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
