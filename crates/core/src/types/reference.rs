//! Opaque transaction references.
//!
//! A [`TxRef`] correlates a local pending payment with the external payment
//! gateway's transaction. References are generated locally at payment
//! initiation and echoed back by the gateway in its callback.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`TxRef`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum TxRefError {
    /// The input string is empty.
    #[error("transaction reference cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("transaction reference must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9_-]`.
    #[error("transaction reference contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// An opaque transaction reference.
///
/// ## Constraints
///
/// - Length: 1-100 characters (the gateway's correlation-id limit)
/// - Characters restricted to `[A-Za-z0-9_-]`
///
/// Generated references are UUIDv4-derived and carry a `mkt-` prefix, so
/// collisions across initiations are not a practical concern; the store's
/// unique constraint is the backstop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TxRef(String);

impl TxRef {
    /// Maximum length of a transaction reference.
    pub const MAX_LENGTH: usize = 100;

    /// Prefix applied to locally generated references.
    pub const PREFIX: &'static str = "mkt-";

    /// Generate a fresh, globally unique transaction reference.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Uuid::new_v4().simple()))
    }

    /// Parse a `TxRef` from a string (e.g., a callback query parameter).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 100 characters,
    /// or contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, TxRefError> {
        if s.is_empty() {
            return Err(TxRefError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(TxRefError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(bad) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(TxRefError::InvalidCharacter(bad));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `TxRef` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TxRef {
    type Err = TxRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for TxRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TxRef {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TxRef {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TxRef {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
