//! Normalised delivery addresses used as coordinate cache keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Errors returned by [`Address::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The address contained nothing but whitespace.
    #[error("address must contain at least one non-whitespace character")]
    Blank,
}

/// A delivery address in canonical form.
///
/// Normalisation trims the input, collapses every run of Unicode whitespace
/// into a single space and lowercases the result. Applying it to an already
/// normalised address yields the same address.
///
/// The display form keeps the caller's casing (with whitespace tidied) and is
/// what gets sent to a geocoder; the normalised form is the cache key.
///
/// # Examples
///
/// ```
/// use dispatch_core::Address;
///
/// # fn main() -> Result<(), dispatch_core::AddressError> {
/// let address = Address::parse("  12   Main\tSt ")?;
/// assert_eq!(address.key(), "12 main st");
/// assert_eq!(address.query(), "12 Main St");
/// assert_eq!(Address::parse(address.key())?.key(), address.key());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Address {
    key: String,
    query: String,
}

// Identity is the cache key alone; the query text is presentation.
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Address {
    /// Normalise `raw`, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let query = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if query.is_empty() {
            return Err(AddressError::Blank);
        }
        let key = query.to_lowercase();
        Ok(Self { key, query })
    }

    /// Rebuild an address from a stored cache key.
    ///
    /// The key is renormalised, so a hand-edited row still maps onto the
    /// canonical form.
    pub fn from_key(key: &str) -> Result<Self, AddressError> {
        let parsed = Self::parse(key)?;
        Ok(Self {
            query: parsed.key.clone(),
            key: parsed.key,
        })
    }

    /// The normalised cache key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The whitespace-tidied text to send to a geocoder.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}
