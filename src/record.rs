//! Postal-code record stored by the probe report and benchmarks.

use std::cell::OnceCell;

/// Length of the key derived from a postal code.
pub const KEY_LEN: usize = 5;

/// A postal code with its city and state.
///
/// The table key is the first [`KEY_LEN`] characters of the code. It is derived
/// on first access and cached in the record, so repeated lookups return the same
/// string without recomputing it.
#[derive(Debug, Clone)]
pub struct PostalRecord {
    /// Full postal code, e.g. `01001-000`
    code: String,
    /// City name
    city: String,
    /// State abbreviation
    state: String,
    /// Memoized key
    key: OnceCell<String>,
}

impl PostalRecord {
    /// Creates a record; the key is not derived until [`PostalRecord::key`] is called.
    pub fn new(code: impl Into<String>, city: impl Into<String>, state: impl Into<String>) -> Self {
        Self { code: code.into(), city: city.into(), state: state.into(), key: OnceCell::new() }
    }

    /// Full postal code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// City name.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// State abbreviation.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Table key: the code's first [`KEY_LEN`] characters, cached after the first call.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.get_or_init(|| self.code.chars().take(KEY_LEN).collect())
    }

    /// Whether the key has been derived already.
    #[must_use]
    pub fn is_key_cached(&self) -> bool {
        self.key.get().is_some()
    }
}

/// Key extractor for tables of [`PostalRecord`]s.
#[must_use]
pub fn postal_key(record: &PostalRecord) -> &str {
    record.key()
}
