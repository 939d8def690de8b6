//! # Open-Addressing Hash Table
//!
//! A Rust implementation of an open-addressing hash table for owned, opaque records.
//!
//! The table stores whole records and finds them by a string key that a caller-supplied
//! extractor returns for each record. Collisions are resolved with one of two probing
//! strategies:
//!
//! - [`ProbeMode::Linear`]: step to the next slot
//! - [`ProbeMode::DoubleHash`]: step by a second, key-dependent hash
//!
//! The table grows by doubling once its load factor reaches a configurable threshold.
//! With growth disabled, it reports [`Error::TableFull`] when every slot but one is
//! taken. Removed records leave tombstones that lookups probe past and inserts reuse.
//!
//! ## Basic Usage
//!
//! ```rust
//! use openhash::{OpenTable, ProbeMode, TableConfig};
//!
//! fn city_key<'a>(record: &'a (String, &'static str)) -> &'a str {
//!     &record.0
//! }
//!
//! let config = TableConfig::new(10).with_mode(ProbeMode::Linear).fixed();
//! let mut table = OpenTable::new(config, city_key)?;
//!
//! // The table takes ownership of each record
//! table.insert(("01001".to_string(), "São Paulo"))?;
//! table.insert(("20010".to_string(), "Rio de Janeiro"))?;
//!
//! assert_eq!(table.search("20010").map(|r| r.1), Some("Rio de Janeiro"));
//! assert!(table.search("99999").is_none());
//!
//! // Removing leaves a tombstone behind
//! assert!(table.remove("01001").is_some());
//! assert_eq!(table.tombstones(), 1);
//! # Ok::<(), openhash::Error>(())
//! ```
//!
//! ## Growth
//!
//! ```rust
//! use openhash::{OpenTable, PostalRecord, TableConfig, postal_key};
//!
//! let mut table = OpenTable::new(TableConfig::new(4).with_max_load_factor(0.75), postal_key)?;
//! for code in ["01001-000", "20010-000", "30110-001", "40010-000", "50010-000"] {
//!     table.insert(PostalRecord::new(code, "City", "ST"))?;
//! }
//!
//! // Five slots doubled to ten before the fifth insert
//! assert_eq!(table.capacity(), 10);
//! assert_eq!(table.search("30110").map(PostalRecord::code), Some("30110-001"));
//! # Ok::<(), openhash::Error>(())
//! ```

/// Errors reported by table operations
mod error;
/// Primary and secondary string hashes
pub mod hash;
/// Postal-code record with a memoized key
mod record;
/// The open-addressing table
mod table;
/// Utility functions and traits for the table
mod utils;

pub use error::{Error, Result};
pub use record::{KEY_LEN, PostalRecord, postal_key};
pub use table::{DEFAULT_BUCKETS, DEFAULT_MAX_LOAD_FACTOR, OpenTable, ProbeMode, TableConfig};
pub use utils::{TableExtensions, from_records};
