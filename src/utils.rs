//! Utility functions and traits for `OpenTable`

use crate::{OpenTable, TableConfig, error::Result};

/// Extension trait with bulk operations built on the table's public operations
pub trait TableExtensions<R> {
    /// Inserts every record in order, stopping at the first failure.
    ///
    /// Returns the number of records inserted. Records inserted before a failure
    /// stay in the table.
    ///
    /// # Errors
    ///
    /// The first error returned by `insert`.
    fn try_extend<I: IntoIterator<Item = R>>(&mut self, records: I) -> Result<usize>;

    /// Counts the keys that are present.
    fn hit_count<K: AsRef<str>, I: IntoIterator<Item = K>>(&self, keys: I) -> usize;

    /// Mean number of slots inspected to look up each key, `0.0` for no keys.
    fn average_probe_length<K: AsRef<str>, I: IntoIterator<Item = K>>(&self, keys: I) -> f64;
}

impl<R, F> TableExtensions<R> for OpenTable<R, F>
where
    F: Fn(&R) -> &str,
{
    fn try_extend<I: IntoIterator<Item = R>>(&mut self, records: I) -> Result<usize> {
        let mut inserted = 0_usize;
        for record in records {
            self.insert(record)?;
            inserted = inserted.saturating_add(1);
        }
        Ok(inserted)
    }

    fn hit_count<K: AsRef<str>, I: IntoIterator<Item = K>>(&self, keys: I) -> usize {
        keys.into_iter().filter(|key| self.contains_key(key.as_ref())).count()
    }

    #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
    fn average_probe_length<K: AsRef<str>, I: IntoIterator<Item = K>>(&self, keys: I) -> f64 {
        let (total, count) = keys
            .into_iter()
            .fold((0_usize, 0_usize), |(total, count), key| {
                (total.saturating_add(self.probe_length(key.as_ref())), count.saturating_add(1))
            });
        if count == 0 { 0.0 } else { total as f64 / count as f64 }
    }
}

/// Creates an `OpenTable` from `config` and fills it with `records`.
///
/// # Errors
///
/// Construction errors, or the first insert error.
pub fn from_records<R, F, I>(config: TableConfig, key_of: F, records: I) -> Result<OpenTable<R, F>>
where
    F: Fn(&R) -> &str,
    I: IntoIterator<Item = R>,
{
    let mut table = OpenTable::new(config, key_of)?;
    table.try_extend(records)?;
    Ok(table)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{Error, PostalRecord, ProbeMode, postal_key};

    fn records(codes: &[&str]) -> Vec<PostalRecord> {
        codes.iter().map(|code| PostalRecord::new(*code, "City", "ST")).collect()
    }

    #[test]
    fn test_from_records() {
        let table = from_records(
            TableConfig::new(6).with_max_load_factor(0.5),
            postal_key,
            records(&["01001-000", "20010-000", "30110-001", "40010-000", "50010-000"]),
        )
        .unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.search("20010").map(PostalRecord::code), Some("20010-000"));
        // 4/7 reached the threshold before the fifth insert
        assert_eq!(table.capacity(), 14);
    }

    #[test]
    fn test_try_extend_stops_at_full_table() {
        let mut table =
            OpenTable::new(TableConfig::new(2).with_mode(ProbeMode::Linear).fixed(), postal_key)
                .unwrap();
        let result = table.try_extend(records(&["11111", "22222", "33333"]));
        assert_eq!(result, Err(Error::TableFull { capacity: 3 }));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_hit_count_and_probe_length() {
        let table =
            from_records(TableConfig::new(100).fixed(), postal_key, records(&["11111", "22222"]))
                .unwrap();
        assert_eq!(table.hit_count(["11111", "22222", "33333"]), 2);
        assert!(table.average_probe_length(["11111", "22222"]) >= 1.0);
        assert!(table.average_probe_length(std::iter::empty::<&str>()).abs() < f64::EPSILON);
    }
}
