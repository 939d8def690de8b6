use std::{fmt, mem};

use tracing::{debug, trace, warn};

use crate::{
    error::{Error, Result},
    hash::{SEED, primary_hash, secondary_hash},
};

/// Growth threshold used by [`TableConfig::default`].
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.85;

/// Bucket count used by [`TableConfig::default`].
pub const DEFAULT_BUCKETS: usize = 64;

/// How the probe sequence advances after a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// Step of one slot.
    Linear,
    /// Step derived from the secondary hash of the key.
    #[default]
    DoubleHash,
}

/// Construction parameters of an [`OpenTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Nominal bucket count; the table allocates one slot more.
    pub buckets: usize,
    /// Probing strategy
    pub mode: ProbeMode,
    /// Load factor that triggers growth before an insert; `<= 0` disables growth.
    pub max_load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}

impl TableConfig {
    /// Config with `buckets` buckets, double hashing and the default growth threshold.
    #[must_use]
    pub fn new(buckets: usize) -> Self {
        Self { buckets, mode: ProbeMode::default(), max_load_factor: DEFAULT_MAX_LOAD_FACTOR }
    }

    /// Sets the probing strategy.
    #[must_use]
    pub fn with_mode(mut self, mode: ProbeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the growth threshold. Pass `0.0` to disable growth.
    #[must_use]
    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// Disables growth: a full table rejects inserts with [`Error::TableFull`].
    #[must_use]
    pub fn fixed(self) -> Self {
        self.with_max_load_factor(0.0)
    }

    /// Slot count for this config: `buckets + 1`, so one slot always stays free.
    fn capacity(&self) -> Result<usize> {
        if self.buckets == 0 {
            return Err(Error::InvalidConfig("bucket count must be positive"));
        }
        if self.max_load_factor.is_nan() || self.max_load_factor > 1.0 {
            return Err(Error::InvalidConfig("max load factor must be at most 1"));
        }
        self.buckets.checked_add(1).ok_or(Error::InvalidConfig("bucket count overflows"))
    }
}

/// State of one slot of the table.
#[derive(Debug)]
enum Slot<R> {
    /// Never used since the last growth.
    Empty,
    /// Held a record that was removed; does not end a probe sequence.
    Tombstone,
    /// Owns exactly one record.
    Occupied(R),
}

impl<R> Slot<R> {
    /// Insertion target: empty or tombstone.
    fn is_vacant(&self) -> bool {
        !matches!(self, Self::Occupied(_))
    }

    /// Never used slot.
    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Takes the record out of an occupied slot.
    fn into_record(self) -> Option<R> {
        match self {
            Self::Occupied(record) => Some(record),
            Self::Empty | Self::Tombstone => None,
        }
    }
}

/// Slot indices visited for one key, at most one full lap over the table.
#[derive(Debug, Clone)]
struct Probe {
    /// Next slot to yield
    pos: usize,
    /// Distance between consecutive slots, coprime with `len`
    step: usize,
    /// Slot count of the table
    len: usize,
    /// Slots left before the lap is complete
    remaining: usize,
}

impl Probe {
    /// Probe sequence of `key` in a table of `len` slots.
    fn new(key: &str, mode: ProbeMode, len: usize) -> Self {
        let step = match mode {
            ProbeMode::Linear => 1,
            ProbeMode::DoubleHash => coprime_step(reduce(secondary_hash(key, SEED), len), len),
        };
        Self { pos: reduce(primary_hash(key, SEED), len), step, len, remaining: len }
    }
}

impl Iterator for Probe {
    type Item = usize;

    #[allow(clippy::arithmetic_side_effects)]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.pos;
        // pos and step are both below len, the sum cannot overflow a slice length
        self.pos = (self.pos + self.step) % self.len;
        Some(current)
    }
}

/// `hash mod len`.
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
fn reduce(hash: u32, len: usize) -> usize {
    hash as usize % len.max(1)
}

/// Smallest step at or after `raw` (wrapping to 1) that is coprime with `len`.
///
/// A coprime step makes a lap of `len` probes visit every slot exactly once.
#[allow(clippy::arithmetic_side_effects)]
fn coprime_step(raw: usize, len: usize) -> usize {
    let mut step = raw.max(1);
    while gcd(step, len) != 1 {
        step = step % len + 1;
    }
    step
}

/// Greatest common divisor.
#[allow(clippy::arithmetic_side_effects)]
fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// First slot on the probe sequence of `key` accepted by `accept`.
fn probe_for<R>(
    slots: &[Slot<R>],
    key: &str,
    mode: ProbeMode,
    accept: fn(&Slot<R>) -> bool,
) -> Option<usize> {
    Probe::new(key, mode, slots.len()).find(|&index| slots.get(index).is_some_and(accept))
}

#[cfg(test)]
thread_local! {
    /// Makes the next slot allocation on this thread fail.
    static FAIL_NEXT_ALLOC: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Allocates `len` empty slots, reporting allocation failure instead of aborting.
fn alloc_slots<R>(len: usize) -> Result<Vec<Slot<R>>> {
    #[cfg(test)]
    let len = if FAIL_NEXT_ALLOC.with(|fail| fail.replace(false)) { usize::MAX } else { len };
    let mut slots = Vec::new();
    slots.try_reserve_exact(len)?;
    slots.resize_with(len, || Slot::Empty);
    Ok(slots)
}

/// An open-addressing hash table that owns opaque records.
///
/// Records are keyed by the string the extractor `F` returns for them. The table
/// never looks inside a record otherwise. Duplicate keys are not rejected: a
/// lookup returns the first match on the probe sequence.
///
/// The table is not thread-safe; wrap it in external synchronization to share it.
pub struct OpenTable<R, F = fn(&R) -> &str> {
    /// Slot array; its length is the capacity
    slots: Vec<Slot<R>>,
    /// Occupied slot count, always below the capacity
    size: usize,
    /// Tombstone count
    tombstones: usize,
    /// Probing strategy
    mode: ProbeMode,
    /// Growth threshold, `<= 0` when growth is disabled
    max_load_factor: f64,
    /// Key extractor
    key_of: F,
}

impl<R, F> fmt::Debug for OpenTable<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenTable")
            .field("capacity", &self.slots.len())
            .field("size", &self.size)
            .field("tombstones", &self.tombstones)
            .field("mode", &self.mode)
            .field("max_load_factor", &self.max_load_factor)
            .finish_non_exhaustive()
    }
}

impl<R, F> OpenTable<R, F>
where
    F: Fn(&R) -> &str,
{
    /// Creates a table with `config.buckets + 1` empty slots.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] for a zero bucket count or a load factor above 1,
    /// [`Error::Allocation`] when the slot array cannot be allocated.
    pub fn new(config: TableConfig, key_of: F) -> Result<Self> {
        let capacity = config.capacity()?;
        let slots = alloc_slots(capacity)?;
        trace!(capacity, mode = ?config.mode, max_load_factor = config.max_load_factor, "table created");
        Ok(Self {
            slots,
            size: 0,
            tombstones: 0,
            mode: config.mode,
            max_load_factor: config.max_load_factor,
            key_of,
        })
    }

    /// Shorthand for [`OpenTable::new`] with positional parameters.
    ///
    /// # Errors
    ///
    /// Same as [`OpenTable::new`].
    pub fn with_buckets(
        buckets: usize,
        key_of: F,
        mode: ProbeMode,
        max_load_factor: f64,
    ) -> Result<Self> {
        Self::new(TableConfig { buckets, mode, max_load_factor }, key_of)
    }

    /// Whether the next insert must grow the table first: growth is enabled and
    /// the load factor reached the threshold.
    #[allow(clippy::cast_precision_loss)]
    fn needs_growth(&self) -> bool {
        self.max_load_factor > 0.0 &&
            self.size as f64 / self.slots.len() as f64 >= self.max_load_factor
    }

    /// Inserts `record`, taking ownership of it.
    ///
    /// When growth is enabled and the load factor has reached the threshold, the
    /// table doubles first. The capacity check runs after that either way, so a
    /// table whose threshold is not yet reached can still be full. The record goes to the first empty or tombstone slot
    /// on its probe sequence.
    ///
    /// # Errors
    ///
    /// [`Error::TableFull`] when only the reserved free slot is left,
    /// [`Error::Allocation`] when growth cannot allocate. The record is dropped
    /// and the table is unchanged in both cases.
    pub fn insert(&mut self, record: R) -> Result<()> {
        if self.needs_growth() {
            self.grow()?;
        }

        let capacity = self.slots.len();
        if self.size >= capacity.saturating_sub(1) {
            warn!(capacity, size = self.size, "insert rejected: table is full");
            return Err(Error::TableFull { capacity });
        }

        let index = probe_for(&self.slots, (self.key_of)(&record), self.mode, Slot::is_vacant)
            .ok_or(Error::TableFull { capacity })?;
        let slot = self.slots.get_mut(index).ok_or(Error::TableFull { capacity })?;
        if matches!(slot, Slot::Tombstone) {
            self.tombstones = self.tombstones.saturating_sub(1);
        }
        *slot = Slot::Occupied(record);
        self.size = self.size.saturating_add(1);
        Ok(())
    }

    /// Doubles the capacity and re-places every record. Tombstones are dropped.
    ///
    /// Called by [`OpenTable::insert`] when the load factor is reached; may also be
    /// called directly to make room in a table without automatic growth.
    ///
    /// # Errors
    ///
    /// [`Error::Allocation`] when the new slot array cannot be allocated. The
    /// table keeps its old slots and stays fully usable.
    pub fn grow(&mut self) -> Result<()> {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity.saturating_mul(2);
        let mut slots = alloc_slots(new_capacity)?;
        let mut targets = Vec::new();
        targets.try_reserve_exact(self.size)?;

        // Positions are planned before any record moves. A planned slot is marked
        // with a tombstone so later records probe past it.
        for slot in &self.slots {
            if let Slot::Occupied(record) = slot {
                let index = probe_for(&slots, (self.key_of)(record), self.mode, Slot::is_empty)
                    .ok_or(Error::TableFull { capacity: new_capacity })?;
                if let Some(planned) = slots.get_mut(index) {
                    *planned = Slot::Tombstone;
                }
                targets.push(index);
            }
        }

        let old = mem::replace(&mut self.slots, slots);
        self.size = 0;
        for (record, index) in old.into_iter().filter_map(Slot::into_record).zip(targets) {
            if let Some(slot) = self.slots.get_mut(index) {
                *slot = Slot::Occupied(record);
                self.size = self.size.saturating_add(1);
            }
        }
        self.tombstones = 0;

        debug!(from = old_capacity, to = new_capacity, records = self.size, "table grown");
        Ok(())
    }

    /// Walks the probe sequence of `key` like a lookup does.
    ///
    /// Returns the matching slot, if any, and how many slots were inspected.
    fn locate(&self, key: &str) -> (Option<usize>, usize) {
        let mut inspected = 0_usize;
        for index in Probe::new(key, self.mode, self.slots.len()) {
            inspected = inspected.saturating_add(1);
            match self.slots.get(index) {
                None | Some(Slot::Empty) => return (None, inspected),
                Some(Slot::Occupied(record)) if (self.key_of)(record) == key => {
                    return (Some(index), inspected);
                }
                Some(Slot::Occupied(_) | Slot::Tombstone) => {}
            }
        }
        (None, inspected)
    }

    /// Looks up the record stored under `key`.
    ///
    /// Stops at the first empty slot or after one lap over every slot, so it
    /// terminates even when no empty slot is left.
    #[must_use]
    pub fn search(&self, key: &str) -> Option<&R> {
        let index = self.locate(key).0?;
        match self.slots.get(index)? {
            Slot::Occupied(record) => Some(record),
            Slot::Empty | Slot::Tombstone => None,
        }
    }

    /// Mutable lookup. The record's key must not change through the reference.
    pub fn search_mut(&mut self, key: &str) -> Option<&mut R> {
        let index = self.locate(key).0?;
        match self.slots.get_mut(index)? {
            Slot::Occupied(record) => Some(record),
            Slot::Empty | Slot::Tombstone => None,
        }
    }

    /// Number of slots a lookup of `key` inspects, hit or miss. Never above
    /// [`OpenTable::capacity`].
    #[must_use]
    pub fn probe_length(&self, key: &str) -> usize {
        self.locate(key).1
    }

    /// Removes the record stored under `key`, leaving a tombstone in its slot.
    ///
    /// The capacity never shrinks; tombstones are reused by inserts and cleared
    /// by growth.
    pub fn remove(&mut self, key: &str) -> Option<R> {
        let index = self.locate(key).0?;
        let slot = self.slots.get_mut(index)?;
        match mem::replace(slot, Slot::Tombstone) {
            Slot::Occupied(record) => {
                self.size = self.size.saturating_sub(1);
                self.tombstones = self.tombstones.saturating_add(1);
                Some(record)
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Whether a record is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.locate(key).0.is_some()
    }
}

impl<R, F> OpenTable<R, F> {
    /// Releases every record and the slot array, returning how many records
    /// were released.
    ///
    /// Consuming the table rules out use after destruction. Dropping the table
    /// releases the same resources.
    pub fn destroy(self) -> usize {
        let capacity = self.slots.len();
        let released = self.slots.into_iter().filter_map(Slot::into_record).count();
        trace!(capacity, released, "table destroyed");
        released
    }

    /// Number of records stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether no record is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of slots, one more than the nominal bucket count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots holding a tombstone.
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Current ratio of stored records to slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.slots.len() as f64
    }

    /// Probing strategy.
    #[must_use]
    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    /// Growth threshold, `<= 0` when growth is disabled.
    #[must_use]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }
}
