// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt;
use std::ops::Range;

use crate::common::DEFAULT_RESERVE_FRACTION;
use crate::common::DEFAULT_SLOTS;
use crate::common::Occupancy;
use crate::common::Slot;
use crate::common::allocate_slots;
use crate::common::capacity_exceeded;
use crate::common::region_exhausted;
use crate::common::write_region;
use crate::error::Error;
use crate::funnel::DEFAULT_BUCKET_SIZE;
use crate::hash::IndexReducer;
use crate::hash::slot_hash;
use crate::layout::FunnelLayout;
use crate::layout::default_level_fractions;
use crate::probe::LinearProbe;

#[derive(Debug)]
struct BucketLevel {
    slots: Box<[Slot]>,
    // Reduces hashes onto bucket indices, not slot indices.
    buckets: IndexReducer,
}

#[derive(Debug)]
struct Overflow {
    slots: Box<[Slot]>,
    reducer: IndexReducer,
}

/// Where a key sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Level(usize, usize),
    Overflow(usize),
    /// A level slot outside the key's own buckets, taken because the overflow
    /// region was full.
    Displaced(usize, usize),
}

/// Fixed-capacity set of `u64` keys using funnel hashing.
///
/// Use [`FunnelTable::new`] or [`FunnelTable::builder`] to construct instances.
///
/// Mutation takes `&mut self`; concurrent readers may share `&FunnelTable`
/// freely.
#[derive(Debug)]
pub struct FunnelTable {
    layout: FunnelLayout,
    reserve_fraction: f64,
    levels: Vec<BucketLevel>,
    overflow: Overflow,
    // Live keys stored at a `Location::Displaced` slot.
    displaced: usize,
    occupancy: Occupancy,
}

impl FunnelTable {
    /// Creates a table of `slots` slots in buckets of `bucket_size`, leaving a
    /// fraction `reserve_fraction` of them empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if `slots` or
    /// `bucket_size` is zero, or `reserve_fraction` is not in `[0, 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use probeset::funnel::FunnelTable;
    /// let table = FunnelTable::new(100, 4, 0.25).unwrap();
    /// assert_eq!(table.capacity(), 75);
    /// assert!(FunnelTable::new(100, 0, 0.25).is_err());
    /// ```
    pub fn new(slots: usize, bucket_size: usize, reserve_fraction: f64) -> Result<Self, Error> {
        Self::builder()
            .slots(slots)
            .bucket_size(bucket_size)
            .reserve_fraction(reserve_fraction)
            .build()
    }

    /// Create a new builder for FunnelTable
    pub fn builder() -> FunnelTableBuilder {
        FunnelTableBuilder::default()
    }

    /// Inserts a key.
    ///
    /// Returns `Ok(true)` if the key was added and `Ok(false)` if it was
    /// already present, in which case nothing changes.
    ///
    /// A key whose buckets are full goes to the overflow region. If that region
    /// has no free slot either, the key takes the first free slot of any level.
    ///
    /// # Errors
    ///
    /// * [`CapacityExceeded`](crate::error::ErrorKind::CapacityExceeded) if the table already
    ///   holds `capacity()` keys, even when `key` is one of them. The table is left untouched.
    /// * [`InvariantViolated`](crate::error::ErrorKind::InvariantViolated) if no slot at all is
    ///   free although the table is below capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use probeset::funnel::FunnelTable;
    /// # use probeset::error::ErrorKind;
    /// let mut table = FunnelTable::new(4, 2, 0.5).unwrap();
    /// assert!(table.insert(1).unwrap());
    /// assert!(!table.insert(1).unwrap());
    /// assert!(table.insert(2).unwrap());
    /// let err = table.insert(1).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    /// ```
    pub fn insert(&mut self, key: u64) -> Result<bool, Error> {
        if self.occupancy.is_full() {
            return Err(capacity_exceeded(key, &self.occupancy));
        }
        if self.find(key).is_some() {
            return Ok(false);
        }

        match self.free_slot(key)? {
            Location::Level(level_idx, pos) => {
                self.levels[level_idx].slots[pos] = Slot::Occupied(key);
            }
            Location::Overflow(pos) => {
                self.overflow.slots[pos] = Slot::Occupied(key);
            }
            Location::Displaced(level_idx, pos) => {
                self.levels[level_idx].slots[pos] = Slot::Occupied(key);
                self.displaced += 1;
            }
        }
        self.occupancy.increment();
        Ok(true)
    }

    /// Returns whether the key is present.
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_some()
    }

    /// Removes a key, leaving a tombstone in its slot.
    ///
    /// Returns whether the key was present. No other slot is touched.
    pub fn remove(&mut self, key: u64) -> bool {
        let slot = match self.find(key) {
            Some(Location::Level(level_idx, pos)) => &mut self.levels[level_idx].slots[pos],
            Some(Location::Overflow(pos)) => &mut self.overflow.slots[pos],
            Some(Location::Displaced(level_idx, pos)) => {
                self.displaced -= 1;
                &mut self.levels[level_idx].slots[pos]
            }
            None => return false,
        };
        *slot = Slot::Tombstone;
        self.occupancy.decrement();
        true
    }

    /// Number of keys in the table.
    pub fn len(&self) -> usize {
        self.occupancy.load()
    }

    /// Check if the table holds no key.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of keys: `floor((1 - δ) * slots)`.
    pub fn capacity(&self) -> usize {
        self.occupancy.ceiling()
    }

    /// The reserve fraction δ the table was built with.
    pub fn reserve_fraction(&self) -> f64 {
        self.reserve_fraction
    }

    pub fn bucket_size(&self) -> usize {
        self.layout.bucket_size()
    }

    /// Level geometry of the table.
    pub fn layout(&self) -> &FunnelLayout {
        &self.layout
    }

    /// Number of allocated slots, overflow region included.
    pub fn total_slots(&self) -> usize {
        self.layout.total_slots()
    }

    /// Number of keys held by each level, followed by the overflow region.
    pub fn level_occupancy(&self) -> Vec<usize> {
        let live = |slots: &[Slot]| slots.iter().filter(|slot| slot.key().is_some()).count();
        self.levels
            .iter()
            .map(|level| live(&level.slots[..]))
            .chain(std::iter::once(live(&self.overflow.slots[..])))
            .collect()
    }

    /// Return iterator over the keys, level by level and the overflow region last.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.levels
            .iter()
            .map(|level| &level.slots)
            .chain(std::iter::once(&self.overflow.slots))
            .flat_map(|slots| slots.iter().filter_map(|slot| slot.key()))
    }

    /// Slot range of the bucket `key` hashes to in level `level_idx`.
    #[inline]
    fn bucket(&self, key: u64, level_idx: usize) -> Range<usize> {
        let bucket_size = self.bucket_size();
        let bucket = self.levels[level_idx]
            .buckets
            .reduce(slot_hash(key, level_idx, 0));
        let start = bucket * bucket_size;
        start..start + bucket_size
    }

    /// The overflow region is probed from a hash lane no level uses.
    #[inline]
    fn overflow_probe(&self, key: u64) -> LinearProbe {
        LinearProbe::start(slot_hash(key, self.levels.len(), 0), self.overflow.reducer)
    }

    /// Locates a key, replaying the order insertion used.
    ///
    /// An empty slot ends the scan of a bucket, or of the overflow region:
    /// an insertion walking the same order would have stopped there. Keys are
    /// only displaced once the overflow region holds no empty slot, so the
    /// level-wide scan runs only after a full pass over that region.
    fn find(&self, key: u64) -> Option<Location> {
        for (level_idx, level) in self.levels.iter().enumerate() {
            for pos in self.bucket(key, level_idx) {
                match level.slots[pos] {
                    Slot::Occupied(k) if k == key => return Some(Location::Level(level_idx, pos)),
                    Slot::Empty => break,
                    _ => {}
                }
            }
        }

        for pos in self.overflow_probe(key) {
            match self.overflow.slots[pos] {
                Slot::Occupied(k) if k == key => return Some(Location::Overflow(pos)),
                Slot::Empty => return None,
                _ => {}
            }
        }
        if self.displaced == 0 {
            return None;
        }

        self.levels.iter().enumerate().find_map(|(level_idx, level)| {
            level
                .slots
                .iter()
                .position(|&slot| slot == Slot::Occupied(key))
                .map(|pos| Location::Displaced(level_idx, pos))
        })
    }

    /// Picks the slot a new key goes to: the first free slot of the first
    /// bucket with room, else the overflow region, else any free level slot.
    ///
    /// A tombstone in a bucket is claimed like an empty slot. This cannot
    /// duplicate a key because `insert` runs `find` first.
    fn free_slot(&self, key: u64) -> Result<Location, Error> {
        for (level_idx, level) in self.levels.iter().enumerate() {
            if let Some(pos) = self
                .bucket(key, level_idx)
                .find(|&pos| level.slots[pos].is_free())
            {
                return Ok(Location::Level(level_idx, pos));
            }
        }

        tracing::trace!(key, "every bucket full, probing overflow region");
        if let Some(pos) = self
            .overflow_probe(key)
            .find(|&pos| self.overflow.slots[pos].is_free())
        {
            return Ok(Location::Overflow(pos));
        }

        tracing::debug!(key, "overflow region full, displacing key into a level");
        self.levels
            .iter()
            .enumerate()
            .find_map(|(level_idx, level)| {
                level
                    .slots
                    .iter()
                    .position(|slot| slot.is_free())
                    .map(|pos| Location::Displaced(level_idx, pos))
            })
            .ok_or_else(|| region_exhausted(key, "bucket", &self.occupancy))
    }
}

/// Dumps every level and the overflow region, `_` marking empty slots and
/// `~` tombstones. For debugging only.
impl fmt::Display for FunnelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "FunnelTable: len={}, capacity={}, bucket_size={}",
            self.len(),
            self.capacity(),
            self.bucket_size()
        )?;
        for (level_idx, (level, buckets)) in self
            .levels
            .iter()
            .zip(self.layout.level_buckets())
            .enumerate()
        {
            write!(f, "Level {level_idx} ({buckets} buckets): ")?;
            write_region(f, &level.slots)?;
        }
        write!(f, "Overflow ({} slots): ", self.overflow.slots.len())?;
        write_region(f, &self.overflow.slots)
    }
}

/// Builder for creating [`FunnelTable`] instances.
#[derive(Debug, Clone)]
pub struct FunnelTableBuilder {
    slots: usize,
    bucket_size: usize,
    reserve_fraction: f64,
    level_fractions: Option<Vec<f64>>,
    power_of_two_regions: bool,
}

impl Default for FunnelTableBuilder {
    fn default() -> Self {
        FunnelTableBuilder {
            slots: DEFAULT_SLOTS,
            bucket_size: DEFAULT_BUCKET_SIZE,
            reserve_fraction: DEFAULT_RESERVE_FRACTION,
            level_fractions: None,
            power_of_two_regions: false,
        }
    }
}

impl FunnelTableBuilder {
    /// Sets the total number of slots `n` (default: 1024).
    pub fn slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    /// Sets the number of slots per bucket (default: 8).
    pub fn bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Sets the fraction δ of slots left empty (default: 0.1).
    pub fn reserve_fraction(mut self, reserve_fraction: f64) -> Self {
        self.reserve_fraction = reserve_fraction;
        self
    }

    /// Sets the share of `n` given to each level, largest first.
    ///
    /// Defaults to [`default_level_fractions`] of the reserve fraction. The
    /// fractions must each lie in `(0, 1)` and sum to less than one; the rest
    /// becomes the overflow region.
    pub fn level_fractions(mut self, fractions: impl Into<Vec<f64>>) -> Self {
        self.level_fractions = Some(fractions.into());
        self
    }

    /// Rounds the overflow region up to a power of two when that grows it by
    /// at most 25% (default: off).
    pub fn power_of_two_regions(mut self, enabled: bool) -> Self {
        self.power_of_two_regions = enabled;
        self
    }

    /// Builds the table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) before allocating
    /// anything if a parameter is out of range, and
    /// [`AllocationFailed`](crate::error::ErrorKind::AllocationFailed) if the slots cannot be
    /// reserved.
    pub fn build(self) -> Result<FunnelTable, Error> {
        let fractions = match &self.level_fractions {
            Some(fractions) => fractions.as_slice(),
            None => default_level_fractions(self.reserve_fraction),
        };
        let layout = FunnelLayout::plan(
            self.slots,
            self.bucket_size,
            self.reserve_fraction,
            fractions,
            self.power_of_two_regions,
        )?;

        let levels = layout
            .level_buckets()
            .iter()
            .map(|&buckets| -> Result<BucketLevel, Error> {
                Ok(BucketLevel {
                    slots: allocate_slots(buckets * layout.bucket_size())?,
                    buckets: IndexReducer::for_len(buckets),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let overflow = Overflow {
            slots: allocate_slots(layout.overflow_slots())?,
            reducer: IndexReducer::for_len(layout.overflow_slots()),
        };

        tracing::debug!(
            slots = layout.total_slots(),
            capacity = layout.capacity(),
            bucket_size = layout.bucket_size(),
            level_buckets = ?layout.level_buckets(),
            overflow_slots = layout.overflow_slots(),
            "built funnel table"
        );

        Ok(FunnelTable {
            occupancy: Occupancy::new(layout.capacity()),
            reserve_fraction: self.reserve_fraction,
            layout,
            levels,
            overflow,
            displaced: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_first_key_lands_in_first_level() {
        let mut table = FunnelTable::new(100, 4, 0.25).unwrap();
        table.insert(10).unwrap();
        assert!(matches!(table.find(10), Some(Location::Level(0, _))));
        assert_eq!(table.level_occupancy(), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_bucket_ranges_are_aligned() {
        let table = FunnelTable::new(100, 4, 0.25).unwrap();
        for key in 0..200 {
            for level_idx in 0..3 {
                let range = table.bucket(key, level_idx);
                assert_eq!(range.start % 4, 0);
                assert_eq!(range.len(), 4);
                assert!(range.end <= table.levels[level_idx].slots.len());
            }
        }
    }

    #[test]
    fn test_full_bucket_spills_to_next_level() {
        let mut table = FunnelTable::new(100, 4, 0.25).unwrap();
        let target = table.bucket(0, 0);
        let same_bucket: Vec<u64> = (0..10_000)
            .filter(|&key| table.bucket(key, 0) == target)
            .take(5)
            .collect();
        assert_eq!(same_bucket.len(), 5);

        for &key in &same_bucket {
            table.insert(key).unwrap();
        }
        for &key in &same_bucket[..4] {
            assert!(matches!(table.find(key), Some(Location::Level(0, _))));
        }
        assert!(!matches!(table.find(same_bucket[4]), Some(Location::Level(0, _))));
        assert!(table.contains(same_bucket[4]));
    }

    #[test]
    fn test_tombstone_in_bucket_is_reused_without_duplicates() {
        let mut table = FunnelTable::new(100, 4, 0.25).unwrap();
        let target = table.bucket(0, 0);
        let same_bucket: Vec<u64> = (0..10_000)
            .filter(|&key| table.bucket(key, 0) == target)
            .take(6)
            .collect();
        for &key in &same_bucket[..5] {
            table.insert(key).unwrap();
        }
        let spilled = same_bucket[4];
        let spilled_at = table.find(spilled).unwrap();

        // Free a slot in the first-level bucket, then re-insert the spilled key.
        assert!(table.remove(same_bucket[0]));
        assert!(!table.insert(spilled).unwrap());
        assert_eq!(table.find(spilled), Some(spilled_at));
        assert_eq!(table.len(), 4);

        // A fresh key takes the tombstone.
        table.insert(same_bucket[5]).unwrap();
        assert!(matches!(table.find(same_bucket[5]), Some(Location::Level(0, _))));
        assert_eq!(table.iter().filter(|&k| k == spilled).count(), 1);
    }

    fn tiny_table() -> FunnelTable {
        // With δ = 0 nothing is held in reserve: a bucket slot stays free that
        // no later key hashes to, while the two-slot overflow region fills.
        FunnelTable::builder()
            .slots(10)
            .bucket_size(2)
            .reserve_fraction(0.0)
            .level_fractions(vec![0.8])
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_overflow_displaces_into_levels() {
        let mut table = tiny_table();
        assert_eq!(table.layout().level_buckets(), &[4]);
        assert_eq!(table.layout().overflow_slots(), 2);
        assert_eq!(table.capacity(), 10);

        for key in 0..9 {
            assert!(table.insert(key).unwrap());
        }
        assert_eq!(table.level_occupancy(), vec![7, 2]);
        assert_eq!(table.displaced, 0);

        assert!(table.insert(9).unwrap());
        assert!(matches!(table.find(9), Some(Location::Displaced(0, _))));
        assert_eq!(table.displaced, 1);
        assert_eq!(table.level_occupancy(), vec![8, 2]);
        for key in 0..10 {
            assert!(table.contains(key), "key {key}");
        }
    }

    #[test]
    fn test_displaced_key_can_be_removed_and_reinserted() {
        let mut table = tiny_table();
        for key in 0..10 {
            table.insert(key).unwrap();
        }

        assert!(table.remove(9));
        assert_eq!(table.displaced, 0);
        assert!(!table.contains(9));
        assert!(table.insert(9).unwrap());
        assert_eq!(table.displaced, 1);

        for key in 0..10 {
            assert!(table.remove(key), "key {key}");
        }
        assert_eq!(table.len(), 0);
        assert_eq!(table.displaced, 0);
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_full_table_rejects_duplicates() {
        let mut table = tiny_table();
        for key in 0..10 {
            table.insert(key).unwrap();
        }
        let err = table.insert(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(err.context("key"), Some("3"));
        assert_eq!(table.len(), 10);
        assert!(table.contains(3));
    }

    #[test]
    fn test_display_dumps_levels_and_overflow() {
        let mut table = FunnelTable::new(100, 4, 0.25).unwrap();
        table.insert(5).unwrap();
        let dump = table.to_string();
        assert!(dump.starts_with("FunnelTable: len=1, capacity=75, bucket_size=4\n"));
        assert!(dump.contains("Level 0 (15 buckets): ["));
        assert!(dump.contains("Level 2 (2 buckets): ["));
        assert!(dump.contains("Overflow (8 slots): [_ _ _ _ _ _ _ _]"));
    }

    #[test]
    fn test_rejects_zero_bucket_size() {
        let err = FunnelTable::new(100, 0, 0.25).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
