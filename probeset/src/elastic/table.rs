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

use crate::common::DEFAULT_RESERVE_FRACTION;
use crate::common::DEFAULT_SLOTS;
use crate::common::Occupancy;
use crate::common::Slot;
use crate::common::allocate_slots;
use crate::common::capacity_exceeded;
use crate::common::region_exhausted;
use crate::common::write_region;
use crate::elastic::DEFAULT_LEVELS;
use crate::elastic::DEFAULT_PROBE_BUDGET;
use crate::error::Error;
use crate::hash::IndexReducer;
use crate::hash::slot_hash;
use crate::layout::ElasticLayout;
use crate::probe::BoundedProbe;
use crate::probe::LinearProbe;

/// One fixed-size level. Zero-length levels exist for tiny tables and are skipped.
#[derive(Debug)]
struct Level {
    slots: Box<[Slot]>,
    reducer: IndexReducer,
}

impl Level {
    fn with_len(len: usize) -> Result<Self, Error> {
        Ok(Self {
            slots: allocate_slots(len)?,
            reducer: IndexReducer::for_len(len.max(1)),
        })
    }
}

/// Fixed-capacity set of `u64` keys using elastic hashing.
///
/// Use [`ElasticTable::new`] or [`ElasticTable::builder`] to construct instances.
///
/// Mutation takes `&mut self`; concurrent readers may share `&ElasticTable`
/// freely.
#[derive(Debug)]
pub struct ElasticTable {
    layout: ElasticLayout,
    reserve_fraction: f64,
    // Bounded levels first, the linearly probed final level last.
    levels: Vec<Level>,
    occupancy: Occupancy,
}

impl ElasticTable {
    /// Creates a table of `slots` slots leaving a fraction `reserve_fraction` of them empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if `slots` is zero or
    /// `reserve_fraction` is not in `[0, 1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use probeset::elastic::ElasticTable;
    /// let table = ElasticTable::new(100, 0.25).unwrap();
    /// assert_eq!(table.capacity(), 75);
    /// assert!(ElasticTable::new(100, 1.0).is_err());
    /// ```
    pub fn new(slots: usize, reserve_fraction: f64) -> Result<Self, Error> {
        Self::builder()
            .slots(slots)
            .reserve_fraction(reserve_fraction)
            .build()
    }

    /// Create a new builder for ElasticTable
    pub fn builder() -> ElasticTableBuilder {
        ElasticTableBuilder::default()
    }

    /// Inserts a key.
    ///
    /// Returns `Ok(true)` if the key was added and `Ok(false)` if it was
    /// already present, in which case nothing changes.
    ///
    /// # Errors
    ///
    /// * [`CapacityExceeded`](crate::error::ErrorKind::CapacityExceeded) if the table already
    ///   holds `capacity()` keys, even when `key` is one of them. The table is left untouched.
    /// * [`InvariantViolated`](crate::error::ErrorKind::InvariantViolated) if the final level
    ///   has no free slot left although the table is below capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use probeset::elastic::ElasticTable;
    /// # use probeset::error::ErrorKind;
    /// let mut table = ElasticTable::new(4, 0.5).unwrap();
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

        let (level_idx, pos) = self.free_slot(key)?;
        self.levels[level_idx].slots[pos] = Slot::Occupied(key);
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
        let Some((level_idx, pos)) = self.find(key) else {
            return false;
        };
        self.levels[level_idx].slots[pos] = Slot::Tombstone;
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

    /// Number of probes per bounded level.
    pub fn probe_budget(&self) -> usize {
        self.layout.probe_budget()
    }

    /// Level geometry of the table.
    pub fn layout(&self) -> &ElasticLayout {
        &self.layout
    }

    /// Number of allocated slots across all levels.
    pub fn total_slots(&self) -> usize {
        self.layout.total_slots()
    }

    /// Number of keys held by each level, the final level last.
    pub fn level_occupancy(&self) -> Vec<usize> {
        self.levels
            .iter()
            .map(|level| level.slots.iter().filter(|slot| slot.key().is_some()).count())
            .collect()
    }

    /// Return iterator over the keys in level order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use probeset::elastic::ElasticTable;
    /// let mut table = ElasticTable::new(100, 0.25).unwrap();
    /// table.insert(3).unwrap();
    /// table.insert(5).unwrap();
    /// let mut keys: Vec<_> = table.iter().collect();
    /// keys.sort();
    /// assert_eq!(keys, vec![3, 5]);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.levels
            .iter()
            .flat_map(|level| level.slots.iter().filter_map(|slot| slot.key()))
    }

    /// Locates a key, replaying the probe order insertion used.
    ///
    /// Within a bounded level an empty slot ends the scan of that level: an
    /// insertion walking the same order would have stopped there. Tombstones
    /// do not end a scan.
    fn find(&self, key: u64) -> Option<(usize, usize)> {
        let (last, bounded) = self.levels.split_last()?;
        for (level_idx, level) in bounded.iter().enumerate() {
            if level.slots.is_empty() {
                continue;
            }
            for pos in BoundedProbe::new(key, level_idx, level.reducer, self.probe_budget()) {
                match level.slots[pos] {
                    Slot::Occupied(k) if k == key => return Some((level_idx, pos)),
                    Slot::Empty => break,
                    _ => {}
                }
            }
        }

        let last_idx = bounded.len();
        for pos in LinearProbe::start(slot_hash(key, last_idx, 0), last.reducer) {
            match last.slots[pos] {
                Slot::Occupied(k) if k == key => return Some((last_idx, pos)),
                Slot::Empty => return None,
                _ => {}
            }
        }
        None
    }

    /// Picks the slot a new key goes to.
    ///
    /// Each bounded level gets one pass of at most `probe_budget` probes and
    /// is never revisited in the same call.
    fn free_slot(&self, key: u64) -> Result<(usize, usize), Error> {
        let last_idx = self.levels.len() - 1;
        for (level_idx, level) in self.levels[..last_idx].iter().enumerate() {
            if level.slots.is_empty() {
                continue;
            }
            let free = BoundedProbe::new(key, level_idx, level.reducer, self.probe_budget())
                .find(|&pos| level.slots[pos].is_free());
            if let Some(pos) = free {
                return Ok((level_idx, pos));
            }
        }

        tracing::trace!(key, "bounded levels exhausted, probing final level");
        let last = &self.levels[last_idx];
        LinearProbe::start(slot_hash(key, last_idx, 0), last.reducer)
            .find(|&pos| last.slots[pos].is_free())
            .map(|pos| (last_idx, pos))
            .ok_or_else(|| region_exhausted(key, "final", &self.occupancy))
    }
}

/// Dumps every level, `_` marking empty slots and `~` tombstones. For debugging only.
impl fmt::Display for ElasticTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ElasticTable: len={}, capacity={}, probe_budget={}",
            self.len(),
            self.capacity(),
            self.probe_budget()
        )?;
        let last_idx = self.levels.len() - 1;
        for (level_idx, level) in self.levels.iter().enumerate() {
            let kind = if level_idx == last_idx { ", final" } else { "" };
            write!(f, "Level {level_idx} ({} slots{kind}): ", level.slots.len())?;
            write_region(f, &level.slots)?;
        }
        Ok(())
    }
}

/// Builder for creating [`ElasticTable`] instances.
#[derive(Debug, Clone)]
pub struct ElasticTableBuilder {
    slots: usize,
    reserve_fraction: f64,
    levels: usize,
    probe_budget: usize,
    power_of_two_regions: bool,
}

impl Default for ElasticTableBuilder {
    fn default() -> Self {
        ElasticTableBuilder {
            slots: DEFAULT_SLOTS,
            reserve_fraction: DEFAULT_RESERVE_FRACTION,
            levels: DEFAULT_LEVELS,
            probe_budget: DEFAULT_PROBE_BUDGET,
            power_of_two_regions: false,
        }
    }
}

impl ElasticTableBuilder {
    /// Sets the total number of slots `n` (default: 1024).
    pub fn slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    /// Sets the fraction δ of slots left empty (default: 0.1).
    pub fn reserve_fraction(mut self, reserve_fraction: f64) -> Self {
        self.reserve_fraction = reserve_fraction;
        self
    }

    /// Sets the number of levels, the final level included (default: 4).
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the number of probes per bounded level, which is also the size of
    /// each bounded level (default: 4).
    pub fn probe_budget(mut self, probe_budget: usize) -> Self {
        self.probe_budget = probe_budget;
        self
    }

    /// Rounds the final level up to a power of two when that grows it by at
    /// most 25% (default: off).
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
    pub fn build(self) -> Result<ElasticTable, Error> {
        let layout = ElasticLayout::plan(
            self.slots,
            self.reserve_fraction,
            self.levels,
            self.probe_budget,
            self.power_of_two_regions,
        )?;
        let levels = layout
            .level_slots()
            .iter()
            .map(|&len| Level::with_len(len))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            slots = layout.total_slots(),
            capacity = layout.capacity(),
            level_slots = ?layout.level_slots(),
            probe_budget = layout.probe_budget(),
            "built elastic table"
        );

        Ok(ElasticTable {
            occupancy: Occupancy::new(layout.capacity()),
            reserve_fraction: self.reserve_fraction,
            layout,
            levels,
        })
    }
}
