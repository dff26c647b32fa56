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

//! Level allocator.
//!
//! Splits a total slot count `n` and a reserve fraction δ into the fixed
//! level geometry of a table. All checks happen here, before any slot is
//! allocated.

use crate::common::capacity_for;
use crate::common::check_reserve_fraction;
use crate::common::check_slots;
use crate::common::round_region;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::probe::MAX_PROBE_BUDGET;

/// Minimum number of levels of an elastic table (bounded levels plus the final level).
pub const MIN_ELASTIC_LEVELS: usize = 2;

/// Maximum number of levels of an elastic table.
pub const MAX_ELASTIC_LEVELS: usize = 64;

/// Level fractions of a funnel table when δ ≥ [`SMALL_RESERVE_FRACTION`].
pub const DEFAULT_LEVEL_FRACTIONS: [f64; 3] = [0.60, 0.25, 0.10];

/// Level fractions of a funnel table when δ < [`SMALL_RESERVE_FRACTION`].
///
/// A fourth level and a wider overflow region absorb the bucket collisions of
/// a table filled close to its slot count.
pub const SMALL_RESERVE_LEVEL_FRACTIONS: [f64; 4] = [0.50, 0.22, 0.10, 0.05];

/// Reserve fraction below which funnel tables get [`SMALL_RESERVE_LEVEL_FRACTIONS`].
pub const SMALL_RESERVE_FRACTION: f64 = 0.10;

/// Default level fractions of a funnel table for the given δ.
pub fn default_level_fractions(reserve_fraction: f64) -> &'static [f64] {
    if reserve_fraction < SMALL_RESERVE_FRACTION {
        &SMALL_RESERVE_LEVEL_FRACTIONS
    } else {
        &DEFAULT_LEVEL_FRACTIONS
    }
}

/// Geometry of an elastic table.
///
/// Every level but the last holds `probe_budget` slots (fewer if `n` runs
/// out); the last level takes the remainder and never has less than one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticLayout {
    level_slots: Vec<usize>,
    probe_budget: usize,
    capacity: usize,
}

impl ElasticLayout {
    /// Plans an elastic table of `slots` slots with `levels` levels.
    pub fn plan(
        slots: usize,
        reserve_fraction: f64,
        levels: usize,
        probe_budget: usize,
        power_of_two_regions: bool,
    ) -> Result<Self, Error> {
        check_slots(slots)?;
        check_reserve_fraction(reserve_fraction)?;
        if !(MIN_ELASTIC_LEVELS..=MAX_ELASTIC_LEVELS).contains(&levels) {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                format!("levels must be in [{MIN_ELASTIC_LEVELS}, {MAX_ELASTIC_LEVELS}]"),
            )
            .with_context("levels", levels));
        }
        if !(1..=MAX_PROBE_BUDGET).contains(&probe_budget) {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                format!("probe budget must be in [1, {MAX_PROBE_BUDGET}]"),
            )
            .with_context("probe_budget", probe_budget));
        }

        let mut remaining = slots;
        let mut level_slots = Vec::with_capacity(levels);
        for _ in 0..levels - 1 {
            let len = probe_budget.min(remaining);
            level_slots.push(len);
            remaining -= len;
        }
        level_slots.push(round_region(remaining.max(1), power_of_two_regions));

        Ok(Self {
            level_slots,
            probe_budget,
            capacity: capacity_for(slots, reserve_fraction),
        })
    }

    /// Slot count of each level, the final level last.
    pub fn level_slots(&self) -> &[usize] {
        &self.level_slots
    }

    /// Slot count of the final, linearly probed level.
    pub fn final_slots(&self) -> usize {
        self.level_slots[self.level_slots.len() - 1]
    }

    pub fn probe_budget(&self) -> usize {
        self.probe_budget
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots actually allocated, which can exceed the requested count after rounding.
    pub fn total_slots(&self) -> usize {
        self.level_slots.iter().sum()
    }
}

/// Geometry of a funnel table.
///
/// Level `i` gets `fractions[i] * n` slots rounded down to whole buckets (at
/// least one bucket). Whatever is left of `n` becomes the overflow region,
/// which never has less than one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelLayout {
    bucket_size: usize,
    level_buckets: Vec<usize>,
    overflow_slots: usize,
    capacity: usize,
}

impl FunnelLayout {
    /// Plans a funnel table of `slots` slots split by `fractions`.
    pub fn plan(
        slots: usize,
        bucket_size: usize,
        reserve_fraction: f64,
        fractions: &[f64],
        power_of_two_regions: bool,
    ) -> Result<Self, Error> {
        check_slots(slots)?;
        check_reserve_fraction(reserve_fraction)?;
        if bucket_size == 0 {
            return Err(
                Error::new(ErrorKind::ConfigInvalid, "bucket size must be at least 1")
                    .with_context("bucket_size", bucket_size),
            );
        }
        check_fractions(fractions)?;

        let level_buckets: Vec<usize> = fractions
            .iter()
            .map(|fraction| {
                let len = (fraction * slots as f64) as usize;
                (len / bucket_size).max(1)
            })
            .collect();
        let allocated: usize = level_buckets
            .iter()
            .map(|buckets| buckets.saturating_mul(bucket_size))
            .sum();
        let overflow_slots = round_region(
            slots.saturating_sub(allocated).max(1),
            power_of_two_regions,
        );

        Ok(Self {
            bucket_size,
            level_buckets,
            overflow_slots,
            capacity: capacity_for(slots, reserve_fraction),
        })
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Bucket count of each level.
    pub fn level_buckets(&self) -> &[usize] {
        &self.level_buckets
    }

    /// Slot count of each level.
    pub fn level_slots(&self) -> Vec<usize> {
        self.level_buckets
            .iter()
            .map(|buckets| buckets * self.bucket_size)
            .collect()
    }

    pub fn overflow_slots(&self) -> usize {
        self.overflow_slots
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots actually allocated, which can exceed the requested count for tiny tables.
    pub fn total_slots(&self) -> usize {
        self.level_slots().iter().sum::<usize>() + self.overflow_slots
    }
}

fn check_fractions(fractions: &[f64]) -> Result<(), Error> {
    if fractions.is_empty() {
        return Err(Error::new(
            ErrorKind::ConfigInvalid,
            "a funnel table needs at least one level",
        ));
    }
    if let Some(bad) = fractions
        .iter()
        .find(|f| !(f.is_finite() && **f > 0.0 && **f < 1.0))
    {
        return Err(
            Error::new(ErrorKind::ConfigInvalid, "level fractions must be in (0, 1)")
                .with_context("fraction", bad),
        );
    }
    let total: f64 = fractions.iter().sum();
    if total >= 1.0 {
        return Err(Error::new(
            ErrorKind::ConfigInvalid,
            "level fractions must leave room for the overflow region",
        )
        .with_context("total", total));
    }
    Ok(())
}
