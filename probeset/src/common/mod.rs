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

//! Pieces shared by the elastic and funnel tables.

mod occupancy;
mod slot;

pub use self::occupancy::Occupancy;
pub use self::slot::Slot;

use crate::error::Error;
use crate::error::ErrorKind;

/// Default total number of slots of a table built without `slots(..)`.
pub const DEFAULT_SLOTS: usize = 1024;

/// Default fraction of slots left empty (δ).
pub const DEFAULT_RESERVE_FRACTION: f64 = 0.10;

/// Checks that δ lies in `[0, 1)`.
pub(crate) fn check_reserve_fraction(reserve_fraction: f64) -> Result<(), Error> {
    if reserve_fraction.is_finite() && (0.0..1.0).contains(&reserve_fraction) {
        Ok(())
    } else {
        Err(
            Error::new(ErrorKind::ConfigInvalid, "reserve fraction must be in [0, 1)")
                .with_context("reserve_fraction", reserve_fraction),
        )
    }
}

/// Checks that the table has at least one slot.
pub(crate) fn check_slots(slots: usize) -> Result<(), Error> {
    if slots == 0 {
        return Err(
            Error::new(ErrorKind::ConfigInvalid, "a table needs at least one slot")
                .with_context("slots", slots),
        );
    }
    Ok(())
}

/// Maximum occupancy of a table: `floor((1 - δ) * slots)`.
pub(crate) fn capacity_for(slots: usize, reserve_fraction: f64) -> usize {
    ((1.0 - reserve_fraction) * slots as f64).floor() as usize
}

/// Rounds a region up to the next power of two if that grows it by at most 25%.
pub(crate) fn round_region(len: usize, power_of_two: bool) -> usize {
    if !power_of_two {
        return len;
    }
    match len.checked_next_power_of_two() {
        Some(rounded) if (rounded - len) * 4 <= len => rounded,
        _ => len,
    }
}

/// Reserves a region of `len` empty slots.
pub(crate) fn allocate_slots(len: usize) -> Result<Box<[Slot]>, Error> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(len).map_err(|err| {
        Error::new(ErrorKind::AllocationFailed, "failed to reserve slot storage")
            .with_context("slots", len)
            .set_source(err)
    })?;
    slots.resize(len, Slot::Empty);
    Ok(slots.into_boxed_slice())
}

pub(crate) fn capacity_exceeded(key: u64, occupancy: &Occupancy) -> Error {
    Error::new(ErrorKind::CapacityExceeded, "table is full")
        .with_context("key", key)
        .with_context("capacity", occupancy.ceiling())
}

pub(crate) fn region_exhausted(key: u64, region: &'static str, occupancy: &Occupancy) -> Error {
    tracing::error!(
        key,
        region,
        len = occupancy.load(),
        capacity = occupancy.ceiling(),
        "no free slot left below capacity"
    );
    Error::new(
        ErrorKind::InvariantViolated,
        format!("{region} region has no free slot below capacity"),
    )
    .with_context("key", key)
    .with_context("len", occupancy.load())
    .with_context("capacity", occupancy.ceiling())
}

/// Writes one region as `[a b c]`, the way the diagnostic dumps render it.
pub(crate) fn write_region(f: &mut std::fmt::Formatter<'_>, slots: &[Slot]) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{slot}")?;
    }
    writeln!(f, "]")
}
