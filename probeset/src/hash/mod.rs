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

//! Slot hash function shared by both table variants.
//!
//! A slot position is a pure function of `(key, level, attempt, len)`. Nothing
//! about where a key was placed is recorded anywhere else, so every lookup
//! replays the same sequence of positions the insertion walked.
//!
//! # Usage
//!
//! ```rust
//! # use probeset::hash::slot_index;
//! let first = slot_index(42, 0, 0, 100).unwrap();
//! assert!(first < 100);
//! assert_eq!(Some(first), slot_index(42, 0, 0, 100));
//! assert_eq!(slot_index(42, 0, 0, 0), None);
//! ```

mod splitmix;

pub use self::splitmix::mix64;
pub use self::splitmix::slot_hash;

/// Maps `(key, level, attempt)` onto a slot index in `[0, len)`.
///
/// Returns `None` if `len` is zero. The tables reduce through a reducer built
/// once per region; this is the same mapping for callers outside a table.
pub fn slot_index(key: u64, level: usize, attempt: usize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(IndexReducer::for_len(len).reduce(slot_hash(key, level, attempt)))
}

/// Reduces 64-bit hashes onto `[0, len)`.
///
/// Power-of-two lengths are reduced with a bit mask, everything else with a
/// remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexReducer {
    Mask(u64),
    Modulo(u64),
}

impl IndexReducer {
    pub fn for_len(len: usize) -> Self {
        debug_assert!(len > 0, "index reducer over an empty region");
        if len.is_power_of_two() {
            IndexReducer::Mask(len as u64 - 1)
        } else {
            IndexReducer::Modulo(len as u64)
        }
    }

    #[inline]
    pub fn len(self) -> usize {
        match self {
            IndexReducer::Mask(mask) => (mask + 1) as usize,
            IndexReducer::Modulo(len) => len as usize,
        }
    }

    #[inline]
    pub fn reduce(self, hash: u64) -> usize {
        match self {
            IndexReducer::Mask(mask) => (hash & mask) as usize,
            IndexReducer::Modulo(len) => (hash % len) as usize,
        }
    }

    /// Returns the slot `offset` positions after `start`, wrapping around.
    #[inline]
    pub fn wrap(self, start: usize, offset: usize) -> usize {
        self.reduce((start + offset) as u64)
    }
}
