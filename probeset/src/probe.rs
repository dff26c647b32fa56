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

//! Probe sequences walked by insertion and lookup.

use crate::hash::IndexReducer;
use crate::hash::slot_hash;

/// Upper bound on the per-level probe budget of an elastic table.
///
/// Positions already probed during one call are tracked in an inline array
/// of this size.
pub const MAX_PROBE_BUDGET: usize = 64;

// A bounded probe sequence over one level.
//
// Yields up to `budget` distinct positions, one per attempt. An attempt whose
// hash lands on a position already yielded is skipped rather than retried, so
// fewer than `budget` positions come out when the level is small.
pub(crate) struct BoundedProbe {
    key: u64,
    level: usize,
    reducer: IndexReducer,
    attempt: usize,
    budget: usize,
    seen: [usize; MAX_PROBE_BUDGET],
    seen_len: usize,
}

impl BoundedProbe {
    #[inline]
    pub fn new(key: u64, level: usize, reducer: IndexReducer, budget: usize) -> BoundedProbe {
        debug_assert!(budget <= MAX_PROBE_BUDGET);
        BoundedProbe {
            key,
            level,
            reducer,
            attempt: 0,
            budget,
            seen: [0; MAX_PROBE_BUDGET],
            seen_len: 0,
        }
    }
}

impl Iterator for BoundedProbe {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.attempt < self.budget {
            let pos = self
                .reducer
                .reduce(slot_hash(self.key, self.level, self.attempt));
            self.attempt += 1;

            if self.seen[..self.seen_len].contains(&pos) {
                continue;
            }
            self.seen[self.seen_len] = pos;
            self.seen_len += 1;
            return Some(pos);
        }
        None
    }
}

// A linear probe sequence with wraparound.
//
// Visits every slot of a region exactly once, starting from the slot the
// hash reduces to.
pub(crate) struct LinearProbe {
    start: usize,
    offset: usize,
    reducer: IndexReducer,
}

impl LinearProbe {
    #[inline]
    pub fn start(hash: u64, reducer: IndexReducer) -> LinearProbe {
        LinearProbe {
            start: reducer.reduce(hash),
            offset: 0,
            reducer,
        }
    }
}

impl Iterator for LinearProbe {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.offset == self.reducer.len() {
            return None;
        }
        let pos = self.reducer.wrap(self.start, self.offset);
        self.offset += 1;
        Some(pos)
    }
}
