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

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

// Number of live keys in a table, bounded by a fixed ceiling.
//
// The count is atomic so that `len()` never observes a torn value, even from
// another thread. It does not order slot writes: structural mutation goes
// through `&mut` on the owning table.
#[derive(Debug)]
pub struct Occupancy {
    count: AtomicUsize,
    ceiling: usize,
}

impl Occupancy {
    pub fn new(ceiling: usize) -> Occupancy {
        Occupancy {
            count: AtomicUsize::new(0),
            ceiling,
        }
    }

    #[inline]
    pub fn load(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.load() >= self.ceiling
    }

    #[inline]
    pub fn increment(&self) {
        let prev = self.count.fetch_add(1, Ordering::Relaxed);
        debug_assert!(prev < self.ceiling, "occupancy above capacity");
    }

    #[inline]
    pub fn decrement(&self) {
        let prev = self.count.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(prev > 0, "occupancy underflow");
    }
}
