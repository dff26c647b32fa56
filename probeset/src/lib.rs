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

//! Fixed-capacity sets of `u64` keys with bounded worst-case probe counts.
//!
//! Both tables use open addressing without reordering: once placed, a key
//! never moves. All slots are allocated when the table is built and the
//! table never grows, in exchange for a capacity of `floor((1 - δ) * n)`
//! keys agreed up front.
//!
//! * [`elastic::ElasticTable`] probes a bounded number of hashed positions
//!   per level before moving down, with a linearly probed final level.
//! * [`funnel::FunnelTable`] scans one cache-local bucket per level, greedily
//!   taking the first level with room, with a linearly probed overflow region.
//!   Once that region is full, new keys take any free level slot.
//!
//! Both expose the same operations: `insert`, `contains`, `remove`, `len`
//! and `capacity`, plus a `Display` dump of the slot arrays for debugging.
//!
//! # Usage
//!
//! ```rust
//! use probeset::elastic::ElasticTable;
//! use probeset::error::ErrorKind;
//! use probeset::funnel::FunnelTable;
//!
//! let mut elastic = ElasticTable::new(100, 0.25).unwrap();
//! let mut funnel = FunnelTable::new(100, 4, 0.25).unwrap();
//!
//! for key in 0..75 {
//!     elastic.insert(key).unwrap();
//!     funnel.insert(key).unwrap();
//! }
//! assert_eq!(
//!     elastic.insert(75).unwrap_err().kind(),
//!     ErrorKind::CapacityExceeded
//! );
//! assert_eq!(
//!     funnel.insert(75).unwrap_err().kind(),
//!     ErrorKind::CapacityExceeded
//! );
//! ```
//!
//! # Concurrency
//!
//! Mutating operations take `&mut self`, so concurrent writers need a lock
//! around the table. `contains`, `len` and `capacity` take `&self` and can be
//! called from any number of threads at once; the key count is kept in an
//! atomic and is never observed torn.

pub mod elastic;
pub mod error;
pub mod funnel;
pub mod hash;
pub mod layout;

mod common;
mod probe;
