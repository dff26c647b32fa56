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

//! Elastic hashing: a non-greedy, multi-level set with bounded probes per level.
//!
//! Insertion tries at most `probe_budget` hashed positions in each of the
//! leading levels before moving down for good, and falls back to a linearly
//! probed final level. Keys never move once placed.
//!
//! # Usage
//!
//! ```rust
//! # use probeset::elastic::ElasticTable;
//! let mut table = ElasticTable::new(100, 0.25).unwrap();
//! assert_eq!(table.capacity(), 75);
//!
//! assert!(table.insert(7).unwrap());
//! assert!(!table.insert(7).unwrap());
//! assert!(table.contains(7));
//!
//! assert!(table.remove(7));
//! assert!(!table.contains(7));
//! ```
//!
//! # Configuration
//!
//! ```rust
//! # use probeset::elastic::ElasticTable;
//! let table = ElasticTable::builder()
//!     .slots(1000)
//!     .reserve_fraction(0.1)
//!     .levels(5)
//!     .probe_budget(8)
//!     .power_of_two_regions(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(table.layout().level_slots(), &[8, 8, 8, 8, 1024]);
//! ```

mod table;

pub use self::table::ElasticTable;
pub use self::table::ElasticTableBuilder;
pub use crate::common::DEFAULT_RESERVE_FRACTION;
pub use crate::common::DEFAULT_SLOTS;
pub use crate::layout::ElasticLayout;
pub use crate::probe::MAX_PROBE_BUDGET;

/// Default number of levels, the final level included.
pub const DEFAULT_LEVELS: usize = 4;

/// Default number of probes per bounded level.
pub const DEFAULT_PROBE_BUDGET: usize = 4;
