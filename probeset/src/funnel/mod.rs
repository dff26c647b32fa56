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

//! Funnel hashing: a greedy, bucketed multi-level set.
//!
//! Each level is split into buckets of `bucket_size` slots. A key hashes to
//! one bucket per level and settles in the first level whose bucket has
//! room; keys turned away by every level go to a linearly probed overflow
//! region. When that region is full too, the key takes any free level slot,
//! so a table below capacity always accepts a new key. Keys never move once
//! placed.
//!
//! # Usage
//!
//! ```rust
//! # use probeset::funnel::FunnelTable;
//! let mut table = FunnelTable::new(100, 4, 0.25).unwrap();
//! assert_eq!(table.capacity(), 75);
//!
//! assert!(table.insert(7).unwrap());
//! assert!(table.contains(7));
//! assert!(table.remove(7));
//! assert!(!table.contains(7));
//! ```
//!
//! # Configuration
//!
//! ```rust
//! # use probeset::funnel::FunnelTable;
//! let table = FunnelTable::builder()
//!     .slots(1000)
//!     .bucket_size(8)
//!     .reserve_fraction(0.2)
//!     .level_fractions(vec![0.5, 0.3, 0.1])
//!     .build()
//!     .unwrap();
//! assert_eq!(table.layout().level_slots(), vec![496, 296, 96]);
//! assert_eq!(table.layout().overflow_slots(), 112);
//! ```

mod table;

pub use self::table::FunnelTable;
pub use self::table::FunnelTableBuilder;
pub use crate::common::DEFAULT_RESERVE_FRACTION;
pub use crate::common::DEFAULT_SLOTS;
pub use crate::layout::DEFAULT_LEVEL_FRACTIONS;
pub use crate::layout::FunnelLayout;
pub use crate::layout::SMALL_RESERVE_FRACTION;
pub use crate::layout::SMALL_RESERVE_LEVEL_FRACTIONS;
pub use crate::layout::default_level_fractions;

/// Default number of slots per bucket.
pub const DEFAULT_BUCKET_SIZE: usize = 8;
