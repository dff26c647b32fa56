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

/// State of one slot.
///
/// A slot starts `Empty`, becomes `Occupied` on insertion and `Tombstone` on
/// removal. A tombstone can be occupied again, but a slot never goes back to
/// `Empty`: lookups rely on an `Empty` slot proving that no key was ever
/// placed past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Slot {
    /// Never used.
    #[default]
    Empty,
    /// Used and then removed.
    Tombstone,
    /// Holds a key.
    Occupied(u64),
}

impl Slot {
    /// Whether an insertion may claim this slot.
    #[inline]
    pub fn is_free(self) -> bool {
        matches!(self, Slot::Empty | Slot::Tombstone)
    }

    #[inline]
    pub fn key(self) -> Option<u64> {
        match self {
            Slot::Occupied(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Empty => write!(f, "_"),
            Slot::Tombstone => write!(f, "~"),
            Slot::Occupied(key) => write!(f, "{key}"),
        }
    }
}
