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

//! SplitMix64-style multiply-xor-shift mixing.

/// Weyl increment of SplitMix64 (the 64-bit golden ratio).
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Odd multiplier spreading `(level, attempt)` lanes over the full word.
const LANE_MULTIPLIER: u64 = 0xd6e8_feb8_6659_fd93;

/// SplitMix64 finalizer. Bijective on `u64`, with full avalanche.
#[inline]
pub fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hashes a key for a given level and attempt.
///
/// The key is mixed once on its own and then once more together with its
/// `(level, attempt)` lane, so two keys never share a probe sequence just
/// because their raw bits differ only in the low word.
#[inline]
pub fn slot_hash(key: u64, level: usize, attempt: usize) -> u64 {
    let lane = (((level as u64) << 32) | attempt as u64)
        .wrapping_add(1)
        .wrapping_mul(LANE_MULTIPLIER);
    mix64(mix64(key.wrapping_add(GOLDEN_GAMMA)) ^ lane)
}
