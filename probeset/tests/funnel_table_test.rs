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

use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::ge;
use probeset::error::ErrorKind;
use probeset::funnel::DEFAULT_BUCKET_SIZE;
use probeset::funnel::DEFAULT_LEVEL_FRACTIONS;
use probeset::funnel::FunnelTable;
use probeset::funnel::SMALL_RESERVE_LEVEL_FRACTIONS;

#[test]
fn test_empty_table() {
    let table = FunnelTable::new(100, 4, 0.25).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.capacity(), 75);
    assert_eq!(table.bucket_size(), 4);
    assert_eq!(table.reserve_fraction(), 0.25);
    assert_eq!(table.layout().level_buckets(), &[15, 6, 2]);
    assert_eq!(table.layout().overflow_slots(), 8);
    assert_eq!(table.total_slots(), 100);
    assert!(!table.contains(0));
    assert_eq!(table.iter().count(), 0);
}

#[test]
fn test_default_builder() {
    let table = FunnelTable::builder().build().unwrap();
    assert_eq!(table.bucket_size(), DEFAULT_BUCKET_SIZE);
    assert_eq!(table.layout().level_buckets().len(), DEFAULT_LEVEL_FRACTIONS.len());
    assert_eq!(table.total_slots(), 1024);
}

#[test]
fn test_small_reserve_adds_a_level() {
    let table = FunnelTable::new(2000, 8, 0.05).unwrap();
    assert_eq!(
        table.layout().level_buckets().len(),
        SMALL_RESERVE_LEVEL_FRACTIONS.len()
    );
    assert_eq!(table.layout().level_slots(), vec![1000, 440, 200, 96]);
    assert_eq!(table.layout().overflow_slots(), 264);
    assert_eq!(table.capacity(), 1900);
}

#[test]
fn test_invalid_config_is_rejected() {
    let cases = [
        FunnelTable::new(0, 4, 0.25),
        FunnelTable::new(100, 0, 0.25),
        FunnelTable::new(100, 4, 1.0),
        FunnelTable::new(100, 4, -0.25),
        FunnelTable::builder().level_fractions(vec![]).build(),
        FunnelTable::builder().level_fractions(vec![0.7, 0.3]).build(),
        FunnelTable::builder().level_fractions(vec![0.5, -0.1]).build(),
        FunnelTable::builder().level_fractions(vec![f64::NAN]).build(),
    ];
    for result in cases {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    let err = FunnelTable::new(100, 0, 0.25).unwrap_err();
    assert_that!(err.message(), contains_substring("bucket size"));
}

#[test]
fn test_huge_table_reports_allocation_failure() {
    let err = FunnelTable::new(usize::MAX / 2, 8, 0.5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);
}

#[test]
fn test_fills_first_level_first() {
    let mut table = FunnelTable::new(1024, 8, 0.1).unwrap();
    for key in 0..300 {
        table.insert(key).unwrap();
    }
    let per_level = table.level_occupancy();
    assert_eq!(per_level.len(), 4);
    assert_eq!(per_level.iter().sum::<usize>(), 300);
    assert_that!(per_level[0], ge(per_level[1]));
}

#[test]
fn test_fill_to_capacity_and_drain() {
    let mut table = FunnelTable::new(1024, 8, 0.1).unwrap();
    let capacity = table.capacity();
    assert_eq!(capacity, 921);

    for key in 0..capacity as u64 {
        assert!(table.insert(key).unwrap());
    }
    assert_eq!(table.len(), capacity);
    assert_eq!(
        table.insert(capacity as u64).unwrap_err().kind(),
        ErrorKind::CapacityExceeded
    );

    for key in 0..capacity as u64 {
        assert!(table.remove(key));
    }
    assert!(table.is_empty());
    assert_eq!(table.iter().count(), 0);

    // Every slot that held a key is now a tombstone and can be claimed again.
    for key in 5000..5000 + capacity as u64 {
        assert!(table.insert(key).unwrap());
    }
    assert_eq!(table.len(), capacity);
}

#[test]
fn test_custom_level_fractions() {
    let mut table = FunnelTable::builder()
        .slots(1000)
        .bucket_size(8)
        .reserve_fraction(0.2)
        .level_fractions([0.5, 0.3, 0.1])
        .build()
        .unwrap();
    assert_eq!(table.layout().level_slots(), vec![496, 296, 96]);
    assert_eq!(table.layout().overflow_slots(), 112);

    for key in 0..800 {
        table.insert(key).unwrap();
    }
    assert!((0..800).all(|key| table.contains(key)));
}

#[test]
fn test_concurrent_readers() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FunnelTable>();

    let mut table = FunnelTable::new(1024, 8, 0.1).unwrap();
    for key in 0..500 {
        table.insert(key).unwrap();
    }

    let table = &table;
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(move || {
                for key in 0..1000 {
                    assert_eq!(table.contains(key), key < 500);
                }
                assert_eq!(table.len(), 500);
            });
        }
    });
}

#[test]
fn test_display_lists_overflow() {
    let mut table = FunnelTable::new(100, 4, 0.25).unwrap();
    table.insert(1).unwrap();
    let dump = table.to_string();
    assert_that!(
        dump.as_str(),
        contains_substring("FunnelTable: len=1, capacity=75, bucket_size=4")
    );
    assert_that!(dump.as_str(), contains_substring("Overflow (8 slots)"));
    assert_eq!(dump.lines().count(), 5);
}
