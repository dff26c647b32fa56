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

#![allow(dead_code)]

use probeset::elastic::ElasticTable;
use probeset::error::Error;
use probeset::funnel::FunnelTable;

/// The operations both tables share, so one test body can drive either.
pub trait FixedSet {
    fn insert(&mut self, key: u64) -> Result<bool, Error>;
    fn contains(&self, key: u64) -> bool;
    fn remove(&mut self, key: u64) -> bool;
    fn len(&self) -> usize;
    fn capacity(&self) -> usize;
    fn keys(&self) -> Vec<u64>;
}

macro_rules! impl_fixed_set {
    ($table:ty) => {
        impl FixedSet for $table {
            fn insert(&mut self, key: u64) -> Result<bool, Error> {
                <$table>::insert(self, key)
            }

            fn contains(&self, key: u64) -> bool {
                <$table>::contains(self, key)
            }

            fn remove(&mut self, key: u64) -> bool {
                <$table>::remove(self, key)
            }

            fn len(&self) -> usize {
                <$table>::len(self)
            }

            fn capacity(&self) -> usize {
                <$table>::capacity(self)
            }

            fn keys(&self) -> Vec<u64> {
                let mut keys: Vec<_> = self.iter().collect();
                keys.sort_unstable();
                keys
            }
        }
    };
}

impl_fixed_set!(ElasticTable);
impl_fixed_set!(FunnelTable);

/// A table configuration under test.
pub struct Config {
    pub name: &'static str,
    pub build: fn() -> Box<dyn FixedSet>,
}

pub fn configs() -> Vec<Config> {
    vec![
        Config {
            name: "elastic n=100 δ=0.25",
            build: || Box::new(ElasticTable::new(100, 0.25).unwrap()),
        },
        Config {
            name: "elastic n=1000 δ=0.1",
            build: || Box::new(ElasticTable::new(1000, 0.1).unwrap()),
        },
        Config {
            name: "elastic n=1000 δ=0.1 pow2",
            build: || {
                Box::new(
                    ElasticTable::builder()
                        .slots(1000)
                        .reserve_fraction(0.1)
                        .power_of_two_regions(true)
                        .build()
                        .unwrap(),
                )
            },
        },
        Config {
            name: "funnel n=64 b=4 δ=0.5",
            build: || Box::new(FunnelTable::new(64, 4, 0.5).unwrap()),
        },
        Config {
            name: "funnel n=100 b=4 δ=0.25",
            build: || Box::new(FunnelTable::new(100, 4, 0.25).unwrap()),
        },
        Config {
            name: "funnel n=512 b=8 δ=0.25",
            build: || Box::new(FunnelTable::new(512, 8, 0.25).unwrap()),
        },
        Config {
            name: "funnel n=1024 b=8 δ=0.1",
            build: || Box::new(FunnelTable::new(1024, 8, 0.1).unwrap()),
        },
        Config {
            name: "funnel n=4096 b=16 δ=0.2 pow2",
            build: || {
                Box::new(
                    FunnelTable::builder()
                        .slots(4096)
                        .bucket_size(16)
                        .reserve_fraction(0.2)
                        .power_of_two_regions(true)
                        .build()
                        .unwrap(),
                )
            },
        },
    ]
}

/// Both tables built with the geometry of the documented scenarios.
pub fn scenario_tables() -> Vec<(&'static str, Box<dyn FixedSet>)> {
    vec![
        (
            "elastic",
            Box::new(ElasticTable::new(100, 0.25).unwrap()) as Box<dyn FixedSet>,
        ),
        (
            "funnel",
            Box::new(FunnelTable::new(100, 4, 0.25).unwrap()) as Box<dyn FixedSet>,
        ),
    ]
}
