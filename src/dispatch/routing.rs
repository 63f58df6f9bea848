// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use rand::Rng;

use crate::record::Record;

/// The rule selecting which sinks receive a record.
#[derive(Default)]
pub enum Routing {
    /// Every registered sink.
    #[default]
    Broadcast,
    /// Exactly one sink, cycling through the sinks in registration order.
    RoundRobin,
    /// Exactly one sink, chosen uniformly at random.
    Random,
    /// The sink whose index the function returns. Out-of-range indices deliver nowhere.
    Custom(Box<dyn Fn(&Record) -> usize + Send + Sync>),
}

impl fmt::Debug for Routing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Routing::Broadcast => f.write_str("Broadcast"),
            Routing::RoundRobin => f.write_str("RoundRobin"),
            Routing::Random => f.write_str("Random"),
            Routing::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Routing {
    /// Route with a caller-supplied function mapping a record to a sink index.
    pub fn custom(route: impl Fn(&Record) -> usize + Send + Sync + 'static) -> Self {
        Routing::Custom(Box::new(route))
    }

    pub(super) fn targets(&self, record: &Record, len: usize, cursor: &AtomicUsize) -> Targets {
        if len == 0 {
            return Targets::None;
        }

        match self {
            Routing::Broadcast => Targets::All,
            Routing::RoundRobin => Targets::One(cursor.fetch_add(1, Ordering::Relaxed) % len),
            Routing::Random => Targets::One(rand::rng().random_range(0..len)),
            Routing::Custom(route) => match route(record) {
                index if index < len => Targets::One(index),
                _ => Targets::None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Targets {
    None,
    All,
    One(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_round_robin_cycles() {
        let cursor = AtomicUsize::new(0);
        let record = Record::new(Level::Info, "");
        let picks = (0..6)
            .map(|_| Routing::RoundRobin.targets(&record, 3, &cursor))
            .collect::<Vec<_>>();
        let expected = [0, 1, 2, 0, 1, 2].map(Targets::One);
        assert_eq!(picks, expected);
    }

    #[test]
    fn test_random_in_range() {
        let cursor = AtomicUsize::new(0);
        let record = Record::new(Level::Info, "");
        for _ in 0..1000 {
            match Routing::Random.targets(&record, 4, &cursor) {
                Targets::One(index) => assert!(index < 4),
                other => panic!("unexpected targets: {other:?}"),
            }
        }
    }

    #[test]
    fn test_custom_out_of_range_and_empty() {
        let cursor = AtomicUsize::new(0);
        let record = Record::new(Level::Info, "");
        let routing = Routing::custom(|r| r.message().len());
        assert_eq!(routing.targets(&record, 2, &cursor), Targets::One(0));
        assert_eq!(
            routing.targets(&record.with_message("abc"), 2, &cursor),
            Targets::None
        );
        assert_eq!(Routing::Broadcast.targets(&record, 0, &cursor), Targets::None);
    }
}
