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

//! Filtering and routing of drained records to sinks.

use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use arc_swap::ArcSwap;

use crate::Error;
use crate::filter;
use crate::filter::Filter;
use crate::record::Record;
use crate::sink::Sink;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

mod builder;
mod routing;

pub use self::builder::DispatcherBuilder;
pub use self::routing::Routing;

use self::routing::Targets;

/// Counters of a single registered sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    /// Successful writes.
    pub writes: u64,
    /// Failed or panicked writes.
    pub failures: u64,
}

#[derive(Debug)]
struct Slot {
    sink: Box<dyn Sink>,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl Slot {
    fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            sink,
            writes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    fn stats(&self) -> SinkStats {
        SinkStats {
            writes: self.writes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Owns the registered sinks and decides which of them receive each record.
///
/// Dispatch reads a snapshot of the sink collection and never takes the registration lock, so
/// [`add`](Self::add) and [`remove`](Self::remove) do not wait for slow sinks. A failing or
/// panicking sink is counted and reported to the [`Trap`]; the remaining targets still receive the
/// record.
///
/// A sink handle is its index in registration order. Removing a sink compacts the collection:
/// every later sink moves down by one.
pub struct Dispatcher {
    sinks: ArcSwap<Vec<Arc<Slot>>>,
    registration: Mutex<()>,
    filters: ArcSwap<Vec<Arc<dyn Filter>>>,
    routing: ArcSwap<Routing>,
    cursor: AtomicUsize,
    failures: AtomicU64,
    trap: Box<dyn Trap>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sinks.load().len())
            .field("filters", &self.filters.load_full())
            .field("routing", &self.routing.load_full())
            .field("failures", &self.failures())
            .field("trap", &self.trap)
            .finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create an empty dispatcher that broadcasts and reports errors to [`DefaultTrap`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new [`DispatcherBuilder`].
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub(crate) fn from_parts(
        sinks: Vec<Box<dyn Sink>>,
        filters: Vec<Box<dyn Filter>>,
        routing: Routing,
        trap: Option<Box<dyn Trap>>,
    ) -> Self {
        let sinks = sinks.into_iter().map(|s| Arc::new(Slot::new(s))).collect();
        let filters = filters.into_iter().map(Arc::from).collect::<Vec<Arc<dyn Filter>>>();
        Self {
            sinks: ArcSwap::from_pointee(sinks),
            registration: Mutex::new(()),
            filters: ArcSwap::from_pointee(filters),
            routing: ArcSwap::from_pointee(routing),
            cursor: AtomicUsize::new(0),
            failures: AtomicU64::new(0),
            trap: trap.unwrap_or_else(|| Box::new(DefaultTrap::default())),
        }
    }

    /// Deliver `record` to the sinks selected by the routing strategy.
    ///
    /// Returns the number of sinks that wrote the record successfully. A record rejected by the
    /// filters returns 0 without touching any sink.
    pub fn dispatch(&self, record: &Record) -> usize {
        if !self.admit(record) {
            return 0;
        }

        let sinks = self.sinks.load();
        let targets = self.route(record, sinks.len());
        match targets {
            Targets::None => 0,
            Targets::All => sinks
                .iter()
                .enumerate()
                .filter(|(index, slot)| self.write(*index, slot, record))
                .count(),
            Targets::One(index) => sinks
                .get(index)
                .map_or(0, |slot| usize::from(self.write(index, slot, record))),
        }
    }

    /// Flush every sink, counting and trapping individual failures.
    pub fn flush(&self) {
        for (index, slot) in self.sinks.load().iter().enumerate() {
            self.call(index, slot, "flush", |sink| sink.flush());
        }
    }

    /// Close every sink, counting and trapping individual failures.
    ///
    /// Closed sinks stay registered; most of them report themselves unavailable afterwards.
    pub fn close(&self) {
        for (index, slot) in self.sinks.load().iter().enumerate() {
            self.call(index, slot, "close", |sink| sink.close());
        }
    }

    /// Register a sink, returning its index.
    pub fn add(&self, sink: impl Into<Box<dyn Sink>>) -> usize {
        let slot = Arc::new(Slot::new(sink.into()));
        let _guard = self.lock_registration();
        let mut sinks = Vec::clone(&self.sinks.load());
        sinks.push(slot);
        let index = sinks.len() - 1;
        self.sinks.store(Arc::new(sinks));
        index
    }

    /// Unregister the sink at `index`.
    ///
    /// Later sinks are renumbered down by one. Returns `false` if no sink has that index. The
    /// removed sink is dropped once in-flight dispatches finish with it.
    pub fn remove(&self, index: usize) -> bool {
        let _guard = self.lock_registration();
        let mut sinks = Vec::clone(&self.sinks.load());
        if index >= sinks.len() {
            return false;
        }
        sinks.remove(index);
        self.sinks.store(Arc::new(sinks));
        true
    }

    /// Unregister every sink.
    pub fn clear(&self) {
        let _guard = self.lock_registration();
        self.sinks.store(Arc::new(Vec::new()));
    }

    /// The number of registered sinks.
    pub fn len(&self) -> usize {
        self.sinks.load().len()
    }

    /// Whether no sink is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the routing strategy.
    pub fn set_routing(&self, routing: Routing) {
        self.routing.store(Arc::new(routing));
    }

    /// Append a dispatcher-level filter.
    pub fn add_filter(&self, filter: impl Into<Box<dyn Filter>>) {
        let filter: Box<dyn Filter> = filter.into();
        let filter = Arc::<dyn Filter>::from(filter);
        let _guard = self.lock_registration();
        let mut filters = Vec::clone(&self.filters.load());
        filters.push(filter);
        self.filters.store(Arc::new(filters));
    }

    /// Remove every dispatcher-level filter.
    pub fn clear_filters(&self) {
        let _guard = self.lock_registration();
        self.filters.store(Arc::new(Vec::new()));
    }

    /// Counters of the sink at `index`.
    pub fn stats(&self, index: usize) -> Option<SinkStats> {
        self.sinks.load().get(index).map(|slot| slot.stats())
    }

    /// Total failures across all sinks and operations since creation.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn trap(&self, err: &Error) {
        self.trap.trap(err);
    }

    // a panicking filter rejects the record and counts as a failure
    fn admit(&self, record: &Record) -> bool {
        let filters = self.filters.load();
        panic::catch_unwind(AssertUnwindSafe(|| filter::passes(filters.as_slice(), record)))
            .unwrap_or_else(|payload| {
                self.failures.fetch_add(1, Ordering::Relaxed);
                let err = Error::from_panic(payload).with_context("op", "filter");
                self.trap.trap(&err);
                false
            })
    }

    fn route(&self, record: &Record, len: usize) -> Targets {
        let routing = self.routing.load();
        panic::catch_unwind(AssertUnwindSafe(|| routing.targets(record, len, &self.cursor)))
            .unwrap_or_else(|payload| {
                let err = Error::from_panic(payload).with_context("op", "route");
                self.trap.trap(&err);
                Targets::None
            })
    }

    fn write(&self, index: usize, slot: &Slot, record: &Record) -> bool {
        let mut skipped = false;
        let written = self.call(index, slot, "write", |sink| {
            if !sink.is_available() {
                skipped = true;
                return Ok(());
            }
            sink.write(record)
        });
        if skipped {
            return false;
        }
        if written {
            slot.writes.fetch_add(1, Ordering::Relaxed);
        }
        written
    }

    fn call(
        &self,
        index: usize,
        slot: &Slot,
        op: &'static str,
        f: impl FnOnce(&dyn Sink) -> Result<(), Error>,
    ) -> bool {
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(slot.sink.as_ref())))
            .unwrap_or_else(|payload| Err(Error::from_panic(payload)));

        match result {
            Ok(()) => true,
            Err(err) => {
                slot.failures.fetch_add(1, Ordering::Relaxed);
                self.failures.fetch_add(1, Ordering::Relaxed);
                let err = err.with_context("sink", index).with_context("op", op);
                self.trap.trap(&err);
                false
            }
        }
    }

    fn lock_registration(&self) -> MutexGuard<'_, ()> {
        self.registration.lock().unwrap_or_else(|e| e.into_inner())
    }
}
