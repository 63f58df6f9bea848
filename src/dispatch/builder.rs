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

use crate::dispatch::Dispatcher;
use crate::dispatch::Routing;
use crate::filter::Filter;
use crate::sink::Sink;
use crate::trap::Trap;

/// A builder for configuring a [`Dispatcher`].
///
/// # Examples
///
/// ```
/// use logpipe::dispatch::Dispatcher;
/// use logpipe::dispatch::Routing;
/// use logpipe::record::Level;
/// use logpipe::sink::Stderr;
/// use logpipe::sink::Stdout;
///
/// let dispatcher = Dispatcher::builder()
///     .filter(Level::Info)
///     .sink(Stdout::default())
///     .sink(Stderr::default())
///     .routing(Routing::RoundRobin)
///     .build();
/// assert_eq!(dispatcher.len(), 2);
/// ```
#[must_use = "call `build` to create the dispatcher"]
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    sinks: Vec<Box<dyn Sink>>,
    filters: Vec<Box<dyn Filter>>,
    routing: Routing,
    trap: Option<Box<dyn Trap>>,
}

impl DispatcherBuilder {
    /// Register a sink. Sinks are indexed in the order they are added.
    pub fn sink(mut self, sink: impl Into<Box<dyn Sink>>) -> Self {
        self.sinks.push(sink.into());
        self
    }

    /// Add a dispatcher-level filter.
    pub fn filter(mut self, filter: impl Into<Box<dyn Filter>>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Set the routing strategy. Default to [`Routing::Broadcast`].
    pub fn routing(mut self, routing: Routing) -> Self {
        self.routing = routing;
        self
    }

    /// Set the trap receiving sink errors. Default to [`DefaultTrap`](crate::trap::DefaultTrap).
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = Some(trap.into());
        self
    }

    /// Build the [`Dispatcher`].
    pub fn build(self) -> Dispatcher {
        Dispatcher::from_parts(self.sinks, self.filters, self.routing, self.trap)
    }
}
