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
use crate::pipeline::Pipeline;
use crate::pipeline::PipelineConfig;
use crate::sink::Sink;
use crate::trap::Trap;

// decoration waits for `build` so it sees the final config
#[derive(Debug)]
enum PendingSink {
    Plain(Box<dyn Sink>),
    Decorated(Box<dyn Sink>),
}

/// A builder for configuring a [`Pipeline`].
///
/// The pipeline is created stopped; call [`Pipeline::start`] to run the drain worker.
///
/// # Examples
///
/// ```
/// use logpipe::Pipeline;
/// use logpipe::PipelineConfig;
/// use logpipe::dispatch::Routing;
/// use logpipe::record::Level;
/// use logpipe::sink::Stderr;
/// use logpipe::sink::Stdout;
///
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig {
///         min_level: Level::Info,
///         ..PipelineConfig::default()
///     })
///     .decorated_sink(Stdout::default())
///     .decorated_sink(Stderr::default())
///     .routing(Routing::RoundRobin)
///     .build();
/// assert_eq!(pipeline.dispatcher().len(), 2);
/// ```
#[must_use = "call `build` to create the pipeline"]
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    sinks: Vec<PendingSink>,
    filters: Vec<Box<dyn Filter>>,
    routing: Routing,
    trap: Option<Box<dyn Trap>>,
}

impl PipelineBuilder {
    /// Set the configuration. Default to [`PipelineConfig::default`].
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a sink as is.
    pub fn sink(mut self, sink: impl Into<Box<dyn Sink>>) -> Self {
        self.sinks.push(PendingSink::Plain(sink.into()));
        self
    }

    /// Register a sink wrapped with the decorators enabled by the final configuration.
    ///
    /// See [`PipelineConfig::decorate`].
    pub fn decorated_sink(mut self, sink: impl Into<Box<dyn Sink>>) -> Self {
        self.sinks.push(PendingSink::Decorated(sink.into()));
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

    /// Set the trap receiving internal errors.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = Some(trap.into());
        self
    }

    /// Build the [`Pipeline`].
    pub fn build(self) -> Pipeline {
        let config = self.config;
        let sinks = self
            .sinks
            .into_iter()
            .map(|sink| match sink {
                PendingSink::Plain(sink) => sink,
                PendingSink::Decorated(sink) => config.decorate(sink),
            })
            .collect();

        let dispatcher = Dispatcher::from_parts(sinks, self.filters, self.routing, self.trap);
        Pipeline::new(config, dispatcher)
    }
}
