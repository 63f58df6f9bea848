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

//! Logpipe is an in-process asynchronous log pipeline.
//!
//! # Overview
//!
//! Producers on any thread submit records to a [`Pipeline`] without blocking on I/O. Records are
//! pushed onto a lock-free [`ConcurrentQueue`](queue::ConcurrentQueue); a single drain thread pops
//! them in batches and hands them to a [`Dispatcher`], which filters them, routes them to one or
//! more [`Sink`]s, and isolates failing sinks from the rest. Sinks can be wrapped by
//! [decorators](decorate) that transform each record on its way out.
//!
//! ```text
//! submit -> queue -> drain worker -> dispatcher (filter, route) -> decorators -> sink
//! ```
//!
//! # Examples
//!
//! Simple setup with a decorated stdout sink:
//!
//! ```
//! use logpipe::Pipeline;
//! use logpipe::sink::Stdout;
//!
//! let pipeline = Pipeline::builder().decorated_sink(Stdout::default()).build();
//! pipeline.start().unwrap();
//!
//! pipeline.info("This is an info message.");
//! pipeline.stop();
//! ```
//!
//! Several sinks, a level threshold, and round-robin routing:
//!
//! ```
//! use logpipe::Pipeline;
//! use logpipe::PipelineConfig;
//! use logpipe::decorate::SinkExt;
//! use logpipe::decorate::Timestamp;
//! use logpipe::dispatch::Routing;
//! use logpipe::record::Level;
//! use logpipe::sink::Stderr;
//! use logpipe::sink::Stdout;
//!
//! let pipeline = Pipeline::builder()
//!     .config(PipelineConfig {
//!         min_level: Level::Info,
//!         ..PipelineConfig::default()
//!     })
//!     .sink(Stdout::default().decorate(Timestamp::default()))
//!     .sink(Stderr::default())
//!     .routing(Routing::RoundRobin)
//!     .build();
//!
//! pipeline.start().unwrap();
//! pipeline.debug("Filtered out.");
//! pipeline.warn("Goes to stdout.");
//! pipeline.error("Goes to stderr.");
//! pipeline.stop();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod decorate;
pub mod dispatch;
pub mod filter;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod registry;
pub mod sink;
pub mod trap;

mod error;
pub use self::error::Error;

pub use self::dispatch::Dispatcher;
pub use self::filter::Filter;
pub use self::pipeline::Pipeline;
pub use self::pipeline::PipelineConfig;
pub use self::record::Level;
pub use self::record::Record;
pub use self::sink::Sink;
pub use self::trap::Trap;
