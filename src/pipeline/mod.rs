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

//! The pipeline controller: submission, the drain worker and its lifecycle.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use arc_swap::ArcSwap;
use crossbeam_channel::Sender;

use crate::Error;
use crate::dispatch::Dispatcher;
use crate::queue::ConcurrentQueue;
use crate::record::Level;
use crate::record::Origin;
use crate::record::Record;

mod builder;
mod config;
mod worker;

pub use self::builder::PipelineBuilder;
pub use self::config::PipelineConfig;

use self::worker::Worker;

/// The lifecycle state of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// No drain worker is running. Submitted records stay queued.
    Stopped,
    /// The drain worker forwards queued records to the dispatcher.
    Running,
    /// [`Pipeline::stop`] is delivering the remaining records.
    Draining,
}

impl PipelineState {
    fn from_u8(state: u8) -> Self {
        match state {
            1 => PipelineState::Running,
            2 => PipelineState::Draining,
            _ => PipelineState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PipelineState::Stopped => 0,
            PipelineState::Running => 1,
            PipelineState::Draining => 2,
        }
    }
}

/// Counters of a [`Pipeline`], taken at one point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Records pushed into the queue.
    pub accepted: u64,
    /// Records rejected because the queue was at its soft capacity.
    pub dropped: u64,
    /// Records discarded for being below the minimum level, at submission or when drained.
    pub filtered: u64,
    /// Records handed to the dispatcher.
    pub dispatched: u64,
    /// Failed sink operations reported by the dispatcher.
    pub failed_writes: u64,
}

struct Shared {
    queue: ConcurrentQueue<Record>,
    dispatcher: Dispatcher,
    config: ArcSwap<PipelineConfig>,
    state: AtomicU8,

    accepted: AtomicU64,
    dropped: AtomicU64,
    filtered: AtomicU64,
    dispatched: AtomicU64,
    // records that left the queue, dispatched or filtered
    settled: AtomicU64,
}

impl Shared {
    fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PipelineState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn drain_batch(&self, batch: &mut Vec<Record>, config: &PipelineConfig) -> usize {
        let count = self.queue.pop_batch_into(batch, config.batch_size());
        for record in batch.drain(..) {
            // the threshold may have been raised since the record was queued
            if record.level() < config.min_level {
                self.filtered.fetch_add(1, Ordering::Relaxed);
            } else {
                self.dispatcher.dispatch(&record);
                self.dispatched.fetch_add(1, Ordering::Relaxed);
            }
            self.settled.fetch_add(1, Ordering::Release);
        }
        count
    }

    fn drain_all(&self) {
        let config = self.config.load_full();
        let mut batch = Vec::new();
        while self.drain_batch(&mut batch, &config) > 0 {}
    }

    fn is_drained(&self) -> bool {
        // `settled` trails the queue: records popped but still being written count as pending
        self.queue.is_empty()
            && self.settled.load(Ordering::Acquire) >= self.accepted.load(Ordering::Acquire)
    }
}

struct Running {
    handle: JoinHandle<()>,
    // dropping the sender wakes the worker and ends its loop
    shutdown: Sender<()>,
}

/// An asynchronous log pipeline.
///
/// Producers call [`submit`](Self::submit) (or one of the per-level shortcuts) from any thread.
/// Submission never blocks on I/O: it pushes the record onto a lock-free queue, or drops it when
/// the queue holds [`queue_soft_capacity`](PipelineConfig::queue_soft_capacity) records. A
/// dedicated drain thread forwards queued records to the [`Dispatcher`] in batches.
///
/// # Examples
///
/// ```
/// use logpipe::Pipeline;
/// use logpipe::sink::Capture;
///
/// let capture = Capture::default();
/// let pipeline = Pipeline::builder().sink(capture.clone()).build();
///
/// pipeline.start().unwrap();
/// pipeline.info("service started");
/// pipeline.stop();
///
/// assert_eq!(capture.messages(), vec!["service started"]);
/// ```
pub struct Pipeline {
    shared: Arc<Shared>,
    lifecycle: Mutex<Option<Running>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state())
            .field("queue_length", &self.queue_length())
            .field("config", &self.shared.config.load_full())
            .field("dispatcher", &self.shared.dispatcher)
            .finish()
    }
}

impl Pipeline {
    /// Create a new [`PipelineBuilder`].
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub(crate) fn new(config: PipelineConfig, dispatcher: Dispatcher) -> Self {
        let shared = Shared {
            queue: ConcurrentQueue::new(),
            dispatcher,
            config: ArcSwap::from_pointee(config),
            state: AtomicU8::new(PipelineState::Stopped.as_u8()),
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            settled: AtomicU64::new(0),
        };

        Self {
            shared: Arc::new(shared),
            lifecycle: Mutex::new(None),
        }
    }

    /// Start the drain worker.
    ///
    /// Calling `start` on a running pipeline is a no-op. A stopped pipeline can be started again.
    ///
    /// # Errors
    ///
    /// Return an error if the drain thread cannot be spawned.
    pub fn start(&self) -> Result<(), Error> {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.is_some() {
            return Ok(());
        }

        let (shutdown, signal) = crossbeam_channel::bounded(0);
        let worker = Worker::new(self.shared.clone(), signal);
        let handle = worker
            .make_thread()
            .map_err(|err| Error::new("failed to spawn drain worker").with_source(err))?;

        *lifecycle = Some(Running { handle, shutdown });
        self.shared.set_state(PipelineState::Running);
        Ok(())
    }

    /// Stop the drain worker.
    ///
    /// Waits for the worker to exit, delivers every record still queued, then flushes all sinks.
    /// Stopping a stopped pipeline is a no-op; concurrent callers wait for the first one to finish.
    pub fn stop(&self) {
        let mut lifecycle = self.lock_lifecycle();
        let Some(running) = lifecycle.take() else {
            return;
        };

        self.shared.set_state(PipelineState::Draining);
        drop(running.shutdown);
        if running.handle.join().is_err() {
            let err = Error::new("drain worker panicked");
            self.shared.dispatcher.trap(&err);
        }

        self.shared.drain_all();
        self.shared.dispatcher.flush();
        self.shared.set_state(PipelineState::Stopped);
    }

    /// Submit a record without origin.
    ///
    /// Never blocks and never fails: records below the minimum level are discarded and records
    /// arriving while the queue is full are dropped, each counted in [`stats`](Self::stats).
    pub fn submit(&self, level: Level, message: impl Into<String>) {
        self.push(level, message, None);
    }

    /// Submit a record produced at `origin`.
    pub fn submit_at(&self, level: Level, message: impl Into<String>, origin: Origin) {
        self.push(level, message, Some(origin));
    }

    /// Submit a [`Level::Debug`] record from the caller's location.
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.push(Level::Debug, message, Some(Origin::caller()));
    }

    /// Submit a [`Level::Info`] record from the caller's location.
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message, Some(Origin::caller()));
    }

    /// Submit a [`Level::Warn`] record from the caller's location.
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.push(Level::Warn, message, Some(Origin::caller()));
    }

    /// Submit a [`Level::Error`] record from the caller's location.
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message, Some(Origin::caller()));
    }

    /// Submit a [`Level::Fatal`] record from the caller's location.
    ///
    /// This only logs; it does not terminate the process.
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.push(Level::Fatal, message, Some(Origin::caller()));
    }

    fn push(&self, level: Level, message: impl Into<String>, origin: Option<Origin>) {
        let config = self.shared.config.load();
        if level < config.min_level {
            self.shared.filtered.fetch_add(1, Ordering::Relaxed);
            return;
        }
        if self.shared.queue.len() >= config.queue_soft_capacity {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let record = Record::builder()
            .level(level)
            .message(message)
            .origin(origin)
            .build();
        self.shared.queue.push(record);
        self.shared.accepted.fetch_add(1, Ordering::Release);
    }

    /// Flush every sink.
    pub fn flush(&self) {
        self.shared.dispatcher.flush();
    }

    /// Whether the drain worker is running.
    pub fn is_running(&self) -> bool {
        self.state() == PipelineState::Running
    }

    /// The lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// The approximate number of queued records.
    pub fn queue_length(&self) -> usize {
        self.shared.queue.len()
    }

    /// Wait until every accepted record has been dispatched, or `timeout` elapses.
    ///
    /// Returns whether the pipeline drained in time. Producers are not paused, so a busy pipeline
    /// may never drain. A stopped pipeline with queued records never drains.
    pub fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.shared.is_drained() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// A snapshot of the pipeline counters.
    pub fn stats(&self) -> Stats {
        Stats {
            accepted: self.shared.accepted.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            filtered: self.shared.filtered.load(Ordering::Relaxed),
            dispatched: self.shared.dispatched.load(Ordering::Relaxed),
            failed_writes: self.shared.dispatcher.failures(),
        }
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::clone(&self.shared.config.load())
    }

    /// Replace the configuration as a whole.
    ///
    /// Submission and the drain worker pick up the new snapshot on their next read. A raised
    /// [`min_level`](PipelineConfig::min_level) also discards queued records below it. Decorator
    /// toggles only affect sinks decorated afterwards.
    pub fn set_config(&self, config: PipelineConfig) {
        self.shared.config.store(Arc::new(config));
    }

    /// The minimum level accepted at submission.
    pub fn min_level(&self) -> Level {
        self.shared.config.load().min_level
    }

    /// The dispatcher owning the sinks.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.shared.dispatcher
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Option<Running>> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
        // records submitted to a pipeline that was never started
        self.shared.drain_all();
        self.shared.dispatcher.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Capture;
    use crate::trap::NoopTrap;

    fn plain(capture: &Capture) -> Pipeline {
        Pipeline::builder().sink(capture.clone()).trap(NoopTrap).build()
    }

    #[test]
    fn test_lifecycle_is_idempotent() {
        let capture = Capture::default();
        let pipeline = plain(&capture);
        assert_eq!(pipeline.state(), PipelineState::Stopped);

        pipeline.stop();
        pipeline.start().unwrap();
        pipeline.start().unwrap();
        assert!(pipeline.is_running());

        pipeline.info("first");
        pipeline.stop();
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert!(!pipeline.is_running());

        pipeline.start().unwrap();
        pipeline.info("second");
        pipeline.stop();
        assert_eq!(capture.messages(), vec!["first", "second"]);
        assert!(capture.flushes() >= 2);
    }

    #[test]
    fn test_below_min_level_never_queued() {
        let capture = Capture::default();
        let pipeline = Pipeline::builder()
            .config(PipelineConfig {
                min_level: Level::Warn,
                ..PipelineConfig::default()
            })
            .sink(capture.clone())
            .build();

        pipeline.debug("d");
        pipeline.info("i");
        pipeline.warn("w");
        pipeline.fatal("f");
        assert_eq!(pipeline.queue_length(), 2);

        pipeline.start().unwrap();
        pipeline.stop();
        assert_eq!(capture.messages(), vec!["w", "f"]);

        let stats = pipeline.stats();
        assert_eq!(stats.filtered, 2);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.dispatched, 2);
    }

    #[test]
    fn test_overflow_rejects_newest() {
        let capture = Capture::default();
        let pipeline = Pipeline::builder()
            .config(PipelineConfig {
                queue_soft_capacity: 3,
                ..PipelineConfig::default()
            })
            .sink(capture.clone())
            .build();

        for i in 0..5 {
            pipeline.submit(Level::Info, format!("m{i}"));
        }
        assert_eq!(pipeline.queue_length(), 3);
        assert!(!pipeline.wait_for_drain(Duration::from_millis(5)));

        pipeline.start().unwrap();
        assert!(pipeline.wait_for_drain(Duration::from_secs(5)));
        pipeline.stop();

        assert_eq!(capture.messages(), vec!["m0", "m1", "m2"]);
        let stats = pipeline.stats();
        assert_eq!((stats.accepted, stats.dropped), (3, 2));
    }

    #[test]
    fn test_shortcuts_capture_caller() {
        let capture = Capture::default();
        let pipeline = plain(&capture);

        let line = line!() + 1;
        pipeline.error("boom");
        pipeline.submit_at(
            Level::Info,
            "explicit",
            Origin::new("lib.rs", 9).with_function("run"),
        );
        pipeline.submit(Level::Info, "bare");
        drop(pipeline);

        let records = capture.records();
        assert_eq!(records.len(), 3);
        assert!(records[0].file().unwrap().ends_with("mod.rs"));
        assert_eq!(records[0].line(), Some(line));
        assert_eq!(records[1].function(), Some("run"));
        assert!(records[2].origin().is_none());
        assert!(capture.is_closed());
    }

    #[test]
    fn test_set_config_replaces_snapshot() {
        let pipeline = plain(&Capture::default());
        let config = PipelineConfig {
            min_level: Level::Error,
            drain_batch_size: 7,
            ..PipelineConfig::default()
        };
        pipeline.set_config(config.clone());

        assert_eq!(pipeline.config(), config);
        assert_eq!(pipeline.min_level(), Level::Error);
        pipeline.warn("ignored");
        assert_eq!(pipeline.stats().filtered, 1);
    }

    #[test]
    fn test_raised_min_level_applies_to_queued_records() {
        let capture = Capture::default();
        let pipeline = plain(&capture);

        pipeline.debug("stale");
        pipeline.error("kept");
        pipeline.set_config(PipelineConfig {
            min_level: Level::Warn,
            ..pipeline.config()
        });

        pipeline.start().unwrap();
        assert!(pipeline.wait_for_drain(Duration::from_secs(5)));
        pipeline.stop();

        assert_eq!(capture.messages(), vec!["kept"]);
        let stats = pipeline.stats();
        assert_eq!((stats.accepted, stats.filtered, stats.dispatched), (2, 1, 1));
    }

    #[test]
    fn test_periodic_flush() {
        let capture = Capture::default();
        let pipeline = Pipeline::builder()
            .config(PipelineConfig {
                flush_interval_ms: 1,
                idle_wait_ms: 1,
                ..PipelineConfig::default()
            })
            .sink(capture.clone())
            .build();

        pipeline.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while capture.flushes() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(capture.flushes() >= 3);
        pipeline.stop();
    }
}
