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

use std::time::Duration;

use crate::decorate::Color;
use crate::decorate::Decorated;
use crate::decorate::Format;
use crate::decorate::ThreadTag;
use crate::decorate::Timestamp;
use crate::record::Level;
use crate::sink::Sink;

/// A snapshot of the pipeline settings.
///
/// The live configuration of a [`Pipeline`](crate::Pipeline) is replaced as a whole through
/// [`Pipeline::set_config`](crate::Pipeline::set_config); readers never observe a half-updated
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Records less severe than this are discarded at submission.
    pub min_level: Level,
    /// Submissions are dropped while this many records are queued.
    pub queue_soft_capacity: usize,
    /// The maximum number of records the drain worker takes per batch.
    pub drain_batch_size: usize,
    /// How often the drain worker flushes the sinks. At least 1 ms.
    pub flush_interval_ms: u64,
    /// Prefix messages with the current time.
    pub enable_timestamp: bool,
    /// Wrap messages in ANSI color codes by severity.
    pub enable_color: bool,
    /// Prefix messages with the producing thread.
    pub enable_thread_id: bool,
    /// Render messages through a [`Format`] template.
    pub message_template: Option<String>,
    /// How long the drain worker waits when the queue is empty. At least 1 ms.
    pub idle_wait_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Debug,
            queue_soft_capacity: 10_000,
            drain_batch_size: 100,
            flush_interval_ms: 1_000,
            enable_timestamp: true,
            enable_color: true,
            enable_thread_id: false,
            message_template: None,
            idle_wait_ms: 10,
        }
    }
}

impl PipelineConfig {
    /// Wrap `sink` with the decorators enabled by this configuration.
    ///
    /// The chain is built innermost-first: [`Color`], [`Timestamp`], [`ThreadTag`], then
    /// [`Format`]. A write passes them in reverse, so the template is rendered first and the color
    /// codes wrap the finished line.
    pub fn decorate(&self, sink: impl Into<Box<dyn Sink>>) -> Box<dyn Sink> {
        let mut sink = sink.into();
        if self.enable_color {
            sink = Box::new(Decorated::new(Color::default(), sink));
        }
        if self.enable_timestamp {
            sink = Box::new(Decorated::new(Timestamp::default(), sink));
        }
        if self.enable_thread_id {
            sink = Box::new(Decorated::new(ThreadTag, sink));
        }
        if let Some(template) = &self.message_template {
            sink = Box::new(Decorated::new(Format::new(template.as_str()), sink));
        }
        sink
    }

    // zero would flush or poll on every loop iteration
    pub(crate) fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub(crate) fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }

    pub(crate) fn batch_size(&self) -> usize {
        self.drain_batch_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::RESET;
    use crate::record::Record;
    use crate::sink::Capture;

    #[test]
    fn test_intervals_never_zero() {
        let config = PipelineConfig {
            flush_interval_ms: 0,
            idle_wait_ms: 0,
            drain_batch_size: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(config.flush_interval(), Duration::from_millis(1));
        assert_eq!(config.idle_wait(), Duration::from_millis(1));
        assert_eq!(config.batch_size(), 1);
    }

    #[test]
    fn test_plain_config_leaves_messages_alone() {
        let capture = Capture::default();
        let config = PipelineConfig {
            enable_timestamp: false,
            enable_color: false,
            ..PipelineConfig::default()
        };

        let sink = config.decorate(capture.clone());
        sink.write(&Record::new(Level::Info, "hi")).unwrap();
        assert_eq!(capture.messages(), vec!["hi"]);
    }

    #[test]
    fn test_template_then_color() {
        let capture = Capture::default();
        let config = PipelineConfig {
            enable_timestamp: false,
            message_template: Some("{level}: {message}".to_string()),
            ..PipelineConfig::default()
        };

        let sink = config.decorate(capture.clone());
        sink.write(&Record::new(Level::Warn, "hi")).unwrap();
        let expected = format!("{}WARN: hi{RESET}", Color::code(Level::Warn));
        assert_eq!(capture.messages(), vec![expected]);
    }
}
