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

//! Construct sinks and decorator chains from names.
//!
//! A [`Registry`] is an explicit value owned by the caller; there is no process-wide table.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use crate::decorate::CollapseWhitespace;
use crate::decorate::Color;
use crate::decorate::Decorated;
use crate::decorate::Format;
use crate::decorate::ThreadTag;
use crate::decorate::Timestamp;
use crate::pipeline::PipelineConfig;
use crate::sink::Sink;
use crate::sink::Stderr;
use crate::sink::Stdout;
use crate::sink::Testing;

/// The template used by the `format` decorator when the configuration sets none.
pub const DEFAULT_TEMPLATE: &str = "[{level}] {message}";

/// Creates a sink.
pub type SinkFactory = Box<dyn Fn(&PipelineConfig) -> Box<dyn Sink> + Send + Sync>;

/// Wraps a sink with a decorator.
pub type DecoratorFactory =
    Box<dyn Fn(Box<dyn Sink>, &PipelineConfig) -> Box<dyn Sink> + Send + Sync>;

/// A mapping from names to sink and decorator factories.
///
/// # Examples
///
/// ```
/// use logpipe::PipelineConfig;
/// use logpipe::registry::Registry;
///
/// let registry = Registry::with_builtins();
/// let config = PipelineConfig::default();
///
/// let sink = registry.build("stderr", &["color", "timestamp"], &config);
/// assert!(sink.is_some());
/// assert!(registry.build("syslog", &[], &config).is_none());
/// ```
#[derive(Default)]
pub struct Registry {
    sinks: BTreeMap<String, SinkFactory>,
    decorators: BTreeMap<String, DecoratorFactory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("sinks", &self.sinks.keys().collect::<Vec<_>>())
            .field("decorators", &self.decorators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry knowing the built-in sinks and decorators.
    ///
    /// Sinks: `stdout`, `stderr`, `testing`. Decorators: `timestamp`, `color`, `collapse`,
    /// `thread`, `format` (rendering [`PipelineConfig::message_template`], or
    /// [`DEFAULT_TEMPLATE`]).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_sink("stdout", |_| Box::new(Stdout::default()));
        registry.register_sink("stderr", |_| Box::new(Stderr::default()));
        registry.register_sink("testing", |_| Box::new(Testing::default()));

        registry.register_decorator("timestamp", |sink, _| {
            Box::new(Decorated::new(Timestamp::default(), sink))
        });
        registry.register_decorator("color", |sink, _| {
            Box::new(Decorated::new(Color::default(), sink))
        });
        registry.register_decorator("collapse", |sink, _| {
            Box::new(Decorated::new(CollapseWhitespace::default(), sink))
        });
        registry.register_decorator("thread", |sink, _| {
            Box::new(Decorated::new(ThreadTag, sink))
        });
        registry.register_decorator("format", |sink, config| {
            let template = config.message_template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
            Box::new(Decorated::new(Format::new(template), sink))
        });
        registry
    }

    /// Register a sink factory under `name`.
    ///
    /// Returns `false`, keeping the existing factory, if the name is taken.
    pub fn register_sink(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&PipelineConfig) -> Box<dyn Sink> + Send + Sync + 'static,
    ) -> bool {
        match self.sinks.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Box::new(factory));
                true
            }
        }
    }

    /// Register a decorator factory under `name`.
    ///
    /// Returns `false`, keeping the existing factory, if the name is taken.
    pub fn register_decorator(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(Box<dyn Sink>, &PipelineConfig) -> Box<dyn Sink> + Send + Sync + 'static,
    ) -> bool {
        match self.decorators.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Box::new(factory));
                true
            }
        }
    }

    /// Whether a sink factory is registered under `name`.
    pub fn has_sink(&self, name: &str) -> bool {
        self.sinks.contains_key(name)
    }

    /// Whether a decorator factory is registered under `name`.
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.contains_key(name)
    }

    /// The registered sink names, sorted.
    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.keys().map(String::as_str)
    }

    /// The registered decorator names, sorted.
    pub fn decorator_names(&self) -> impl Iterator<Item = &str> {
        self.decorators.keys().map(String::as_str)
    }

    /// Create the sink registered under `name`.
    pub fn create_sink(&self, name: &str, config: &PipelineConfig) -> Option<Box<dyn Sink>> {
        self.sinks.get(name).map(|factory| factory(config))
    }

    /// Create the sink `sink` wrapped by `decorators`, listed innermost-first.
    ///
    /// Returns `None` without constructing anything if any name is unknown.
    pub fn build(
        &self,
        sink: &str,
        decorators: &[&str],
        config: &PipelineConfig,
    ) -> Option<Box<dyn Sink>> {
        let factories = decorators
            .iter()
            .map(|name| self.decorators.get(*name))
            .collect::<Option<Vec<_>>>()?;

        let sink = self.create_sink(sink, config)?;
        Some(
            factories
                .into_iter()
                .fold(sink, |sink, decorate| decorate(sink, config)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::RESET;
    use crate::record::Level;
    use crate::record::Record;
    use crate::sink::Capture;

    #[test]
    fn test_builtin_names() {
        let registry = Registry::with_builtins();
        assert_eq!(
            registry.sink_names().collect::<Vec<_>>(),
            vec!["stderr", "stdout", "testing"]
        );
        assert_eq!(
            registry.decorator_names().collect::<Vec<_>>(),
            vec!["collapse", "color", "format", "thread", "timestamp"]
        );
        assert!(registry.has_sink("stdout"));
        assert!(!registry.has_decorator("gzip"));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = Registry::with_builtins();
        assert!(!registry.register_sink("stdout", |_| Box::new(Capture::default())));

        let capture = Capture::default();
        let shared = capture.clone();
        assert!(registry.register_sink("capture", move |_| Box::new(shared.clone())));

        let config = PipelineConfig {
            message_template: Some("<{level}> {message}".to_string()),
            ..PipelineConfig::default()
        };
        let sink = registry.build("capture", &["color", "format"], &config).unwrap();
        sink.write(&Record::new(Level::Error, "disk")).unwrap();

        let expected = format!("{}<ERROR> disk{RESET}", Color::code(Level::Error));
        assert_eq!(capture.messages(), vec![expected]);
    }

    #[test]
    fn test_unknown_names() {
        let registry = Registry::with_builtins();
        let config = PipelineConfig::default();
        assert!(registry.create_sink("kafka", &config).is_none());
        assert!(registry.build("stdout", &["timestamp", "zstd"], &config).is_none());
        assert!(registry.build("stdout", &[], &config).is_some());
    }
}
