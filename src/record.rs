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

//! Log record and severity.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::str::FromStr;
use std::thread::ThreadId;

use jiff::Timestamp;

use crate::Error;

/// The severity of a record.
///
/// Levels are totally ordered from the least to the most severe:
/// `Debug < Info < Warn < Error < Fatal`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates very serious errors.
    Error,
    /// Designates errors the process cannot recover from.
    Fatal,
}

impl Level {
    /// All levels, from the least to the most severe.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for level in Level::ALL {
            if s.eq_ignore_ascii_case(level.as_str()) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

/// Where a record was produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Origin {
    file: Cow<'static, str>,
    line: u32,
    function: Option<Cow<'static, str>>,
}

impl Origin {
    /// Create an origin from a source file and line.
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            function: None,
        }
    }

    /// Set the enclosing function name.
    pub fn with_function(mut self, function: impl Into<Cow<'static, str>>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Capture the location of the caller.
    ///
    /// Functions annotated with `#[track_caller]` report the location of their own caller, so the
    /// convenience methods on [`Pipeline`](crate::Pipeline) point at user code.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }

    /// The source file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The source line.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The enclosing function, if known.
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }
}

impl From<&'static Location<'static>> for Origin {
    fn from(location: &'static Location<'static>) -> Self {
        Origin::new(location.file(), location.line())
    }
}

/// One immutable unit of log data.
///
/// Transformations never mutate a record in place: [`Record::with_message`] returns a copy carrying
/// the new message so the original stays intact for any other consumer.
#[derive(Clone, Debug)]
pub struct Record {
    level: Level,
    message: String,
    origin: Option<Origin>,

    // the observed time
    time: Timestamp,

    // the producer
    thread_id: ThreadId,
    thread_name: Option<String>,
}

impl Record {
    /// Create a record on the current thread at the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Record {
        RecordBuilder::default().level(level).message(message).build()
    }

    /// Returns a new builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The severity of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The call site, if it was captured.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// The source file containing the call site.
    pub fn file(&self) -> Option<&str> {
        self.origin.as_ref().map(Origin::file)
    }

    /// The line containing the call site.
    pub fn line(&self) -> Option<u32> {
        self.origin.as_ref().map(Origin::line)
    }

    /// The function containing the call site.
    pub fn function(&self) -> Option<&str> {
        self.origin.as_ref().and_then(Origin::function)
    }

    /// The creation time.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The identity of the producing thread.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// The name of the producing thread, if it had one.
    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// Return a copy of this record carrying `message` instead.
    pub fn with_message(&self, message: impl Into<String>) -> Record {
        Record {
            level: self.level,
            message: message.into(),
            origin: self.origin.clone(),
            time: self.time,
            thread_id: self.thread_id,
            thread_name: self.thread_name.clone(),
        }
    }

    /// Create a builder initialized with the current record's values.
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            record: self.clone(),
        }
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        let current = std::thread::current();
        RecordBuilder {
            record: Record {
                level: Level::Info,
                message: String::new(),
                origin: None,
                time: Timestamp::now(),
                thread_id: current.id(),
                thread_name: current.name().map(str::to_string),
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`message`](Record::message).
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Set [`origin`](Record::origin).
    pub fn origin(mut self, origin: Option<Origin>) -> Self {
        self.record.origin = origin;
        self
    }

    /// Set [`time`](Record::time).
    pub fn time(mut self, time: Timestamp) -> Self {
        self.record.time = time;
        self
    }

    /// Invoke the builder and return a `Record`
    pub fn build(self) -> Record {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("FATAL".parse::<Level>().unwrap(), Level::Fatal);
        assert!("verbose".parse::<Level>().is_err());
        assert_eq!(format!("{:>5}", Level::Info), " INFO");
    }

    #[test]
    fn test_with_message_keeps_original() {
        let origin = Origin::new("main.rs", 7).with_function("main");
        let record = Record::builder()
            .level(Level::Warn)
            .message("hi")
            .origin(Some(origin))
            .build();
        let copy = record.with_message("[x] hi");

        assert_eq!(record.message(), "hi");
        assert_eq!(copy.message(), "[x] hi");
        assert_eq!(copy.level(), Level::Warn);
        assert_eq!(copy.time(), record.time());
        assert_eq!(copy.thread_id(), record.thread_id());
        assert_eq!(copy.function(), Some("main"));
        assert_eq!(copy.line(), Some(7));
    }

    #[test]
    fn test_caller_origin() {
        let origin = Origin::caller();
        assert!(origin.file().ends_with("record.rs"));
        assert!(origin.function().is_none());
    }
}
