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

//! Message transformations chained around a sink.
//!
//! A [`Decorated`] wrapper owns exactly one inner sink and is a [`Sink`] itself, so chains compose
//! recursively. Chains are built innermost-first, starting from the sink. A write enters at the
//! outermost decorator and travels inwards, so the decorator closest to the sink sees the text every
//! outer decorator already produced.
//!
//! ```
//! use logpipe::decorate::Color;
//! use logpipe::decorate::SinkExt;
//! use logpipe::decorate::Timestamp;
//! use logpipe::sink::Stdout;
//!
//! // Timestamp prefixes first, then Color wraps the whole "[timestamp] message" text.
//! let chain = Stdout::default()
//!     .decorate(Color::default())
//!     .decorate(Timestamp::default());
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::Error;
use crate::record::Record;
use crate::sink::Sink;

mod collapse;
mod color;
mod filter;
mod format;
mod thread;
mod timestamp;

pub use self::collapse::COLLAPSED_TAG;
pub use self::collapse::CollapseWhitespace;
pub use self::color::Color;
pub use self::color::RESET;
pub use self::filter::Filter;
pub use self::format::Format;
pub use self::thread::ThreadTag;
pub use self::timestamp::DEFAULT_TIME_FORMAT;
pub use self::timestamp::Timestamp;

/// A transformation applied to a record before it reaches the wrapped sink.
pub trait Transform: fmt::Debug + Send + Sync + 'static {
    /// Produce the record to forward.
    ///
    /// Return `Ok(None)` to drop the record, or borrow the input to forward it unchanged. The input
    /// is never mutated; changed records are new values.
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error>;
}

/// A sink wrapped by a [`Transform`].
///
/// `write` forwards the transformed record; `flush`, `close` and `is_available` pass through to
/// the inner sink unchanged.
#[derive(Debug)]
pub struct Decorated<T: Transform> {
    transform: T,
    inner: Box<dyn Sink>,
}

impl<T: Transform> Decorated<T> {
    /// Wrap `inner` with `transform`.
    pub fn new(transform: T, inner: impl Into<Box<dyn Sink>>) -> Self {
        Self {
            transform,
            inner: inner.into(),
        }
    }

    /// The transformation applied by this decorator.
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// The wrapped sink.
    pub fn inner(&self) -> &dyn Sink {
        self.inner.as_ref()
    }

    /// Unwrap the decorator, returning the wrapped sink.
    pub fn into_inner(self) -> Box<dyn Sink> {
        self.inner
    }
}

impl<T: Transform> Sink for Decorated<T> {
    fn write(&self, record: &Record) -> Result<(), Error> {
        match self.transform.transform(record)? {
            Some(record) => self.inner.write(&record),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }

    fn close(&self) -> Result<(), Error> {
        self.inner.close()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

/// Extension methods to build decorator chains.
pub trait SinkExt: Sink + Sized {
    /// Wrap this sink with `transform`.
    fn decorate<T: Transform>(self, transform: T) -> Decorated<T> {
        Decorated::new(transform, self)
    }
}

impl<S: Sink> SinkExt for S {}

// a printable identity for the producing thread
pub(crate) fn thread_label(record: &Record) -> String {
    match record.thread_name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", record.thread_id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use crate::sink::Capture;

    #[derive(Debug)]
    struct Suffix(&'static str);

    impl Transform for Suffix {
        fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
            let message = format!("{}{}", record.message(), self.0);
            Ok(Some(Cow::Owned(record.with_message(message))))
        }
    }

    #[test]
    fn test_outermost_applies_first() {
        let capture = Capture::default();
        let chain = capture.clone().decorate(Suffix("-a")).decorate(Suffix("-b"));

        let record = Record::new(Level::Info, "x");
        chain.write(&record).unwrap();

        assert_eq!(capture.messages(), vec!["x-b-a"]);
        assert_eq!(record.message(), "x");
    }

    #[test]
    fn test_lifecycle_passes_through() {
        let capture = Capture::default();
        let chain = capture.clone().decorate(Suffix("!")).decorate(Suffix("?"));

        chain.flush().unwrap();
        assert_eq!(capture.flushes(), 1);
        assert!(chain.is_available());

        chain.close().unwrap();
        assert!(capture.is_closed());
        assert!(!chain.is_available());
        assert!(chain.write(&Record::new(Level::Info, "late")).is_err());
    }
}
