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

//! Destinations capable of consuming records.

use std::fmt;

use crate::Error;
use crate::record::Record;

mod capture;
mod stdio;
mod testing;

pub use self::capture::Capture;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Testing;

/// A destination that consumes records.
///
/// Sinks are owned exclusively by the [`Dispatcher`](crate::Dispatcher) or by a
/// [`Decorated`](crate::decorate::Decorated) wrapper. Once [`close`](Sink::close) has been called,
/// no further `write` or `flush` calls are valid.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Consume a record.
    fn write(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Release the underlying resources.
    ///
    /// Default to [`flush`](Sink::flush).
    fn close(&self) -> Result<(), Error> {
        self.flush()
    }

    /// Whether the sink is currently able to accept records.
    ///
    /// Unavailable sinks are skipped by the dispatcher. Default to `true`.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: Sink> From<T> for Box<dyn Sink> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
