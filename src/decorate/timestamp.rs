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

use std::borrow::Cow;

use jiff::tz::TimeZone;

use crate::Error;
use crate::decorate::Transform;
use crate::record::Record;

/// The default format, e.g. `2024-08-11 22:44:57`.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prepend the current time to the message: `[<time>] <message>`.
///
/// The format is a [`strftime`](jiff::fmt::strtime) pattern, and defaults to
/// [`DEFAULT_TIME_FORMAT`] in the system timezone.
///
/// # Examples
///
/// ```
/// use jiff::tz::TimeZone;
/// use logpipe::decorate::Timestamp;
///
/// let timestamp = Timestamp::new("%H:%M:%S%.3f").timezone(TimeZone::UTC);
/// ```
#[derive(Debug, Clone)]
pub struct Timestamp {
    format: String,
    timezone: TimeZone,
    clock: fn() -> jiff::Timestamp,
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FORMAT)
    }
}

impl Timestamp {
    /// Create a decorator with the given time format.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            timezone: TimeZone::system(),
            clock: jiff::Timestamp::now,
        }
    }

    /// Set the timezone for timestamps.
    ///
    /// Defaults to the system timezone if not set.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    /// Replace the source of the current time.
    pub fn clock(mut self, clock: fn() -> jiff::Timestamp) -> Self {
        self.clock = clock;
        self
    }

    /// The time format.
    pub fn format(&self) -> &str {
        &self.format
    }

    fn now(&self) -> Result<String, Error> {
        let now = (self.clock)().to_zoned(self.timezone.clone());
        jiff::fmt::strtime::format(self.format.as_str(), &now).map_err(|err| {
            Error::new("failed to format timestamp")
                .with_context("format", &self.format)
                .with_source(err)
        })
    }
}

impl Transform for Timestamp {
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
        let message = format!("[{}] {}", self.now()?, record.message());
        Ok(Some(Cow::Owned(record.with_message(message))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn epoch() -> jiff::Timestamp {
        jiff::Timestamp::UNIX_EPOCH
    }

    #[test]
    fn test_prefix_with_fixed_clock() {
        let timestamp = Timestamp::default().timezone(TimeZone::UTC).clock(epoch);
        let record = Record::new(Level::Info, "hi");
        let out = timestamp.transform(&record).unwrap().unwrap();
        assert_eq!(out.message(), "[1970-01-01 00:00:00] hi");
        assert_eq!(record.message(), "hi");
    }

    #[test]
    fn test_custom_format() {
        let timestamp = Timestamp::new("%H:%M").timezone(TimeZone::UTC).clock(epoch);
        let record = Record::new(Level::Debug, "tick");
        let out = timestamp
            .transform(&record)
            .unwrap()
            .unwrap();
        assert_eq!(out.message(), "[00:00] tick");
    }
}
