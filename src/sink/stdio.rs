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

use std::io::Write;

use crate::Error;
use crate::record::Record;
use crate::sink::Sink;

/// A sink that prints records to stdout.
///
/// Each record is written as one line: `[LEVEL] message`, or just the message if the level prefix
/// is disabled (useful when a [`Format`](crate::decorate::Format) decorator renders it already).
///
/// # Examples
///
/// ```
/// use logpipe::sink::Stdout;
///
/// let stdout_sink = Stdout::default();
/// ```
#[derive(Debug, Default)]
pub struct Stdout {
    no_level: bool,
}

impl Stdout {
    /// Write the message only, without the level prefix.
    pub fn no_level(mut self) -> Self {
        self.no_level = true;
        self
    }
}

impl Sink for Stdout {
    fn write(&self, record: &Record) -> Result<(), Error> {
        let line = format_line(record, self.no_level);
        std::io::stdout()
            .write_all(line.as_bytes())
            .map_err(Error::from_io_error)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}

/// A sink that prints records to stderr.
///
/// # Examples
///
/// ```
/// use logpipe::sink::Stderr;
///
/// let stderr_sink = Stderr::default().no_level();
/// ```
#[derive(Debug, Default)]
pub struct Stderr {
    no_level: bool,
}

impl Stderr {
    /// Write the message only, without the level prefix.
    pub fn no_level(mut self) -> Self {
        self.no_level = true;
        self
    }
}

impl Sink for Stderr {
    fn write(&self, record: &Record) -> Result<(), Error> {
        let line = format_line(record, self.no_level);
        std::io::stderr()
            .write_all(line.as_bytes())
            .map_err(Error::from_io_error)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stderr().flush().map_err(Error::from_io_error)?;
        Ok(())
    }
}

pub(super) fn format_line(record: &Record, no_level: bool) -> String {
    if no_level {
        format!("{}\n", record.message())
    } else {
        format!("[{}] {}\n", record.level(), record.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_format_line() {
        let record = Record::new(Level::Warn, "disk almost full");
        assert_eq!(format_line(&record, false), "[WARN] disk almost full\n");
        assert_eq!(format_line(&record, true), "disk almost full\n");
    }
}
