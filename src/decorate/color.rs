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

use colored::Color as AnsiColor;

use crate::Error;
use crate::decorate::Transform;
use crate::record::Level;
use crate::record::Record;

/// The ANSI sequence that resets all attributes.
pub const RESET: &str = "\x1b[0m";

/// Wrap the message in the ANSI color of its level: `<code><message><reset>`.
///
/// | Level | Color   |
/// |-------|---------|
/// | DEBUG | cyan    |
/// | INFO  | green   |
/// | WARN  | yellow  |
/// | ERROR | red     |
/// | FATAL | magenta |
#[derive(Debug, Default, Clone)]
pub struct Color {
    no_color: bool,
}

impl Color {
    /// Disable colored output; records pass through unchanged.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    /// The color of each level.
    pub fn color_of(level: Level) -> AnsiColor {
        match level {
            Level::Debug => AnsiColor::Cyan,
            Level::Info => AnsiColor::Green,
            Level::Warn => AnsiColor::Yellow,
            Level::Error => AnsiColor::Red,
            Level::Fatal => AnsiColor::Magenta,
        }
    }

    /// The ANSI foreground sequence of each level, e.g. `"\x1b[32m"` for `INFO`.
    pub fn code(level: Level) -> String {
        format!("\x1b[{}m", Self::color_of(level).to_fg_str())
    }
}

impl Transform for Color {
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
        if self.no_color {
            return Ok(Some(Cow::Borrowed(record)));
        }

        let code = Self::code(record.level());
        let message = format!("{code}{}{RESET}", record.message());
        Ok(Some(Cow::Owned(record.with_message(message))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_codes() {
        assert_eq!(Color::code(Level::Debug), "\x1b[36m");
        assert_eq!(Color::code(Level::Info), "\x1b[32m");
        assert_eq!(Color::code(Level::Warn), "\x1b[33m");
        assert_eq!(Color::code(Level::Error), "\x1b[31m");
        assert_eq!(Color::code(Level::Fatal), "\x1b[35m");
    }

    #[test]
    fn test_wraps_message() {
        let record = Record::new(Level::Error, "boom");
        let out = Color::default().transform(&record).unwrap().unwrap();
        assert_eq!(out.message(), "\x1b[31mboom\x1b[0m");

        let out = Color::default().no_color().transform(&record).unwrap().unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.message(), "boom");
    }
}
