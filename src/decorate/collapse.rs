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

use crate::Error;
use crate::decorate::Transform;
use crate::record::Record;

/// The tag prepended to collapsed messages.
pub const COLLAPSED_TAG: &str = "[COLLAPSED] ";

/// Collapse runs of whitespace in long messages.
///
/// Messages at least `min_len` bytes long have every whitespace run replaced by a single space,
/// are trimmed, and get tagged with [`COLLAPSED_TAG`]. Shorter messages pass through unchanged.
/// This is a whitespace normalization, not a compression codec: the output is plain text.
#[derive(Debug, Clone)]
pub struct CollapseWhitespace {
    min_len: usize,
}

impl Default for CollapseWhitespace {
    fn default() -> Self {
        Self { min_len: 1024 }
    }
}

impl CollapseWhitespace {
    /// Collapse messages at least `min_len` bytes long.
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }

    /// The length threshold.
    pub fn min_len(&self) -> usize {
        self.min_len
    }
}

impl Transform for CollapseWhitespace {
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
        let message = record.message();
        if message.len() < self.min_len {
            return Ok(Some(Cow::Borrowed(record)));
        }

        let mut collapsed = String::with_capacity(COLLAPSED_TAG.len() + message.len());
        collapsed.push_str(COLLAPSED_TAG);
        for (i, word) in message.split_whitespace().enumerate() {
            if i > 0 {
                collapsed.push(' ');
            }
            collapsed.push_str(word);
        }
        Ok(Some(Cow::Owned(record.with_message(collapsed))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_collapse_above_threshold() {
        let collapse = CollapseWhitespace::new(8);
        let record = Record::new(Level::Info, "  a \t b\n\n  c  ");
        let out = collapse.transform(&record).unwrap().unwrap();
        assert_eq!(out.message(), "[COLLAPSED] a b c");
    }

    #[test]
    fn test_short_messages_untouched() {
        let collapse = CollapseWhitespace::default();
        let record = Record::new(Level::Info, "a   b");
        let out = collapse.transform(&record).unwrap().unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.message(), "a   b");
    }
}
