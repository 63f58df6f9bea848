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

use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Level;
use crate::record::Record;

/// A filter that rejects records less severe than the given level.
///
/// # Examples
///
/// ```
/// use logpipe::filter::Filter;
/// use logpipe::filter::FilterResult;
/// use logpipe::filter::MinLevel;
/// use logpipe::record::Level;
/// use logpipe::record::Record;
///
/// let filter = MinLevel(Level::Warn);
/// assert_eq!(filter.matches(&Record::new(Level::Info, "")), FilterResult::Reject);
/// assert_eq!(filter.matches(&Record::new(Level::Error, "")), FilterResult::Neutral);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinLevel(pub Level);

impl Filter for MinLevel {
    fn matches(&self, record: &Record) -> FilterResult {
        if record.level() >= self.0 {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl Filter for Level {
    fn matches(&self, record: &Record) -> FilterResult {
        MinLevel(*self).matches(record)
    }
}
