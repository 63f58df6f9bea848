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

//! Filters for log records.

use std::fmt;

use crate::record::Record;

mod custom;
mod min_level;

pub use self::custom::CustomFilter;
pub use self::min_level::MinLevel;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// The record will be processed without further filtering.
    Accept,
    /// The record should not be processed.
    Reject,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

/// A filter that decides whether a record is processed.
pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Check the record.
    fn matches(&self, record: &Record) -> FilterResult;
}

impl<T: Filter> From<T> for Box<dyn Filter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Run `record` through `filters` in order.
///
/// The first `Accept` or `Reject` wins; a record that every filter leaves `Neutral` passes.
pub fn passes<F: AsRef<dyn Filter>>(filters: &[F], record: &Record) -> bool {
    for filter in filters {
        match filter.as_ref().matches(record) {
            FilterResult::Reject => return false,
            FilterResult::Accept => return true,
            FilterResult::Neutral => {}
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_first_decision_wins() {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(CustomFilter::new(|r: &Record| {
                if r.message().starts_with("audit") {
                    FilterResult::Accept
                } else {
                    FilterResult::Neutral
                }
            })),
            Box::new(MinLevel(Level::Warn)),
        ];

        assert!(passes(&filters, &Record::new(Level::Debug, "audit: login")));
        assert!(!passes(&filters, &Record::new(Level::Debug, "noise")));
        assert!(passes(&filters, &Record::new(Level::Error, "boom")));
        assert!(passes::<Box<dyn Filter>>(&[], &Record::new(Level::Debug, "anything")));
    }
}
