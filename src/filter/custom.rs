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

use std::fmt;

use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Record;

type FilterFn = Box<dyn Fn(&Record) -> FilterResult + Send + Sync + 'static>;

/// A filter that you can pass the custom filter function.
///
/// The custom filter function accepts a [`&Record`][Record] and returns the [`FilterResult`]. For
/// example:
///
/// ```
/// use logpipe::filter::CustomFilter;
/// use logpipe::filter::FilterResult;
/// use logpipe::record::Record;
///
/// let filter = CustomFilter::new(|record: &Record| {
///     if record.message().contains("password") {
///         FilterResult::Reject
///     } else {
///         FilterResult::Neutral
///     }
/// });
/// ```
pub struct CustomFilter {
    f: FilterFn,
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomFilter {{ ... }}")
    }
}

impl CustomFilter {
    /// Create a filter from a function returning a [`FilterResult`].
    pub fn new(filter: impl Fn(&Record) -> FilterResult + Send + Sync + 'static) -> Self {
        CustomFilter {
            f: Box::new(filter),
        }
    }

    /// Create a filter from a predicate; records it returns `false` for are rejected.
    pub fn predicate(pred: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        CustomFilter::new(move |record| {
            if pred(record) {
                FilterResult::Neutral
            } else {
                FilterResult::Reject
            }
        })
    }
}

impl Filter for CustomFilter {
    fn matches(&self, record: &Record) -> FilterResult {
        (self.f)(record)
    }
}
