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
use crate::filter::FilterResult;
use crate::record::Record;

/// Drop records rejected by a [`filter::Filter`](crate::filter::Filter) before they reach the
/// wrapped sink.
///
/// Use it to give one sink its own minimum severity:
///
/// ```
/// use logpipe::decorate;
/// use logpipe::decorate::SinkExt;
/// use logpipe::record::Level;
/// use logpipe::sink::Stderr;
///
/// let errors_only = Stderr::default().decorate(decorate::Filter::new(Level::Error));
/// ```
#[derive(Debug)]
pub struct Filter {
    filter: Box<dyn crate::filter::Filter>,
}

impl Filter {
    /// Create a decorator from a filter.
    pub fn new(filter: impl Into<Box<dyn crate::filter::Filter>>) -> Self {
        Self {
            filter: filter.into(),
        }
    }
}

impl Transform for Filter {
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
        match self.filter.matches(record) {
            FilterResult::Reject => Ok(None),
            FilterResult::Accept | FilterResult::Neutral => Ok(Some(Cow::Borrowed(record))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::SinkExt;
    use crate::filter::CustomFilter;
    use crate::record::Level;
    use crate::sink::Capture;
    use crate::sink::Sink;

    #[test]
    fn test_rejected_records_never_reach_sink() {
        let capture = Capture::default();
        let sink = capture
            .clone()
            .decorate(Filter::new(CustomFilter::predicate(|r| {
                !r.message().contains("secret")
            })));

        sink.write(&Record::new(Level::Info, "public")).unwrap();
        sink.write(&Record::new(Level::Info, "secret token")).unwrap();
        assert_eq!(capture.messages(), vec!["public"]);
    }

    #[test]
    fn test_level_as_filter() {
        let capture = Capture::default();
        let sink = capture.clone().decorate(Filter::new(Level::Warn));
        for level in Level::ALL {
            sink.write(&Record::new(level, level.as_str())).unwrap();
        }
        assert_eq!(capture.messages(), vec!["WARN", "ERROR", "FATAL"]);
    }
}
