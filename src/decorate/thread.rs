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
use crate::decorate::thread_label;
use crate::record::Record;

/// Prepend the producing thread to the message: `[<thread>] <message>`.
///
/// Named threads are shown by name, others by their id.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTag;

impl Transform for ThreadTag {
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
        let message = format!("[{}] {}", thread_label(record), record.message());
        Ok(Some(Cow::Owned(record.with_message(message))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_named_thread() {
        let handle = std::thread::Builder::new()
            .name("ingest".to_string())
            .spawn(|| Record::new(Level::Info, "batch done"))
            .unwrap();
        let record = handle.join().unwrap();
        let out = ThreadTag.transform(&record).unwrap().unwrap();
        assert_eq!(out.message(), "[ingest] batch done");
    }
}
