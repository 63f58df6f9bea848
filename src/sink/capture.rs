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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::record::Record;
use crate::sink::Sink;

/// A sink that keeps every record it receives in memory.
///
/// Clones share the same storage, so a test can hand one clone to a pipeline and inspect the
/// other.
///
/// # Examples
///
/// ```
/// use logpipe::record::Level;
/// use logpipe::record::Record;
/// use logpipe::sink::Capture;
/// use logpipe::sink::Sink;
///
/// let capture = Capture::default();
/// capture.write(&Record::new(Level::Info, "hello")).unwrap();
/// assert_eq!(capture.messages(), vec!["hello"]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Capture {
    state: Arc<State>,
}

#[derive(Debug, Default)]
struct State {
    records: Mutex<Vec<Record>>,
    flushes: AtomicUsize,
    closed: AtomicBool,
}

impl Capture {
    fn records_mut(&self) -> MutexGuard<'_, Vec<Record>> {
        self.state.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A copy of every record received so far, in arrival order.
    pub fn records(&self) -> Vec<Record> {
        self.records_mut().clone()
    }

    /// The messages of every record received so far, in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.records_mut()
            .iter()
            .map(|r| r.message().to_string())
            .collect()
    }

    /// The number of records received so far.
    pub fn len(&self) -> usize {
        self.records_mut().len()
    }

    /// Whether no record has been received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times the sink was flushed.
    pub fn flushes(&self) -> usize {
        self.state.flushes.load(Ordering::SeqCst)
    }

    /// Whether the sink was closed.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

impl Sink for Capture {
    fn write(&self, record: &Record) -> Result<(), Error> {
        if self.is_closed() {
            return Err(Error::new("write to a closed capture sink"));
        }
        self.records_mut().push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        self.state.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), Error> {
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.is_closed()
    }
}
