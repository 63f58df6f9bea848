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
use std::time::Instant;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::TryRecvError;

use super::Shared;

/// The single consumer draining the queue into the dispatcher.
pub(super) struct Worker {
    shared: Arc<Shared>,
    shutdown: Receiver<()>,
}

impl Worker {
    pub(super) fn new(shared: Arc<Shared>, shutdown: Receiver<()>) -> Self {
        Self { shared, shutdown }
    }

    pub(super) fn make_thread(self) -> std::io::Result<std::thread::JoinHandle<()>> {
        std::thread::Builder::new()
            .name("logpipe-drain".to_string())
            .spawn(move || self.work())
    }

    fn work(self) {
        let mut batch = Vec::new();
        let mut last_flush = Instant::now();

        loop {
            let config = self.shared.config.load_full();
            let drained = self.shared.drain_batch(&mut batch, &config);

            if last_flush.elapsed() >= config.flush_interval() {
                self.shared.dispatcher.flush();
                last_flush = Instant::now();
            }

            let stopped = if drained == 0 {
                // nothing queued: wait, but wake up as soon as the pipeline stops
                !matches!(
                    self.shutdown.recv_timeout(config.idle_wait()),
                    Err(RecvTimeoutError::Timeout)
                )
            } else {
                !matches!(self.shutdown.try_recv(), Err(TryRecvError::Empty))
            };
            if stopped {
                break;
            }
        }
    }
}
