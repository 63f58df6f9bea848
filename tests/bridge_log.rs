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

//! Records logged through the `log` facade reach the pipeline.

use std::sync::Arc;

use logpipe::Pipeline;
use logpipe::PipelineConfig;
use logpipe::record::Level;
use logpipe::sink::Capture;

#[test]
fn test_log_facade_feeds_pipeline() {
    let capture = Capture::default();
    let pipeline = Arc::new(
        Pipeline::builder()
            .config(PipelineConfig {
                min_level: Level::Info,
                enable_timestamp: false,
                enable_color: false,
                ..PipelineConfig::default()
            })
            .sink(capture.clone())
            .build(),
    );
    pipeline.start().unwrap();
    logpipe::bridge::log::setup(pipeline.clone());
    assert!(logpipe::bridge::log::try_setup(pipeline.clone()).is_err());

    log::trace!("too quiet");
    log::debug!("still too quiet");
    log::info!("user {} signed in", 42);
    log::error!(target: "billing", "charge failed");
    log::Log::flush(log::logger());
    pipeline.stop();

    let records = capture.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message(), "user 42 signed in");
    assert_eq!(records[0].level(), Level::Info);
    assert!(records[0].file().unwrap().ends_with("bridge_log.rs"));
    assert_eq!(records[0].function(), Some("bridge_log"));
    assert_eq!(records[1].level(), Level::Error);
    assert!(capture.flushes() >= 1);
}
