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

//! A bridge to forward logs from the `log` crate to a [`Pipeline`].

use std::sync::Arc;

use crate::Pipeline;
use crate::record::Level;
use crate::record::Origin;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Debug,
        }
    }
}

/// A [`log::Log`] implementation submitting every record to a shared [`Pipeline`].
///
/// The origin carries the file and line of the `log` macro call, and the module path in place of
/// the function name.
#[derive(Debug, Clone)]
pub struct LogBridge {
    pipeline: Arc<Pipeline>,
}

impl LogBridge {
    /// Create a bridge feeding `pipeline`.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// The pipeline receiving records.
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Level::from(metadata.level()) >= self.pipeline.min_level()
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        if level < self.pipeline.min_level() {
            return;
        }

        let message = record.args().to_string();
        let file = match (record.file_static(), record.file()) {
            (Some(file), _) => Some(Origin::new(file, record.line().unwrap_or_default())),
            (None, Some(file)) => Some(Origin::new(
                file.to_string(),
                record.line().unwrap_or_default(),
            )),
            (None, None) => None,
        };
        let origin = match (file, record.module_path_static(), record.module_path()) {
            (Some(origin), Some(module), _) => Some(origin.with_function(module)),
            (Some(origin), None, Some(module)) => Some(origin.with_function(module.to_string())),
            (origin, _, _) => origin,
        };

        match origin {
            Some(origin) => self.pipeline.submit_at(level, message, origin),
            None => self.pipeline.submit(level, message),
        }
    }

    fn flush(&self) {
        self.pipeline.flush();
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] to install a [`LogBridge`] so all logs from the
/// log crate are submitted to `pipeline`.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup(pipeline: Arc<Pipeline>) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(pipeline)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// See [`try_setup`].
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup(pipeline: Arc<Pipeline>) {
    try_setup(pipeline).expect(
        "logpipe::bridge::log::setup must be called before the log crate global logger initialized",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Capture;

    #[test]
    fn test_bridge_maps_records() {
        let capture = Capture::default();
        let pipeline = Arc::new(
            Pipeline::builder()
                .config(crate::PipelineConfig {
                    min_level: Level::Info,
                    ..crate::PipelineConfig::default()
                })
                .sink(capture.clone())
                .build(),
        );
        let bridge = LogBridge::new(pipeline.clone());

        let metadata = log::Metadata::builder().level(log::Level::Trace).build();
        assert!(!log::Log::enabled(&bridge, &metadata));

        log::Log::log(
            &bridge,
            &log::Record::builder()
                .level(log::Level::Warn)
                .args(format_args!("cache miss {}", 3))
                .file_static(Some("src/cache.rs"))
                .line(Some(12))
                .module_path_static(Some("app::cache"))
                .build(),
        );
        log::Log::log(
            &bridge,
            &log::Record::builder()
                .level(log::Level::Debug)
                .args(format_args!("skipped"))
                .build(),
        );

        pipeline.start().unwrap();
        pipeline.stop();

        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message(), "cache miss 3");
        assert_eq!(records[0].level(), Level::Warn);
        assert_eq!(records[0].file(), Some("src/cache.rs"));
        assert_eq!(records[0].line(), Some(12));
        assert_eq!(records[0].function(), Some("app::cache"));
    }
}
