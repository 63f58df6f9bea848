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
use std::fmt::Write;

use crate::Error;
use crate::decorate::Transform;
use crate::decorate::thread_label;
use crate::record::Record;

/// Replace the message with a rendered template.
///
/// Recognized placeholders:
///
/// | Placeholder  | Value                                          |
/// |--------------|------------------------------------------------|
/// | `{level}`    | `DEBUG`, `INFO`, `WARN`, `ERROR` or `FATAL`    |
/// | `{message}`  | the incoming message                           |
/// | `{file}`     | the source file, empty if unknown              |
/// | `{line}`     | the source line, empty if unknown              |
/// | `{function}` | the enclosing function, empty if unknown       |
/// | `{time}`     | the record's creation time in Unix seconds     |
/// | `{thread}`   | the producing thread's name, or its id         |
///
/// Unknown placeholders are kept verbatim. The template is scanned once, so placeholders that
/// appear inside substituted values are not expanded again.
///
/// # Examples
///
/// ```
/// use logpipe::decorate::Format;
/// use logpipe::decorate::Transform;
/// use logpipe::record::Level;
/// use logpipe::record::Record;
///
/// let format = Format::new("[{level}] {message}");
/// let record = Record::new(Level::Warn, "low disk");
/// let out = format.transform(&record).unwrap().unwrap();
/// assert_eq!(out.message(), "[WARN] low disk");
/// ```
#[derive(Debug, Clone)]
pub struct Format {
    template: String,
}

impl Format {
    /// Create a decorator rendering `template`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the template for `record`.
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message().len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };

            let placeholder = &tail[..=end];
            if !write_placeholder(&mut out, &placeholder[1..end], record) {
                out.push_str(placeholder);
            }
            rest = &tail[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

fn write_placeholder(out: &mut String, name: &str, record: &Record) -> bool {
    match name {
        "level" => out.push_str(record.level().as_str()),
        "message" => out.push_str(record.message()),
        "file" => out.push_str(record.file().unwrap_or_default()),
        "line" => {
            if let Some(line) = record.line() {
                let _ = write!(out, "{line}");
            }
        }
        "function" => out.push_str(record.function().unwrap_or_default()),
        "time" => {
            let _ = write!(out, "{}", record.time().as_second());
        }
        "thread" => out.push_str(&thread_label(record)),
        _ => return false,
    }
    true
}

impl Transform for Format {
    fn transform<'a>(&self, record: &'a Record) -> Result<Option<Cow<'a, Record>>, Error> {
        Ok(Some(Cow::Owned(record.with_message(self.render(record)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use crate::record::Origin;

    fn record() -> Record {
        Record::builder()
            .level(Level::Error)
            .message("disk {level} full")
            .origin(Some(Origin::new("src/io.rs", 42).with_function("flush")))
            .time(jiff::Timestamp::from_second(1_700_000_000).unwrap())
            .build()
    }

    #[test]
    fn test_all_placeholders() {
        let format = Format::new("{time} {level} {file}:{line} {function} - {message}");
        assert_eq!(
            format.render(&record()),
            "1700000000 ERROR src/io.rs:42 flush - disk {level} full"
        );
    }

    #[test]
    fn test_thread_placeholder() {
        let handle = std::thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(|| Format::new("<{thread}>").render(&Record::new(Level::Info, "")))
            .unwrap();
        assert_eq!(handle.join().unwrap(), "<worker-7>");
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders() {
        let format = Format::new("{nope} {message} {oops");
        assert_eq!(format.render(&record()), "{nope} disk {level} full {oops");

        let no_origin = Record::new(Level::Info, "x");
        assert_eq!(Format::new("[{file}:{line}]").render(&no_origin), "[:]");
    }
}
