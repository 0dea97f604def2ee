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

//! Log record and its on-disk line format.

use std::fmt::Write;

use jiff::Timestamp;
use jiff::Zoned;

use crate::level::Level;

/// The tag used when a record is emitted without one.
pub const DEFAULT_TAG: &str = "Logger";

/// Timestamp layout of file lines and console output.
pub(crate) const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%3f";

/// A formatted log record, waiting in the queue to be written to file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    // the emission time, shown on the console; file lines carry the flush time
    time: Timestamp,
    level: Level,
    tag: String,
    // head already folded in
    message: String,
}

impl LogRecord {
    /// Create a record observed now.
    ///
    /// An empty `tag` falls back to [`DEFAULT_TAG`]; a non-empty `head` is folded into the
    /// message as `[ head ] message`.
    pub fn new(level: Level, tag: &str, head: &str, message: &str) -> Self {
        LogRecord {
            time: Timestamp::now(),
            level,
            tag: resolve_tag(tag).to_string(),
            message: format_message(head, message),
        }
    }

    /// Replace the observed time.
    pub fn with_time(mut self, time: Timestamp) -> Self {
        self.time = time;
        self
    }

    /// The observed time.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The priority of the record.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The tag of the record.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The message body, including the head segment if any.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Append this record to `buf` as one newline-terminated line stamped with `now`, the
    /// moment the batch is flushed.
    ///
    /// ```text
    /// 2024-08-10 17:12:52.123 Network/I [ connect ] handshake done
    /// ```
    pub fn write_line(&self, now: &Zoned, buf: &mut String) {
        // writing into a String cannot fail
        let _ = writeln!(
            buf,
            "{} {}/{} {}",
            now.strftime(TIME_FORMAT),
            self.tag,
            self.level.letter(),
            self.message
        );
    }
}

pub(crate) fn resolve_tag(tag: &str) -> &str {
    if tag.is_empty() { DEFAULT_TAG } else { tag }
}

/// Fold an optional head segment into the message.
pub fn format_message(head: &str, message: &str) -> String {
    if head.is_empty() {
        message.to_string()
    } else {
        format!("[ {head} ] {message}")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn zoned(s: &str) -> Zoned {
        Zoned::from_str(s).unwrap()
    }

    #[test]
    fn test_write_line_with_head() {
        let record = LogRecord::new(Level::Info, "Network", "connect", "handshake done");

        let mut buf = String::new();
        record.write_line(&zoned("2024-08-10T17:12:52.123+00[+00]"), &mut buf);
        assert_eq!(
            buf,
            "2024-08-10 17:12:52.123 Network/I [ connect ] handshake done\n"
        );
    }

    #[test]
    fn test_write_line_without_head_and_tag() {
        let record = LogRecord::new(Level::Error, "", "", "boom");

        let mut buf = String::new();
        record.write_line(&zoned("2024-01-02T03:04:05.006+00[+00]"), &mut buf);
        assert_eq!(buf, "2024-01-02 03:04:05.006 Logger/E boom\n");
    }

    #[test]
    fn test_write_line_is_stamped_with_flush_time() {
        let emitted = Timestamp::from_str("2024-08-10T23:29:58.500Z").unwrap();
        let record = LogRecord::new(Level::Debug, "T", "", "m").with_time(emitted);

        let mut buf = String::new();
        record.write_line(&zoned("2024-08-11T07:30:00+08[+08]"), &mut buf);
        assert_eq!(buf, "2024-08-11 07:30:00.000 T/D m\n");
        assert_eq!(record.time(), emitted);
    }
}
