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

//! The console mirror of emitted records.

use std::fmt;
use std::io::Write;

use jiff::tz::TimeZone;

use crate::record::LogRecord;
use crate::record::TIME_FORMAT;

/// A live console stream every emitted record is mirrored to, synchronously.
pub trait Console: fmt::Debug + Send + Sync + 'static {
    /// Print a record.
    fn write(&self, record: &LogRecord);
}

impl<T: Console> From<T> for Box<dyn Console> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A console that prints records to stdout.
///
/// Output format:
///
/// ```text
/// 2024-08-11 22:44:57.172 Network/I [ connect ] handshake done
/// 2024-08-11 22:44:57.172 Logger/W disk almost full
/// ```
///
/// With the `colored` feature, the level letter is colored.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Stdout {}

impl Console for Stdout {
    fn write(&self, record: &LogRecord) {
        let _ = writeln!(std::io::stdout(), "{}", render(record));
    }
}

/// A console that prints records to stderr.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Stderr {}

impl Console for Stderr {
    fn write(&self, record: &LogRecord) {
        let _ = writeln!(std::io::stderr(), "{}", render(record));
    }
}

/// A console whose output can be captured by a test harness (like `cargo test`), and thus is
/// suppressed unless `--nocapture` or `--show-output` is specified.
///
/// # Examples
///
/// ```
/// use daysink::console::Testing;
///
/// let console = Testing::default();
/// ```
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Testing {}

impl Console for Testing {
    fn write(&self, record: &LogRecord) {
        eprintln!("{}", render(record));
    }
}

fn render(record: &LogRecord) -> String {
    let time = record
        .time()
        .to_zoned(TimeZone::system())
        .strftime(TIME_FORMAT)
        .to_string();
    format!(
        "{time} {}/{} {}",
        record.tag(),
        level_letter(record),
        record.message()
    )
}

#[cfg(feature = "colored")]
fn level_letter(record: &LogRecord) -> impl fmt::Display {
    use colored::Color;
    use colored::ColoredString;
    use colored::Colorize;

    use crate::level::Level;

    let color = match record.level() {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Verbose => Color::Magenta,
    };
    ColoredString::from(record.level().letter().to_string()).color(color)
}

#[cfg(not(feature = "colored"))]
fn level_letter(record: &LogRecord) -> impl fmt::Display {
    record.level().letter()
}
