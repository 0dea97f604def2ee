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

//! Log levels and the minimum level filter.

use std::fmt;
use std::str::FromStr;

use crate::Error;
use crate::ErrorKind;

/// The priority of a log record.
///
/// Levels are ordered by rank: `Verbose < Debug < Info < Warn < Error`.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates very low priority, often extremely verbose, information.
    Verbose = 1,
    /// Designates lower priority information.
    Debug = 2,
    /// Designates useful information.
    Info = 3,
    /// Designates hazardous situations.
    Warn = 4,
    /// Designates very serious errors.
    Error = 5,
}

impl Level {
    /// Return the numeric rank of the `Level`.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Return the single-letter priority used in log lines.
    pub fn letter(&self) -> char {
        match self {
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warn => 'W',
            Level::Error => 'E',
        }
    }

    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Verbose => "VERBOSE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// Whether records of this level are written to file even when file logging is disabled.
    pub(crate) fn bypasses_file_switch(&self) -> bool {
        *self >= Level::Warn
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (name, level) in [
            ("verbose", Level::Verbose),
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warn", Level::Warn),
            ("error", Level::Error),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(Error::new(ErrorKind::Config, format!("malformed level: {s:?}")))
    }
}

/// The minimum level a record must reach to be emitted.
///
/// The default is [`LevelFilter::Off`]: nothing is emitted until the host opts in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum LevelFilter {
    /// Enables all levels.
    All,
    /// Enables `Verbose` and above.
    Verbose,
    /// Enables `Debug` and above.
    Debug,
    /// Enables `Info` and above.
    Info,
    /// Enables `Warn` and above.
    Warn,
    /// Enables `Error` only.
    Error,
    /// Disables all levels.
    #[default]
    Off,
}

impl LevelFilter {
    /// Checks the given level if satisfies the filter condition.
    ///
    /// # Examples
    ///
    /// ```
    /// use daysink::Level;
    /// use daysink::LevelFilter;
    ///
    /// let filter = LevelFilter::Info;
    ///
    /// assert!(!filter.test(Level::Debug));
    /// assert!(filter.test(Level::Info));
    /// assert!(filter.test(Level::Error));
    /// assert!(!LevelFilter::Off.test(Level::Error));
    /// ```
    pub fn test(&self, level: Level) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Off => false,
            filter => level.rank() >= filter.rank(),
        }
    }

    /// Return the numeric rank; `All` is 0 and `Off` is greater than every level.
    pub fn rank(&self) -> u8 {
        match self {
            LevelFilter::All => 0,
            LevelFilter::Verbose => Level::Verbose.rank(),
            LevelFilter::Debug => Level::Debug.rank(),
            LevelFilter::Info => Level::Info.rank(),
            LevelFilter::Warn => Level::Warn.rank(),
            LevelFilter::Error => Level::Error.rank(),
            LevelFilter::Off => Level::Error.rank() + 1,
        }
    }

    pub(crate) fn from_rank(rank: u8) -> LevelFilter {
        match rank {
            0 => LevelFilter::All,
            1 => LevelFilter::Verbose,
            2 => LevelFilter::Debug,
            3 => LevelFilter::Info,
            4 => LevelFilter::Warn,
            5 => LevelFilter::Error,
            _ => LevelFilter::Off,
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        LevelFilter::from_rank(level.rank())
    }
}

impl FromStr for LevelFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<LevelFilter, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(LevelFilter::All);
        }
        if s.eq_ignore_ascii_case("off") {
            return Ok(LevelFilter::Off);
        }
        Level::from_str(s).map(LevelFilter::from)
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Verbose,
        }
    }
}

impl From<LevelFilter> for log::LevelFilter {
    fn from(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::All | LevelFilter::Verbose => log::LevelFilter::Trace,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Off => log::LevelFilter::Off,
        }
    }
}
