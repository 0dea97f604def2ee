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

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the log directory created under the base directory.
pub const LOG_DIR_NAME: &str = "logger";

/// Suffix of every log file.
pub const LOG_FILE_SUFFIX: &str = ".log";

/// Thresholds and locations of the file logging pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) log_dir: PathBuf,
    pub(crate) queue_capacity: usize,
    pub(crate) batch_size: usize,
    pub(crate) flush_interval: Duration,
    pub(crate) max_file_size: u64,
    pub(crate) thread_name: String,
}

impl Config {
    /// Records held in the queue before new ones are dropped.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
    /// Records written per flush tick.
    pub const DEFAULT_BATCH_SIZE: usize = 20;
    /// Period of the flush tick.
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
    /// The shortest flush tick; shorter intervals are raised to it.
    pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);
    /// A log file larger than this is rotated on the next append.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Create a config writing into `<base_dir>/logger/` with default thresholds.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Config {
            log_dir: base_dir.as_ref().join(LOG_DIR_NAME),
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            flush_interval: Self::DEFAULT_FLUSH_INTERVAL,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            thread_name: "daysink-file".to_string(),
        }
    }

    /// The directory holding the log files.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// The batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The flush interval.
    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    // a zero period would make the ticker fire on every select and spin the worker
    pub(crate) fn tick_interval(&self) -> Duration {
        self.flush_interval.max(Self::MIN_FLUSH_INTERVAL)
    }

    /// The rotation threshold in bytes.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("/data/app");
        assert_eq!(config.log_dir(), Path::new("/data/app/logger"));
        assert_eq!(config.queue_capacity(), 10_000);
        assert_eq!(config.batch_size(), 20);
        assert_eq!(config.flush_interval(), Duration::from_secs(5));
        assert_eq!(config.max_file_size(), 10_485_760);
    }

    #[test]
    fn test_tick_interval_has_a_floor() {
        let mut config = Config::new("/data/app");
        assert_eq!(config.tick_interval(), Duration::from_secs(5));

        config.flush_interval = Duration::ZERO;
        assert_eq!(config.tick_interval(), Config::MIN_FLUSH_INTERVAL);
    }
}
