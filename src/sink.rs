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

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::time::Duration;

use arc_swap::ArcSwapOption;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::config::Config;
use crate::console::Console;
use crate::console::Stdout;
use crate::level::Level;
use crate::level::LevelFilter;
use crate::pipeline::Pipeline;
use crate::record::LogRecord;
use crate::trap::DefaultTrap;

/// The lifecycle of the file logging pipeline of a [`Sink`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PipelineState {
    /// File logging was never enabled.
    Uninitialized,
    /// The queue is allocated and the worker is flushing it periodically.
    Running,
    /// The queue was drained and the worker stopped. This state is final.
    Released,
}

/// An in-process log sink.
///
/// Every emitted record that passes the minimum level is mirrored to the [`Console`]. When the
/// file pipeline runs, records are also queued and written by a background thread to
/// `<base_dir>/logger/YYYYMMDD.log` in batches.
///
/// `Verbose`, `Debug` and `Info` records reach the files only while file logging is enabled;
/// `Warn` and `Error` records reach them whenever the pipeline runs.
///
/// # Examples
///
/// ```
/// use daysink::LevelFilter;
/// use daysink::SinkBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = SinkBuilder::new(dir.path())
///     .min_level(LevelFilter::All)
///     .file_logging(true)
///     .build();
///
/// sink.info(Some("Network"), "connected");
/// sink.on_host_shutdown();
/// ```
#[derive(Debug)]
pub struct Sink {
    config: Config,
    min_level: AtomicU8,
    file_logging: AtomicBool,
    host_shutdown: AtomicBool,
    state: Mutex<PipelineState>,
    pipeline: ArcSwapOption<Pipeline>,
    console: Box<dyn Console>,
    trap: Arc<dyn Trap>,
}

impl Sink {
    /// Emit a record.
    ///
    /// An absent or empty `tag` falls back to `"Logger"`; a non-empty `head` is prefixed to the
    /// message as `[ head ]`.
    pub fn log(&self, level: Level, tag: Option<&str>, head: Option<&str>, message: &str) {
        if !self.min_level().test(level) {
            return;
        }

        let record = LogRecord::new(
            level,
            tag.unwrap_or_default(),
            head.unwrap_or_default(),
            message,
        );
        self.console.write(&record);

        if level.bypasses_file_switch() || self.is_file_logging_enabled() {
            self.enqueue(record);
        }
    }

    /// Emit a `Verbose` record.
    pub fn verbose(&self, tag: Option<&str>, message: &str) {
        self.log(Level::Verbose, tag, None, message)
    }

    /// Emit a `Debug` record.
    pub fn debug(&self, tag: Option<&str>, message: &str) {
        self.log(Level::Debug, tag, None, message)
    }

    /// Emit an `Info` record.
    pub fn info(&self, tag: Option<&str>, message: &str) {
        self.log(Level::Info, tag, None, message)
    }

    /// Emit a `Warn` record.
    pub fn warn(&self, tag: Option<&str>, message: &str) {
        self.log(Level::Warn, tag, None, message)
    }

    /// Emit an `Error` record.
    pub fn error(&self, tag: Option<&str>, message: &str) {
        self.log(Level::Error, tag, None, message)
    }

    fn enqueue(&self, record: LogRecord) {
        // records emitted before initialization or after release are dropped
        if let Some(pipeline) = self.pipeline.load().as_ref() {
            pipeline.enqueue(record);
        }
    }

    /// The minimum level for a record to be emitted.
    pub fn min_level(&self) -> LevelFilter {
        LevelFilter::from_rank(self.min_level.load(Ordering::Relaxed))
    }

    /// Set the minimum level for a record to be emitted.
    pub fn set_min_level(&self, filter: LevelFilter) {
        self.min_level.store(filter.rank(), Ordering::Relaxed);
    }

    /// Emit records of every level.
    pub fn open_debug(&self) {
        self.set_min_level(LevelFilter::All);
    }

    /// Emit nothing.
    pub fn close_debug(&self) {
        self.set_min_level(LevelFilter::Off);
    }

    /// Whether records of every level are emitted.
    pub fn is_debuggable(&self) -> bool {
        self.min_level() == LevelFilter::All
    }

    /// Whether `Verbose`, `Debug` and `Info` records are queued for the files.
    pub fn is_file_logging_enabled(&self) -> bool {
        self.file_logging.load(Ordering::Acquire)
    }

    /// Queue records of every level for the files, starting the pipeline if it is not running
    /// yet. A pipeline that failed to start is retried.
    pub fn enable_file_logging(&self) {
        self.file_logging.store(true, Ordering::Release);
        // no-op unless uninitialized
        self.initialize();
    }

    /// Stop queueing `Verbose`, `Debug` and `Info` records.
    ///
    /// The pipeline keeps running: records already queued are still written, and `Warn` and
    /// `Error` records keep being queued.
    pub fn disable_file_logging(&self) {
        self.file_logging.store(false, Ordering::Release);
    }

    /// The lifecycle state of the file pipeline.
    pub fn state(&self) -> PipelineState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The directory holding the log files.
    pub fn log_dir(&self) -> &Path {
        self.config.log_dir()
    }

    /// The thresholds this sink was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start the file pipeline. Do nothing if it is running or was released.
    ///
    /// The worker first deletes log files older than yesterday, then flushes the queue every
    /// flush interval.
    pub fn initialize(&self) {
        let mut state = self.lock_state();
        if *state != PipelineState::Uninitialized {
            return;
        }

        match Pipeline::start(&self.config, self.trap.clone()) {
            Ok(pipeline) => {
                self.pipeline.store(Some(Arc::new(pipeline)));
                *state = PipelineState::Running;
            }
            Err(err) => self.trap.trap(&err),
        }
    }

    /// Wait until every record queued before the call is written.
    pub fn flush(&self) {
        if let Some(pipeline) = self.pipeline.load().as_ref() {
            pipeline.flush();
        }
    }

    /// Write every queued record, then stop the pipeline for good.
    ///
    /// On return, everything queued before the call is on disk. Records emitted afterwards are
    /// still mirrored to the console but never reach the files. Calling this again does nothing.
    pub fn release(&self) {
        let mut state = self.lock_state();
        if *state != PipelineState::Running {
            return;
        }

        // stop accepting first, so that the final flush sees a settled queue
        if let Some(pipeline) = self.pipeline.swap(None) {
            pipeline.release();
        }
        *state = PipelineState::Released;
    }

    /// Signal that the host process is terminating. Only the first call has an effect.
    pub fn on_host_shutdown(&self) {
        if self.host_shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.log(Level::Debug, None, None, "host shutdown");
        self.release();
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        self.release();
    }
}

/// A builder to configure and create a [`Sink`].
#[derive(Debug)]
pub struct SinkBuilder {
    config: Config,
    file_logging: bool,
    min_level: LevelFilter,
    console: Box<dyn Console>,
    trap: Box<dyn Trap>,
    deferred: Vec<Error>,
}

impl SinkBuilder {
    /// Create a sink builder writing into `<base_dir>/logger/`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            config: Config::new(base_dir),
            file_logging: false,
            min_level: LevelFilter::default(),
            console: Box::new(Stdout::default()),
            trap: Box::new(DefaultTrap::default()),
            deferred: vec![],
        }
    }

    /// Whether records of every level are written to file from the start.
    ///
    /// Default to `false`.
    pub fn file_logging(mut self, enabled: bool) -> Self {
        self.file_logging = enabled;
        self
    }

    /// Set the minimum level for a record to be emitted.
    ///
    /// Default to [`LevelFilter::Off`].
    pub fn min_level(mut self, filter: LevelFilter) -> Self {
        self.min_level = filter;
        self
    }

    /// Read the minimum level from the environment variable `key`, if set.
    ///
    /// A value that does not parse is reported to the trap on [`build`](Self::build) and the
    /// level is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use daysink::SinkBuilder;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let sink = SinkBuilder::new(dir.path())
    ///     .min_level_from_env("MY_APP_LOG_LEVEL")
    ///     .build();
    /// ```
    pub fn min_level_from_env(mut self, key: &str) -> Self {
        let Ok(value) = std::env::var(key) else {
            return self;
        };
        match value.parse::<LevelFilter>() {
            Ok(filter) => self.min_level = filter,
            Err(err) => self.deferred.push(err.with_context("env", key)),
        }
        self
    }

    /// Set the console mirror.
    ///
    /// Default to [`Stdout`].
    pub fn console(mut self, console: impl Into<Box<dyn Console>>) -> Self {
        self.console = console.into();
        self
    }

    /// Set the trap for handling internal errors.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set how many records the queue holds before new ones are dropped.
    ///
    /// Default to 10,000.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set how many records one flush tick writes at most.
    ///
    /// Default to 20.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the period of the flush tick.
    ///
    /// Default to 5 seconds. Periods below [`Config::MIN_FLUSH_INTERVAL`] are raised to it.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set the size in bytes above which a log file is rotated.
    ///
    /// Default to 10 MiB.
    pub fn max_file_size(mut self, n: u64) -> Self {
        self.config.max_file_size = n;
        self
    }

    /// Override the name of the worker thread.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Build the [`Sink`].
    ///
    /// The log directory is created right away; a failure is reported to the trap and retried
    /// on the first write. When file logging is enabled, the pipeline is started.
    pub fn build(self) -> Sink {
        let Self {
            config,
            file_logging,
            min_level,
            console,
            trap,
            deferred,
        } = self;

        let trap: Arc<dyn Trap> = Arc::from(trap);
        for err in &deferred {
            trap.trap(err);
        }

        if let Err(err) = fs::create_dir_all(config.log_dir()) {
            let err = Error::from_io_error(
                ErrorKind::CreateDirectory,
                "failed to create log directory",
                err,
            )
            .with_context("path", config.log_dir().display());
            trap.trap(&err);
        }

        let sink = Sink {
            config,
            min_level: AtomicU8::new(min_level.rank()),
            file_logging: AtomicBool::new(file_logging),
            host_shutdown: AtomicBool::new(false),
            state: Mutex::new(PipelineState::Uninitialized),
            pipeline: ArcSwapOption::empty(),
            console,
            trap,
        };
        if file_logging {
            sink.initialize();
        }
        sink
    }
}

impl From<SinkBuilder> for Sink {
    fn from(builder: SinkBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::console::Testing;

    #[test]
    fn test_enable_retries_a_pipeline_that_never_started() {
        let temp_dir = TempDir::new().unwrap();
        let sink = SinkBuilder::new(temp_dir.path())
            .console(Testing::default())
            .build();

        // as left behind by a build with file logging on whose worker failed to spawn
        sink.file_logging.store(true, Ordering::Release);
        assert_eq!(sink.state(), PipelineState::Uninitialized);

        sink.enable_file_logging();
        assert_eq!(sink.state(), PipelineState::Running);
        assert!(sink.is_file_logging_enabled());

        sink.enable_file_logging();
        assert_eq!(sink.state(), PipelineState::Running);
        sink.release();
    }
}
