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
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::config::Config;
use crate::queue::MessageQueue;
use crate::record::LogRecord;
use crate::worker::Command;
use crate::worker::Worker;
use crate::writer::FileWriter;

/// A running file logging pipeline: the queue plus the worker thread draining it.
#[derive(Debug)]
pub(crate) struct Pipeline {
    queue: MessageQueue,
    control: Sender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
    trap: Arc<dyn Trap>,
}

impl Pipeline {
    /// Allocate the queue and spawn the worker, which sweeps outdated files once before its
    /// first tick.
    pub(crate) fn start(config: &Config, trap: Arc<dyn Trap>) -> Result<Pipeline, Error> {
        let queue = MessageQueue::new(config.queue_capacity);
        // control commands must never be dropped by a full record queue
        let (control, control_rx) = crossbeam_channel::unbounded();

        let writer = FileWriter::new(&config.log_dir, config.max_file_size, trap.clone());
        let worker = Worker::new(
            queue.clone(),
            writer,
            config.batch_size.max(1),
            config.tick_interval(),
            control_rx,
            trap.clone(),
        );

        let handle = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(|err| {
                Error::from_io_error(ErrorKind::Worker, "failed to spawn file worker thread", err)
            })?;

        Ok(Pipeline {
            queue,
            control,
            handle: Mutex::new(Some(handle)),
            trap,
        })
    }

    /// Queue a record without blocking. A full queue drops the record and reports it.
    pub(crate) fn enqueue(&self, record: LogRecord) -> bool {
        if self.queue.enqueue(record) {
            return true;
        }

        let err = Error::new(ErrorKind::QueueFull, "log queue is full, record dropped")
            .with_context("capacity", self.queue.capacity());
        self.trap.trap(&err);
        false
    }

    /// Wait until everything queued before the call is written.
    pub(crate) fn flush(&self) {
        let wait = {
            // hold the handle so that a concurrent release queues its shutdown after us
            let handle = self.handle();
            if handle.is_none() {
                return;
            }

            let (done, wait) = crossbeam_channel::bounded(1);
            if self.control.send(Command::Flush(done)).is_err() {
                return;
            }
            wait
        };

        // the worker acknowledges, or hangs up when it is gone
        let _ = wait.recv();
    }

    /// Write everything queued, stop the worker, and wait for it. Later calls do nothing.
    pub(crate) fn release(&self) {
        let Some(handle) = self.handle().take() else {
            return;
        };

        let _ = self.control.send(Command::Shutdown);
        if handle.join().is_err() {
            let err = Error::new(ErrorKind::Worker, "file worker thread panicked");
            self.trap.trap(&err);
        }
    }

    pub(crate) fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    fn handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::level::Level;

    #[derive(Debug, Default)]
    struct CollectTrap(Mutex<Vec<ErrorKind>>);

    impl Trap for CollectTrap {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.kind());
        }
    }

    fn config(base: &std::path::Path) -> Config {
        let mut config = Config::new(base);
        // keep ticks out of the way
        config.flush_interval = Duration::from_secs(3600);
        config
    }

    fn total_lines(config: &Config) -> usize {
        fs::read_dir(config.log_dir())
            .map(|dir| {
                dir.flatten()
                    .map(|entry| fs::read_to_string(entry.path()).unwrap().lines().count())
                    .sum()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_release_writes_everything_queued() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path());
        let pipeline = Pipeline::start(&config, Arc::new(CollectTrap::default())).unwrap();

        for i in 0..123 {
            assert!(pipeline.enqueue(LogRecord::new(Level::Info, "", "", &format!("{i}"))));
        }
        pipeline.release();
        assert_eq!(total_lines(&config), 123);
        assert!(pipeline.queue().is_empty());

        // a second release is a no-op
        pipeline.release();
        assert_eq!(total_lines(&config), 123);
    }

    #[test]
    fn test_flush_waits_for_the_worker() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path());
        let pipeline = Pipeline::start(&config, Arc::new(CollectTrap::default())).unwrap();

        for i in 0..30 {
            pipeline.enqueue(LogRecord::new(Level::Debug, "", "", &format!("{i}")));
        }
        pipeline.flush();
        assert_eq!(total_lines(&config), 30);

        pipeline.release();
        // flushing a released pipeline returns immediately
        pipeline.flush();
    }

    #[test]
    fn test_zero_flush_interval_still_ticks_and_releases() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config(temp_dir.path());
        config.flush_interval = Duration::ZERO;
        let pipeline = Pipeline::start(&config, Arc::new(CollectTrap::default())).unwrap();

        for i in 0..5 {
            pipeline.enqueue(LogRecord::new(Level::Info, "", "", &format!("{i}")));
        }
        let mut waited = Duration::ZERO;
        while !pipeline.queue().is_empty() && waited < Duration::from_secs(10) {
            std::thread::sleep(Duration::from_millis(5));
            waited += Duration::from_millis(5);
        }
        assert!(pipeline.queue().is_empty());

        pipeline.release();
        assert_eq!(total_lines(&config), 5);
    }

    #[test]
    fn test_full_queue_reports_and_drops() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config(temp_dir.path());
        config.queue_capacity = 4;
        let trap = Arc::new(CollectTrap::default());
        let pipeline = Pipeline::start(&config, trap.clone()).unwrap();

        let accepted = (0..6)
            .filter(|i| pipeline.enqueue(LogRecord::new(Level::Warn, "", "", &format!("{i}"))))
            .count();
        assert_eq!(accepted, 4);
        assert_eq!(
            *trap.0.lock().unwrap(),
            vec![ErrorKind::QueueFull, ErrorKind::QueueFull]
        );

        drop(pipeline);
        assert_eq!(total_lines(&config), 4);
    }
}
