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
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::select;

use crate::Trap;
use crate::clock::Clock;
use crate::clock::date_key;
use crate::queue::MessageQueue;
use crate::retention;
use crate::writer::FileWriter;

pub(crate) enum Command {
    /// Write everything queued so far, then acknowledge.
    Flush(Sender<()>),
    /// Write everything queued so far, then stop.
    Shutdown,
}

/// The single thread doing all file I/O of a pipeline.
pub(crate) struct Worker {
    queue: MessageQueue,
    writer: FileWriter,
    batch_size: usize,
    flush_interval: Duration,
    control: Receiver<Command>,
    clock: Clock,
    trap: Arc<dyn Trap>,
}

impl Worker {
    pub(crate) fn new(
        queue: MessageQueue,
        writer: FileWriter,
        batch_size: usize,
        flush_interval: Duration,
        control: Receiver<Command>,
        trap: Arc<dyn Trap>,
    ) -> Self {
        Self {
            queue,
            writer,
            batch_size,
            flush_interval,
            control,
            clock: Clock::DefaultClock,
            trap,
        }
    }

    pub(crate) fn run(self) {
        retention::sweep(self.writer.log_dir(), &self.clock.now(), self.trap.as_ref());

        let ticker = crossbeam_channel::tick(self.flush_interval);
        loop {
            select! {
                recv(ticker) -> _ => {
                    self.flush_batch();
                }
                recv(self.control) -> command => match command {
                    Ok(Command::Flush(done)) => {
                        self.flush_pending();
                        let _ = done.send(());
                    }
                    // a dropped controller means shutdown as well
                    Ok(Command::Shutdown) | Err(_) => {
                        self.flush_pending();
                        break;
                    }
                },
            }
        }
    }

    /// Write at most one batch. Return the number of records taken from the queue.
    ///
    /// The batch is rendered into one buffer and handed to the writer in a single append. Every
    /// line is stamped, and the file is chosen, by the moment of the flush. A failed append loses
    /// the batch.
    pub(crate) fn flush_batch(&self) -> usize {
        let batch = self.queue.drain_up_to(self.batch_size);
        if batch.is_empty() {
            return 0;
        }

        let now = self.clock.now();
        let mut content = String::new();
        for record in &batch {
            record.write_line(&now, &mut content);
        }

        if let Err(err) = self.writer.append(&date_key(&now), content.as_bytes()) {
            self.trap.trap(&err);
        }
        batch.len()
    }

    // Drain in batches whatever is queued at call time; records arriving meanwhile wait for the
    // next tick.
    fn flush_pending(&self) {
        let mut pending = self.queue.len();
        while pending > 0 {
            let n = self.flush_batch();
            if n == 0 {
                break;
            }
            pending = pending.saturating_sub(n);
        }
    }
}
