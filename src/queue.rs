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

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::TryRecvError;
use crossbeam_channel::TrySendError;

use crate::record::LogRecord;

/// A bounded FIFO of records shared by producers and the file worker.
///
/// Inserting never blocks: once the queue holds `capacity` records, new ones are dropped.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    sender: Sender<LogRecord>,
    receiver: Receiver<LogRecord>,
}

impl MessageQueue {
    /// Create a queue holding at most `capacity` records, and at least one.
    pub fn new(capacity: usize) -> Self {
        // a zero-capacity channel would only hand over to a waiting receiver
        let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Try to insert a record. Return `false` if the queue is full and the record was dropped.
    pub fn enqueue(&self, record: LogRecord) -> bool {
        match self.sender.try_send(record) {
            Ok(()) => true,
            // the receiver half lives in `self`, so the channel never disconnects
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Remove and return at most `n` records in insertion order, without waiting.
    pub fn drain_up_to(&self, n: usize) -> Vec<LogRecord> {
        let mut batch = Vec::with_capacity(n.min(self.len()));
        while batch.len() < n {
            match self.receiver.try_recv() {
                Ok(record) => batch.push(record),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        batch
    }

    /// The number of records waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no record is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// The maximum number of records the queue holds.
    pub fn capacity(&self) -> usize {
        // bounded channels always report a capacity
        self.sender.capacity().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::level::Level;

    fn record(i: usize) -> LogRecord {
        LogRecord::new(Level::Info, "queue", "", &format!("message {i}"))
    }

    #[test]
    fn test_drain_returns_records_in_insertion_order() {
        let queue = MessageQueue::new(100);
        for i in 0..42 {
            assert!(queue.enqueue(record(i)));
        }

        let drained = queue.drain_up_to(usize::MAX);
        let messages = drained.iter().map(LogRecord::message).collect::<Vec<_>>();
        let expected = (0..42).map(|i| format!("message {i}")).collect::<Vec<_>>();
        assert_eq!(messages, expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enqueue_beyond_capacity_drops_only_overflow() {
        let queue = MessageQueue::new(10);
        let accepted = (0..15).filter(|&i| queue.enqueue(record(i))).count();
        assert_eq!(accepted, 10);
        assert_eq!(queue.len(), 10);

        let drained = queue.drain_up_to(usize::MAX);
        let messages = drained.iter().map(LogRecord::message).collect::<Vec<_>>();
        let expected = (0..10).map(|i| format!("message {i}")).collect::<Vec<_>>();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_drain_up_to_is_bounded() {
        let queue = MessageQueue::new(64);
        for i in 0..50 {
            queue.enqueue(record(i));
        }

        assert_eq!(queue.drain_up_to(20).len(), 20);
        assert_eq!(queue.drain_up_to(20).len(), 20);
        let rest = queue.drain_up_to(20);
        assert_eq!(rest.len(), 10);
        assert_eq!(rest[0].message(), "message 40");
        assert!(queue.drain_up_to(20).is_empty());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing_within_capacity() {
        let queue = Arc::new(MessageQueue::new(4_000));
        let handles = (0..4)
            .map(|t| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..1_000 {
                        let message = format!("{t}-{i}");
                        assert!(queue.enqueue(LogRecord::new(Level::Debug, "", "", &message)));
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let drained = queue.drain_up_to(usize::MAX);
        assert_eq!(drained.len(), 4_000);
        // per-producer order is preserved
        for t in 0..4 {
            let prefix = format!("{t}-");
            let seen = drained
                .iter()
                .filter_map(|r| r.message().strip_prefix(&prefix))
                .map(|i| i.parse::<usize>().unwrap())
                .collect::<Vec<_>>();
            assert_eq!(seen, (0..1_000).collect::<Vec<_>>());
        }
    }
}
