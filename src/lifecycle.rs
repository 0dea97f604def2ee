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

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Derives a host shutdown signal from the number of live activities.
///
/// Hosts that have no direct "process is ending" event can count their top-level activities
/// (windows, sessions, scenes) and fire the signal when the last one goes away. The callback
/// runs at most once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use daysink::HostLifecycle;
/// use daysink::SinkBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = Arc::new(SinkBuilder::new(dir.path()).file_logging(true).build());
///
/// let lifecycle = {
///     let sink = sink.clone();
///     HostLifecycle::new(move || sink.on_host_shutdown())
/// };
///
/// lifecycle.activity_created();
/// lifecycle.activity_destroyed();
/// assert_eq!(sink.state(), daysink::PipelineState::Released);
/// ```
pub struct HostLifecycle {
    live: AtomicUsize,
    fired: AtomicBool,
    on_shutdown: Box<dyn Fn() + Send + Sync>,
}

impl fmt::Debug for HostLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLifecycle")
            .field("live", &self.live)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

impl HostLifecycle {
    /// Create a counter calling `on_shutdown` once the last activity is destroyed.
    pub fn new(on_shutdown: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            live: AtomicUsize::new(0),
            fired: AtomicBool::new(false),
            on_shutdown: Box::new(on_shutdown),
        }
    }

    /// Record that an activity was created.
    pub fn activity_created(&self) {
        self.live.fetch_add(1, Ordering::AcqRel);
    }

    /// Record that an activity was destroyed, firing the signal if it was the last one.
    pub fn activity_destroyed(&self) {
        let previous = self
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) && !self.fired.swap(true, Ordering::AcqRel) {
            (self.on_shutdown)();
        }
    }

    /// The number of live activities.
    pub fn live_activities(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Whether the shutdown signal fired.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
