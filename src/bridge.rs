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

//! Bridge the [`log`] crate facade into a [`Sink`].

use crate::Error;
use crate::ErrorKind;
use crate::Sink;
use crate::level::Level;

impl log::Log for Sink {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.min_level().test(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        if !self.min_level().test(level) {
            return;
        }

        let message = match record.args().as_str() {
            Some(message) => message.to_string(),
            None => record.args().to_string(),
        };
        Sink::log(self, level, Some(record.target()), None, &message);
    }

    fn flush(&self) {
        Sink::flush(self);
    }
}

/// Install `sink` as the global logger of the [`log`] crate.
///
/// The sink lives until the process ends; the returned reference is how the host signals
/// shutdown to it. The `log` target of each record becomes its tag.
///
/// # Errors
///
/// Return an error if a global logger was already set.
///
/// # Examples
///
/// ```
/// use daysink::LevelFilter;
/// use daysink::SinkBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = SinkBuilder::new(dir.path())
///     .min_level(LevelFilter::Info)
///     .build();
/// let sink = daysink::bridge::setup_log_crate(sink).unwrap();
///
/// log::info!("routed through the sink");
/// sink.on_host_shutdown();
/// ```
pub fn setup_log_crate(sink: Sink) -> Result<&'static Sink, Error> {
    let sink: &'static Sink = Box::leak(Box::new(sink));
    log::set_logger(sink).map_err(|err| {
        Error::new(ErrorKind::Config, "failed to set global logger").with_source(err)
    })?;
    // the sink filters by itself, and its level can change at runtime
    log::set_max_level(log::LevelFilter::Trace);
    Ok(sink)
}
