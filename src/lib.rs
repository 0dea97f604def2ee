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

//! Daysink is an in-process log sink for long-running host applications.
//!
//! # Overview
//!
//! Every emitted record that passes the minimum level is mirrored to a console right away. When
//! file logging runs, records are also queued in a bounded in-memory queue and written by one
//! background thread, in batches of at most 20 every 5 seconds, to one file per calendar day
//! under `<base_dir>/logger/`:
//!
//! ```text
//! logger/
//! ├── 20240810.log
//! ├── 20240811_1723387497172.log   # rotated once it grew past 10 MiB
//! └── 20240811.log
//! ```
//!
//! Files older than yesterday are deleted when the pipeline starts. Releasing the sink writes
//! everything still queued before it returns.
//!
//! # Examples
//!
//! ```
//! use daysink::LevelFilter;
//! use daysink::SinkBuilder;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let sink = SinkBuilder::new(dir.path())
//!     .min_level(LevelFilter::Debug)
//!     .file_logging(true)
//!     .build();
//!
//! sink.info(Some("Network"), "connected");
//! sink.log(daysink::Level::Warn, None, Some("disk"), "almost full");
//!
//! // the host is going away
//! sink.on_host_shutdown();
//! assert_eq!(sink.state(), daysink::PipelineState::Released);
//! ```
//!
//! The [`log`] crate facade can be routed into a sink with [`bridge::setup_log_crate`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod console;
pub mod retention;

mod clock;
mod config;
mod error;
mod level;
mod lifecycle;
mod pipeline;
mod queue;
mod record;
mod sink;
mod trap;
mod worker;
mod writer;

pub use self::config::Config;
pub use self::config::LOG_DIR_NAME;
pub use self::config::LOG_FILE_SUFFIX;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::level::Level;
pub use self::level::LevelFilter;
pub use self::lifecycle::HostLifecycle;
pub use self::queue::MessageQueue;
pub use self::record::DEFAULT_TAG;
pub use self::record::LogRecord;
pub use self::record::format_message;
pub use self::sink::PipelineState;
pub use self::sink::Sink;
pub use self::sink::SinkBuilder;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
pub use self::writer::FileWriter;
