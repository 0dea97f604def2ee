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
use std::io;

use crate::level::Level;

/// The kind of failure that happened inside the sink.
///
/// None of these are surfaced to the code that emits log records. They are reported to the
/// configured [`Trap`](crate::Trap) and the sink keeps going.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The message queue was full and the record was dropped.
    QueueFull,
    /// The log directory could not be created.
    CreateDirectory,
    /// The log file of the day could not be created.
    CreateFile,
    /// An oversized log file could not be renamed out of the way.
    Rotate,
    /// Writing a batch to the log file failed; the batch is lost.
    Write,
    /// The retention sweep could not delete an outdated log file.
    Delete,
    /// The background worker thread could not be spawned, or it panicked.
    Worker,
    /// A configuration value could not be understood.
    Config,
}

impl ErrorKind {
    /// The level at which a failure of this kind is reported.
    pub fn level(&self) -> Level {
        match self {
            ErrorKind::Rotate | ErrorKind::Write | ErrorKind::Worker => Level::Error,
            ErrorKind::QueueFull
            | ErrorKind::CreateDirectory
            | ErrorKind::CreateFile
            | ErrorKind::Delete
            | ErrorKind::Config => Level::Warn,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::QueueFull => "QueueFull",
            ErrorKind::CreateDirectory => "CreateDirectory",
            ErrorKind::CreateFile => "CreateFile",
            ErrorKind::Rotate => "Rotate",
            ErrorKind::Write => "Write",
            ErrorKind::Delete => "Delete",
            ErrorKind::Worker => "Worker",
            ErrorKind::Config => "Config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error struct of daysink.
pub struct Error {
    kind: ErrorKind,
    message: String,
    sources: Vec<anyhow::Error>,
    context: Vec<(&'static str, String)>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.sources.is_empty() {
            write!(f, ", sources: [")?;
            for (i, source) in self.sources.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{source}")?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("sources", &self.sources);
            return de.finish();
        }

        write!(f, "{} ({})", self.message, self.kind)?;
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if !self.sources.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sources:")?;
            for source in self.sources.iter() {
                writeln!(f, "   {source:#}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.sources.first().map(|v| v.as_ref())
    }
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sources: vec![],
            context: vec![],
        }
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return the level at which this error should be reported.
    pub fn level(&self) -> Level {
        self.kind.level()
    }

    /// Return the message of this error, without context and sources.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add one more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Add one more source in error.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        self.sources.push(src.into());
        self
    }

    /// Return an iterator over all sources of this error.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = &(dyn std::error::Error + 'static)> {
        self.sources.iter().map(|v| v.as_ref())
    }

    /// Construct an [`Error`] of the given kind from an [`io::Error`].
    ///
    /// The io error kind is recorded as context so that reports carry the failure class.
    pub fn from_io_error(kind: ErrorKind, message: impl Into<String>, err: io::Error) -> Error {
        Error::new(kind, message)
            .with_context("io", err.kind())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_kind_context_and_source() {
        let err = Error::from_io_error(
            ErrorKind::Write,
            "failed to write log batch",
            io::Error::new(io::ErrorKind::StorageFull, "disk full"),
        )
        .with_context("path", "/tmp/logger/20240810.log");

        let msg = err.to_string();
        assert!(msg.starts_with("failed to write log batch (Write)"), "{msg}");
        assert!(msg.contains("path: /tmp/logger/20240810.log"), "{msg}");
        assert!(msg.contains("disk full"), "{msg}");
        assert_eq!(err.level(), Level::Error);
        assert_eq!(err.sources().len(), 1);
    }

    #[test]
    fn test_error_kind_levels() {
        assert_eq!(ErrorKind::QueueFull.level(), Level::Warn);
        assert_eq!(ErrorKind::CreateDirectory.level(), Level::Warn);
        assert_eq!(ErrorKind::CreateFile.level(), Level::Warn);
        assert_eq!(ErrorKind::Delete.level(), Level::Warn);
        assert_eq!(ErrorKind::Rotate.level(), Level::Error);
        assert_eq!(ErrorKind::Write.level(), Level::Error);
    }
}
