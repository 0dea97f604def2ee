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
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::clock::Clock;
use crate::config::LOG_FILE_SUFFIX;

/// Appends batches to the log file of a given day, rotating it once it grows too large.
///
/// The writer keeps no file handle between appends; each append opens the file, writes at its
/// end, and closes it again.
#[derive(Debug)]
pub struct FileWriter {
    log_dir: PathBuf,
    max_file_size: u64,
    clock: Clock,
    trap: Arc<dyn Trap>,
}

impl FileWriter {
    pub fn new(log_dir: impl Into<PathBuf>, max_file_size: u64, trap: Arc<dyn Trap>) -> Self {
        Self {
            log_dir: log_dir.into(),
            max_file_size,
            clock: Clock::DefaultClock,
            trap,
        }
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The active file of the day `date_key`.
    pub fn current_filename(&self, date_key: &str) -> PathBuf {
        self.log_dir.join(format!("{date_key}{LOG_FILE_SUFFIX}"))
    }

    fn rotated_filename(&self, date_key: &str, millis: i64) -> PathBuf {
        self.log_dir
            .join(format!("{date_key}_{millis}{LOG_FILE_SUFFIX}"))
    }

    /// Append `content` to the log file of the day `date_key`.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * The log directory or the log file cannot be created ([`ErrorKind::CreateDirectory`],
    ///   [`ErrorKind::CreateFile`]); nothing is written.
    /// * The file cannot be opened or written ([`ErrorKind::Write`]); the content is lost.
    ///
    /// A failed rotation is not an error of the append: it is reported to the trap and the
    /// content is written to the oversized file.
    pub fn append(&self, date_key: &str, content: &[u8]) -> Result<(), Error> {
        let filepath = self.current_filename(date_key);

        if self.should_rollover_on_size(&filepath) {
            if let Err(err) = self.rotate(date_key, &filepath) {
                self.trap.trap(&err);
            }
        }

        let mut file = if fs::exists(&filepath).is_ok_and(|ok| ok) {
            OpenOptions::new()
                .write(true)
                .open(&filepath)
                .map_err(|err| {
                    Error::from_io_error(ErrorKind::Write, "failed to open log file", err)
                        .with_context("path", filepath.display())
                })?
        } else {
            self.create_log_file(&filepath)?
        };

        write_at_end(&mut file, content).map_err(|err| {
            Error::from_io_error(ErrorKind::Write, "failed to write log batch", err)
                .with_context("path", filepath.display())
                .with_context("bytes", content.len())
        })
        // `file` is closed here on every path
    }

    fn should_rollover_on_size(&self, filepath: &Path) -> bool {
        fs::metadata(filepath).is_ok_and(|meta| meta.is_file() && meta.len() > self.max_file_size)
    }

    fn rotate(&self, date_key: &str, current: &Path) -> Result<(), Error> {
        let millis = self.clock.now().timestamp().as_millisecond();
        let archive = self.rotated_filename(date_key, millis);
        fs::rename(current, &archive).map_err(|err| {
            Error::from_io_error(ErrorKind::Rotate, "failed to rotate log file", err)
                .with_context("from", current.display())
                .with_context("to", archive.display())
        })
    }

    fn create_log_file(&self, filepath: &Path) -> Result<File, Error> {
        fs::create_dir_all(&self.log_dir).map_err(|err| {
            Error::from_io_error(
                ErrorKind::CreateDirectory,
                "failed to create log directory",
                err,
            )
            .with_context("path", self.log_dir.display())
        })?;

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(filepath)
            .map_err(|err| {
                Error::from_io_error(ErrorKind::CreateFile, "failed to create log file", err)
                    .with_context("path", filepath.display())
            })
    }
}

// Extend the file by exactly `content.len()` bytes starting at its current length.
fn write_at_end(file: &mut File, content: &[u8]) -> std::io::Result<()> {
    let offset = file.metadata()?.len();
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(content)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use jiff::Zoned;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;
    use crate::clock::ManualClock;

    #[derive(Debug, Default)]
    struct CollectTrap(Mutex<Vec<ErrorKind>>);

    impl Trap for CollectTrap {
        fn trap(&self, err: &Error) {
            self.0.lock().unwrap().push(err.kind());
        }
    }

    impl CollectTrap {
        fn kinds(&self) -> Vec<ErrorKind> {
            self.0.lock().unwrap().clone()
        }
    }

    fn writer(dir: &Path, max_file_size: u64) -> (FileWriter, Arc<CollectTrap>) {
        let trap = Arc::new(CollectTrap::default());
        let now = Zoned::from_str("2024-08-10T17:12:52.250+08[+08]").unwrap();
        let writer = FileWriter::new(dir.join("logger"), max_file_size, trap.clone())
            .clock(Clock::ManualClock(ManualClock::new(now)));
        (writer, trap)
    }

    fn list_files(dir: &Path) -> Vec<String> {
        let mut files = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        files.sort();
        files
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect()
    }

    #[test]
    fn test_append_creates_directory_and_file_lazily() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, trap) = writer(temp_dir.path(), 1024);
        assert!(!writer.log_dir().exists());

        writer.append("20240810", b"first\n").unwrap();
        writer.append("20240810", b"second\n").unwrap();

        let content = fs::read_to_string(writer.current_filename("20240810")).unwrap();
        assert_eq!(content, "first\nsecond\n");
        assert!(trap.kinds().is_empty());
    }

    #[test]
    fn test_append_extends_by_exact_content_length() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, _) = writer(temp_dir.path(), u64::MAX);

        let mut expected = 0;
        for _ in 0..32 {
            let line = generate_random_string();
            expected += line.len() as u64;
            writer.append("20240810", line.as_bytes()).unwrap();
            let len = fs::metadata(writer.current_filename("20240810"))
                .unwrap()
                .len();
            assert_eq!(len, expected);
        }
    }

    #[test]
    fn test_file_at_threshold_is_not_rotated() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, _) = writer(temp_dir.path(), 100);

        writer.append("20240810", &[b'a'; 100]).unwrap();
        writer.append("20240810", b"b").unwrap();

        assert_eq!(list_files(writer.log_dir()), vec!["20240810.log"]);
    }

    #[test]
    fn test_file_above_threshold_is_rotated() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, trap) = writer(temp_dir.path(), 100);

        let old = [b'a'; 101];
        writer.append("20240810", &old).unwrap();
        writer.append("20240810", b"fresh\n").unwrap();

        let millis = Zoned::from_str("2024-08-10T17:12:52.250+08[+08]")
            .unwrap()
            .timestamp()
            .as_millisecond();
        let rotated = format!("20240810_{millis}.log");
        assert_eq!(
            list_files(writer.log_dir()),
            vec!["20240810.log".to_string(), rotated.clone()]
        );

        let archived = fs::read(writer.log_dir().join(rotated)).unwrap();
        let current = fs::read(writer.current_filename("20240810")).unwrap();
        assert_eq!(archived, old);
        assert_eq!(current, b"fresh\n");
        assert!(trap.kinds().is_empty());
    }

    #[test]
    fn test_failed_rotation_still_writes() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, trap) = writer(temp_dir.path(), 10);

        writer.append("20240810", b"0123456789ab").unwrap();

        // occupy the archive name with a non-empty directory so that the rename fails
        let millis = Zoned::from_str("2024-08-10T17:12:52.250+08[+08]")
            .unwrap()
            .timestamp()
            .as_millisecond();
        let blocker = writer.log_dir().join(format!("20240810_{millis}.log"));
        fs::create_dir_all(blocker.join("occupied")).unwrap();

        writer.append("20240810", b"cd").unwrap();

        assert_eq!(trap.kinds(), vec![ErrorKind::Rotate]);
        let current = fs::read(writer.current_filename("20240810")).unwrap();
        assert_eq!(current, b"0123456789abcd");
    }

    #[test]
    fn test_uncreatable_directory_aborts_append() {
        let temp_dir = TempDir::new().unwrap();
        // a regular file where the log directory should be
        fs::write(temp_dir.path().join("logger"), b"not a directory").unwrap();
        let (writer, _) = writer(temp_dir.path(), 1024);

        let err = writer.append("20240810", b"lost\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CreateDirectory);
        assert_eq!(err.level(), crate::Level::Warn);
    }

    #[test]
    fn test_each_day_gets_its_own_file() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, _) = writer(temp_dir.path(), 1024);

        writer.append("20240810", b"saturday\n").unwrap();
        writer.append("20240811", b"sunday\n").unwrap();

        assert_eq!(
            list_files(writer.log_dir()),
            vec!["20240810.log", "20240811.log"]
        );
    }
}
