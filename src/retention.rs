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

//! One-shot deletion of log files older than yesterday.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use jiff::Zoned;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::clock::date_key;
use crate::clock::previous_date_key;
use crate::config::LOG_FILE_SUFFIX;

const DATE_KEY_LEN: usize = 8;

/// Delete every log file in `log_dir` not dated today or yesterday, relative to `now`.
///
/// A file is considered when its name ends with `.log` and is at least eight characters long; its
/// first eight characters are its date key. Rotated files share the date key of their day, so
/// they are kept or deleted together with it.
///
/// Each failed deletion is reported to `trap` and the sweep goes on. Return the deleted paths.
pub fn sweep(log_dir: &Path, now: &Zoned, trap: &dyn Trap) -> Vec<PathBuf> {
    let read_dir = match fs::read_dir(log_dir) {
        Ok(read_dir) => read_dir,
        // nothing was ever written
        Err(err) if err.kind() == io::ErrorKind::NotFound => return vec![],
        Err(err) => {
            let err = Error::from_io_error(ErrorKind::Delete, "failed to read log dir", err)
                .with_context("path", log_dir.display());
            trap.trap(&err);
            return vec![];
        }
    };

    let today = date_key(now);
    let yesterday = previous_date_key(now);

    let mut deleted = vec![];
    for entry in read_dir.flatten() {
        // the writer only creates regular files
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }

        let filename = entry.file_name();
        // if the filename is not a UTF-8 string, skip it.
        let Some(filename) = filename.to_str() else {
            continue;
        };
        if !is_expired(filename, &today, &yesterday) {
            continue;
        }

        let filepath = entry.path();
        match fs::remove_file(&filepath) {
            Ok(()) => deleted.push(filepath),
            Err(err) => {
                let err =
                    Error::from_io_error(ErrorKind::Delete, "failed to delete old log file", err)
                        .with_context("path", filepath.display());
                trap.trap(&err);
            }
        }
    }
    deleted
}

fn is_expired(filename: &str, today: &str, yesterday: &str) -> bool {
    if !filename.ends_with(LOG_FILE_SUFFIX) {
        return false;
    }
    let Some(file_date) = filename.get(..DATE_KEY_LEN) else {
        return false;
    };
    !file_date.starts_with(today) && !file_date.starts_with(yesterday)
}
