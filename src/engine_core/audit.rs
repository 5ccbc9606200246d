// Copyright 2026 BadCompany
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

//! Append-only guard log.
//!
//! Every inbound request and every outbound response or error is recorded as
//! one line: `[<timestamp>] <label>: <payload>`. The file is opened in append
//! mode and held under an exclusive advisory lock for the session's lifetime,
//! so a second guard pointed at the same file fails fast instead of
//! interleaving lines.

use fs2::FileExt;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct AuditLogger {
    file: File,
    path: PathBuf,
}

impl AuditLogger {
    /// Open (creating parents as needed) the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.try_lock_exclusive()?;
        debug!("Guard log opened at {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single entry. A failed write is reported through tracing and
    /// never interrupts the session.
    pub fn log(&mut self, label: &str, payload: &str) {
        let line = format!(
            "[{}] {}: {}\n",
            crate::utils::time::timestamp(),
            label,
            payload.trim_end()
        );
        if let Err(e) = self
            .file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
        {
            warn!("Failed to write guard log {}: {}", self.path.display(), e);
        }
    }

    /// Append an entry whose payload is the compact JSON form of `value`.
    pub fn log_json<T: Serialize>(&mut self, label: &str, value: &T) {
        let payload = serde_json::to_string(value)
            .unwrap_or_else(|e| format!("<unserializable: {}>", e));
        self.log(label, &payload);
    }
}

impl Drop for AuditLogger {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
