//! Daily file writer with repeat collapsing
//!
//! Writes to `<directory>/<prefix><YYYY-MM-DD><suffix>`, where the date is the
//! current UTC day. When the day changes the old file is closed and the new one
//! opened. Opening a file that already exists appends a `======` separator line
//! first.
//!
//! With repeat collapsing on, consecutive lines whose payload (the text after
//! the first `]: `) is identical are counted instead of written. The next
//! different line is preceded by a summary of the repeated one:
//!
//! ```text
//! 2024-01-01 10:00:00.000 (db) [WARN]: retrying
//! 2024-01-01 10:00:03.000 (db) [WARN]: retrying (repeated 2 times over 2s)
//! 2024-01-01 10:00:04.000 (db) [INFO]: connected
//! ```

use crate::core::clock::{system_clock, Clock};
use crate::core::{LogWriter, LoggerError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Written once when appending to a file left over from an earlier run.
pub const SEPARATOR: &[u8] = b"======\n";

/// Marks the end of the line prefix; what follows is the payload.
const PAYLOAD_DELIMITER: &[u8] = b"]: ";

struct OpenFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

#[derive(Default)]
struct RepeatTracker {
    last_line: Option<Vec<u8>>,
    last_payload: Vec<u8>,
    count: u64,
    first_repeat: Option<DateTime<Utc>>,
}

fn payload(line: &[u8]) -> Option<&[u8]> {
    line.windows(PAYLOAD_DELIMITER.len())
        .position(|window| window == PAYLOAD_DELIMITER)
        .map(|at| &line[at + PAYLOAD_DELIMITER.len()..])
}

impl RepeatTracker {
    /// What to write for `line`, or `None` if it repeats the previous payload.
    fn observe<'a>(&mut self, line: &'a [u8], now: DateTime<Utc>) -> Option<Cow<'a, [u8]>> {
        let Some(payload) = payload(line) else {
            return Some(Cow::Borrowed(line));
        };

        let Some(last_line) = self.last_line.as_ref() else {
            self.remember(line, payload);
            return Some(Cow::Borrowed(line));
        };

        if payload == self.last_payload.as_slice() {
            if self.count == 0 {
                self.first_repeat = Some(now);
            }
            self.count += 1;
            return None;
        }

        if self.count == 0 {
            self.remember(line, payload);
            return Some(Cow::Borrowed(line));
        }

        let elapsed = self
            .first_repeat
            .map(|start| (now - start).to_std().unwrap_or_default())
            .unwrap_or_default();
        let previous = last_line.strip_suffix(b"\n").unwrap_or(last_line);

        let mut out = Vec::with_capacity(previous.len() + line.len() + 48);
        out.extend_from_slice(previous);
        out.extend_from_slice(
            format!(" (repeated {} times over {:?})\n", self.count, elapsed).as_bytes(),
        );
        out.extend_from_slice(line);

        self.remember(line, payload);
        Some(Cow::Owned(out))
    }

    fn remember(&mut self, line: &[u8], payload: &[u8]) {
        self.last_line = Some(line.to_vec());
        self.last_payload = payload.to_vec();
        self.count = 0;
        self.first_repeat = None;
    }
}

#[derive(Default)]
struct FileState {
    current: Option<OpenFile>,
    repeats: RepeatTracker,
}

/// Log writer producing one file per UTC day.
///
/// # Example
///
/// ```no_run
/// use fanlog::writers::DailyFileWriter;
///
/// let writer = DailyFileWriter::new("/var/log/app", "service-", ".log", true).unwrap();
/// ```
pub struct DailyFileWriter {
    directory: PathBuf,
    prefix: String,
    suffix: String,
    skip_repeating: bool,
    clock: Arc<dyn Clock>,
    state: Mutex<FileState>,
}

impl DailyFileWriter {
    /// Create the writer, creating `directory` if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new(
        directory: impl AsRef<Path>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        skip_repeating: bool,
    ) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", directory.display()),
                e,
            )
        })?;

        Ok(Self {
            directory,
            prefix: prefix.into(),
            suffix: suffix.into(),
            skip_repeating,
            clock: system_clock(),
            state: Mutex::new(FileState::default()),
        })
    }

    /// Use `clock` for the current day and repeat timing.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file that receives writes made at `at`.
    pub fn path_for(&self, at: DateTime<Utc>) -> PathBuf {
        self.directory.join(format!(
            "{}{}{}",
            self.prefix,
            at.format("%Y-%m-%d"),
            self.suffix
        ))
    }

    pub fn current_path(&self) -> PathBuf {
        self.path_for(self.clock.now())
    }

    fn open(path: &Path) -> Result<OpenFile> {
        let existed = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_writer(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let mut writer = BufWriter::new(file);
        if existed {
            writer.write_all(SEPARATOR).map_err(|e| {
                LoggerError::file_writer(
                    path.display().to_string(),
                    format!("Failed to write separator: {}", e),
                )
            })?;
        }

        Ok(OpenFile {
            path: path.to_path_buf(),
            writer,
        })
    }
}

impl LogWriter for DailyFileWriter {
    fn write(&self, bytes: &[u8]) -> Result<()> {
        let now = self.clock.now();
        let path = self.path_for(now);

        let mut state = self.state.lock();
        let FileState { current, repeats } = &mut *state;

        if current.as_ref().map_or(true, |open| open.path != path) {
            if let Some(mut previous) = current.take() {
                previous.writer.flush()?;
            }
            *current = Some(Self::open(&path)?);
        }

        let line = if self.skip_repeating {
            match repeats.observe(bytes, now) {
                Some(line) => line,
                None => return Ok(()),
            }
        } else {
            Cow::Borrowed(bytes)
        };

        if let Some(open) = current.as_mut() {
            open.writer.write_all(&line)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(open) = self.state.lock().current.as_mut() {
            open.writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "daily_file"
    }
}

impl Drop for DailyFileWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
