//! Size-rotated file sink
//!
//! Files are named `basename_YYYY-M-D-H-M-S_seq.log` after their creation
//! time. `seq` restarts at 0 whenever the wall-clock second changes and
//! increments for every file created within the same second. Names that
//! already exist on disk are skipped, so neither rapid rotation nor a restart
//! within the same second reuses a file.

use crate::core::{LoggerError, Result, Sink};
use crate::util::{ensure_parent_dir, path_exists};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File sink that starts a new file once the current one reaches a size limit.
///
/// Two checks guard the limit:
/// - before a write, if the file is non-empty and the write would push it
///   past `max_bytes`, rotate first;
/// - after a write, if the file reached `max_bytes`, rotate right away so the
///   next write starts on a fresh file.
///
/// A single write larger than `max_bytes` therefore lands alone in its own
/// file.
///
/// # Examples
///
/// ```no_run
/// use dualbuf_logger::sinks::RollBySizeSink;
/// use dualbuf_logger::Sink;
///
/// let mut sink = RollBySizeSink::new("/var/log/app/roll", 10 * 1024 * 1024).unwrap();
/// sink.persist(b"hello\n").unwrap();
/// ```
pub struct RollBySizeSink {
    basename: PathBuf,
    max_bytes: u64,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    current_size: u64,
    seq: u64,
    last_second: i64,
}

impl RollBySizeSink {
    /// Create the sink; the first file is opened lazily on the first write.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_bytes` is zero
    pub fn new(basename: impl Into<PathBuf>, max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Err(LoggerError::config("RollBySizeSink", "max_bytes must be greater than 0"));
        }
        Ok(Self {
            basename: basename.into(),
            max_bytes,
            writer: None,
            current_path: None,
            current_size: 0,
            seq: 0,
            last_second: i64::MIN,
        })
    }

    /// Bytes written to the current file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Path of the open file, `None` before the first write or after a
    /// failed rotation
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.writer.as_ref().and(self.current_path.as_deref())
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub(crate) fn persist_at(&mut self, data: &[u8], now: DateTime<Local>) -> Result<()> {
        if self.writer.is_none() {
            self.open_next(now)?;
        }

        let len = data.len() as u64;
        if self.current_size > 0 && self.current_size + len > self.max_bytes {
            self.rotate(now)?;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("RollBySizeSink has no open file"))?;
        writer.write_all(data).map_err(|e| {
            LoggerError::file_sink(
                self.current_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                format!("Write failed: {}", e),
            )
        })?;
        self.current_size += len;

        if self.current_size >= self.max_bytes {
            if let Err(e) = self.rotate(now) {
                // The bytes are on disk; the next write retries the open
                eprintln!("[LOGGER WARNING] Pre-emptive rotation failed: {}", e);
            }
        }
        Ok(())
    }

    fn rotate(&mut self, now: DateTime<Local>) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.basename.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }
        self.open_next(now).map_err(|e| {
            LoggerError::file_rotation(self.basename.display().to_string(), e.to_string())
        })
    }

    fn open_next(&mut self, now: DateTime<Local>) -> Result<()> {
        let path = self.next_file_name(now);
        ensure_parent_dir(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.current_size = 0;
        Ok(())
    }

    fn next_file_name(&mut self, now: DateTime<Local>) -> PathBuf {
        let second = now.timestamp();
        if second != self.last_second {
            self.seq = 0;
            self.last_second = second;
        }
        loop {
            let path = PathBuf::from(format!(
                "{}_{}-{}-{}-{}-{}-{}_{}.log",
                self.basename.display(),
                now.year(),
                now.month(),
                now.day(),
                now.hour(),
                now.minute(),
                now.second(),
                self.seq
            ));
            self.seq += 1;
            if !path_exists(&path) {
                return path;
            }
        }
    }
}

impl Sink for RollBySizeSink {
    fn persist(&mut self, data: &[u8]) -> Result<()> {
        self.persist_at(data, Local::now())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "roll_by_size"
    }
}

impl Drop for RollBySizeSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
