//! Time-rotated file sink
//!
//! Local time is cut into aligned buckets (one second, minute, hour or day).
//! Every bucket gets its own file named after the bucket start:
//! `basename_YYYY.M.D_H:M:S_seq.log`.

use crate::core::{LoggerError, Result, Sink};
use crate::util::{ensure_parent_dir, path_exists};
use chrono::{DateTime, Datelike, Local, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Bucket width for [`RollByTimeSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Secondly,
    Minutely,
    Hourly,
    Daily,
}

impl TimeUnit {
    /// Length of one bucket
    #[must_use]
    pub fn length(&self) -> TimeDelta {
        match self {
            TimeUnit::Secondly => TimeDelta::seconds(1),
            TimeUnit::Minutely => TimeDelta::seconds(60),
            TimeUnit::Hourly => TimeDelta::seconds(60 * 60),
            TimeUnit::Daily => TimeDelta::seconds(24 * 60 * 60),
        }
    }

    /// Start of the bucket containing `t`
    #[must_use]
    pub fn floor(&self, t: DateTime<Local>) -> DateTime<Local> {
        let t = t.with_nanosecond(0).unwrap_or(t);
        match self {
            TimeUnit::Secondly => t,
            TimeUnit::Minutely => t.with_second(0).unwrap_or(t),
            TimeUnit::Hourly => t
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .unwrap_or(t),
            TimeUnit::Daily => t
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
                .unwrap_or(t),
        }
    }
}

/// File sink that switches to a new file whenever the wall clock enters a
/// new time bucket.
///
/// The file for the current bucket is opened at construction. Within one
/// bucket `seq` only grows past 0 when a file of the same name already
/// exists; entering a new bucket resets it.
///
/// # Examples
///
/// ```no_run
/// use dualbuf_logger::sinks::{RollByTimeSink, TimeUnit};
/// use dualbuf_logger::Sink;
///
/// let mut sink = RollByTimeSink::new("/var/log/app/hourly", TimeUnit::Hourly).unwrap();
/// sink.persist(b"hello\n").unwrap();
/// ```
pub struct RollByTimeSink {
    basename: PathBuf,
    unit: TimeUnit,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    bucket_start: DateTime<Local>,
    next_cutover: DateTime<Local>,
    seq: u64,
}

impl RollByTimeSink {
    /// Create the sink and open the file for the current bucket.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or the first file cannot be created
    pub fn new(basename: impl Into<PathBuf>, unit: TimeUnit) -> Result<Self> {
        Self::open_at(basename.into(), unit, Local::now())
    }

    pub(crate) fn open_at(basename: PathBuf, unit: TimeUnit, now: DateTime<Local>) -> Result<Self> {
        let bucket_start = unit.floor(now);
        let mut sink = Self {
            basename,
            unit,
            writer: None,
            current_path: None,
            bucket_start,
            next_cutover: bucket_start + unit.length(),
            seq: 0,
        };
        sink.open_bucket_file()?;
        Ok(sink)
    }

    #[must_use]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    #[must_use]
    pub fn bucket_start(&self) -> DateTime<Local> {
        self.bucket_start
    }

    #[must_use]
    pub fn next_cutover(&self) -> DateTime<Local> {
        self.next_cutover
    }

    /// Path of the open file, `None` after a failed rotation
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.writer.as_ref().and(self.current_path.as_deref())
    }

    pub(crate) fn persist_at(&mut self, data: &[u8], now: DateTime<Local>) -> Result<()> {
        if now >= self.next_cutover {
            self.rotate(now)?;
        } else if self.writer.is_none() {
            self.open_bucket_file().map_err(|e| {
                LoggerError::file_rotation(self.basename.display().to_string(), e.to_string())
            })?;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("RollByTimeSink has no open file"))?;
        writer.write_all(data).map_err(|e| {
            LoggerError::file_sink(
                self.current_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                format!("Write failed: {}", e),
            )
        })
    }

    fn rotate(&mut self, now: DateTime<Local>) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                eprintln!(
                    "[LOGGER WARNING] Failed to flush {} before rotation: {}",
                    self.current_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    e
                );
            }
        }

        self.bucket_start = self.unit.floor(now);
        self.next_cutover = self.bucket_start + self.unit.length();
        self.seq = 0;

        self.open_bucket_file().map_err(|e| {
            LoggerError::file_rotation(self.basename.display().to_string(), e.to_string())
        })
    }

    fn open_bucket_file(&mut self) -> Result<()> {
        let path = self.next_free_name();
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
        Ok(())
    }

    /// First `seq` (from the current one) whose file does not exist yet
    fn next_free_name(&mut self) -> PathBuf {
        let start = self.bucket_start;
        loop {
            let path = PathBuf::from(format!(
                "{}_{}.{}.{}_{}:{}:{}_{}.log",
                self.basename.display(),
                start.year(),
                start.month(),
                start.day(),
                start.hour(),
                start.minute(),
                start.second(),
                self.seq
            ));
            self.seq += 1;
            if !path_exists(&path) {
                return path;
            }
        }
    }
}

impl Sink for RollByTimeSink {
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
        "roll_by_time"
    }
}

impl Drop for RollByTimeSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
