//! Logging setup: stderr plus a size-capped log file with rotated backups.
//!
//! The file side mirrors the classic rotating-file policy: when the active
//! file would exceed `max_bytes`, it is renamed to `<file>.1` (shifting older
//! backups up by one, dropping the oldest past `backups`) and a fresh file is
//! started. The writer is wrapped in `tracing-appender`'s non-blocking
//! worker so slow disk writes never stall a cycle.

use crate::config::LogConfig;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes tracing with a stderr layer and, if the log file can be
/// opened, a rotating file layer.
///
/// Returns the appender worker guard; hold it for the life of the process so
/// buffered log lines are flushed on shutdown. Returns `None` (stderr-only)
/// if the log file cannot be opened.
pub fn init(log: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match RotatingFileWriter::open(&log.path, log.max_bytes, log.backups) {
        Ok(writer) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();

            Some(guard)
        }
        Err(e) => {
            // Fall back to stderr only
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();

            tracing::warn!(
                path = %log.path.display(),
                error = %e,
                "Could not open log file, logging to stderr only"
            );

            None
        }
    }
}

/// An append-only file writer that rotates when the active file would exceed
/// its size cap.
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    /// Opens (or creates) the active log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let file = open_append(path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            // No backups retained: truncate in place
            self.file = File::create(&self.path)?;
        } else {
            let oldest = backup_path(&self.path, self.backups);
            if oldest.exists() {
                std::fs::remove_file(&oldest)?;
            }
            for i in (1..self.backups).rev() {
                let from = backup_path(&self.path, i);
                if from.exists() {
                    std::fs::rename(&from, backup_path(&self.path, i + 1))?;
                }
            }
            std::fs::rename(&self.path, backup_path(&self.path, 1))?;
            self.file = open_append(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `mailprint.log` -> `mailprint.log.1`, `mailprint.log.2`, ...
fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_line(writer: &mut RotatingFileWriter, fill: u8, len: usize) {
        let line = vec![fill; len];
        writer.write_all(&line).unwrap();
        writer.flush().unwrap();
    }

    #[test]
    fn test_no_rotation_below_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.log");
        let mut writer = RotatingFileWriter::open(&path, 100, 2).unwrap();

        write_line(&mut writer, b'a', 40);
        write_line(&mut writer, b'b', 40);

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 80);
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_rotation_shifts_backups() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.log");
        let mut writer = RotatingFileWriter::open(&path, 50, 2).unwrap();

        write_line(&mut writer, b'a', 40); // active: a
        write_line(&mut writer, b'b', 40); // rotates: .1 = a, active: b
        write_line(&mut writer, b'c', 40); // rotates: .2 = a, .1 = b, active: c

        assert_eq!(std::fs::read(&path).unwrap(), vec![b'c'; 40]);
        assert_eq!(
            std::fs::read(backup_path(&path, 1)).unwrap(),
            vec![b'b'; 40]
        );
        assert_eq!(
            std::fs::read(backup_path(&path, 2)).unwrap(),
            vec![b'a'; 40]
        );
    }

    #[test]
    fn test_oldest_backup_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.log");
        let mut writer = RotatingFileWriter::open(&path, 50, 2).unwrap();

        write_line(&mut writer, b'a', 40);
        write_line(&mut writer, b'b', 40);
        write_line(&mut writer, b'c', 40);
        write_line(&mut writer, b'd', 40); // 'a' falls off the end

        assert_eq!(std::fs::read(&path).unwrap(), vec![b'd'; 40]);
        assert_eq!(
            std::fs::read(backup_path(&path, 2)).unwrap(),
            vec![b'b'; 40]
        );
        assert!(!backup_path(&path, 3).exists());
    }

    #[test]
    fn test_zero_backups_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.log");
        let mut writer = RotatingFileWriter::open(&path, 50, 0).unwrap();

        write_line(&mut writer, b'a', 40);
        write_line(&mut writer, b'b', 40);

        assert_eq!(std::fs::read(&path).unwrap(), vec![b'b'; 40]);
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_reopen_counts_existing_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.log");

        {
            let mut writer = RotatingFileWriter::open(&path, 50, 1).unwrap();
            write_line(&mut writer, b'a', 40);
        }

        // A restarted process picks up where the file left off
        let mut writer = RotatingFileWriter::open(&path, 50, 1).unwrap();
        write_line(&mut writer, b'b', 40);

        assert_eq!(std::fs::read(&path).unwrap(), vec![b'b'; 40]);
        assert_eq!(
            std::fs::read(backup_path(&path, 1)).unwrap(),
            vec![b'a'; 40]
        );
    }
}
