//! In-memory log capture for tests.
//!
//! [`LogCapture`] installs a JSON formatter as the thread-local default
//! subscriber and keeps every emitted event. It works with
//! `#[tokio::test]`'s current-thread runtime, where all tasks run on the
//! thread that holds the guard.
//!
//! ```
//! use bindery_telemetry::capture::LogCapture;
//!
//! let logs = LogCapture::new();
//! {
//!     let _guard = logs.set_default();
//!     tracing::error!(error = "boom", "request failed");
//! }
//! assert_eq!(logs.count_level("ERROR"), 1);
//! ```

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::subscriber::DefaultGuard;

/// Shared buffer collecting JSON log lines.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the capture as this thread's default subscriber.
    ///
    /// Events are captured until the returned guard is dropped.
    #[must_use]
    pub fn set_default(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Returns everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Returns every captured event parsed as JSON.
    #[must_use]
    pub fn events(&self) -> Vec<Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Returns the captured events at the given level (e.g. `"ERROR"`).
    #[must_use]
    pub fn events_at(&self, level: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|event| event["level"] == level)
            .collect()
    }

    /// Counts the captured events at the given level.
    #[must_use]
    pub fn count_level(&self, level: &str) -> usize {
        self.events_at(level).len()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
