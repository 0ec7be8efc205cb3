//! Where recovered-panic diagnostics go.
//!
//! A [`Logger`] receives one free-text record per recovered panic. It is
//! shared by every request a guard handles, so implementations must accept
//! concurrent calls.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::error;

/// A sink for diagnostic records.
///
/// Any `Fn(&str) + Send + Sync` closure is a logger:
///
/// ```rust
/// use parapet::middleware::recover::{logger, recover};
///
/// let recover = recover([logger(|record: &str| eprintln!("{record}"))]);
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, record: &str);
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, record: &str) {
        self(record)
    }
}

/// The default logger: one `tracing` error event per record, target
/// `parapet::recover`. Timestamps and the output stream belong to whichever
/// subscriber the host installs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, record: &str) {
        error!(target: "parapet::recover", "{record}");
    }
}

/// Writes each record, newline-terminated, to a shared writer.
///
/// Write errors are ignored: a failing log sink must not turn a recovered
/// panic into a second failure.
#[derive(Debug)]
pub struct WriterLogger<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    /// Returns the writer, e.g. to inspect a buffer in tests.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WriterLogger<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> Logger for WriterLogger<W> {
    fn log(&self, record: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{record}").and_then(|()| writer.flush());
    }
}
