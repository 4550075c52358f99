//! Host-facing log facility.
//!
//! Keyword hosts scrape `*LEVEL* message` lines from the library's standard
//! output. Every line written here is also mirrored to `tracing`.

use crate::format::CallRecord;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Severity tag understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
    /// Raw markup embedded in the host report (e.g. screenshots).
    Html,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Html => "HTML",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes one line per message to a sink, standard output by default.
pub struct Logger {
    owner: String,
    sink: Box<dyn Write + Send>,
}

impl Logger {
    /// Logger for `owner` writing to standard output.
    pub fn stdout(owner: impl Into<String>) -> Self {
        Self::with_sink(owner, Box::new(io::stdout()))
    }

    pub fn with_sink(owner: impl Into<String>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            owner: owner.into(),
            sink,
        }
    }

    pub fn log(&mut self, level: LogLevel, message: &str) -> io::Result<()> {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Debug | LogLevel::Html => tracing::debug!("{}", message),
        }
        writeln!(self.sink, "*{}* {}", level, message)?;
        self.sink.flush()
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        self.log(LogLevel::Info, message)
    }

    pub fn debug(&mut self, message: &str) -> io::Result<()> {
        self.log(LogLevel::Debug, message)
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        self.log(LogLevel::Warn, message)
    }

    pub fn html(&mut self, message: &str) -> io::Result<()> {
        self.log(LogLevel::Html, message)
    }

    /// Log the entry point of a keyword at INFO.
    pub fn info_kw(&mut self, call: &CallRecord<'_>) -> io::Result<()> {
        let line = self.trace_line(call);
        self.info(&line)
    }

    /// Log the entry point of a keyword at DEBUG.
    pub fn debug_kw(&mut self, call: &CallRecord<'_>) -> io::Result<()> {
        let line = self.trace_line(call);
        self.debug(&line)
    }

    fn trace_line(&self, call: &CallRecord<'_>) -> String {
        format!("{}.{}({})", self.owner, call.operation, call.format_args())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("owner", &self.owner).finish()
    }
}

/// A clonable in-memory sink. One clone is handed to a [`Logger`], another is
/// kept to read back (or drain) what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buf = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Return everything written so far and clear the buffer.
    pub fn take(&self) -> String {
        let mut buf = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let text = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        text
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn logger() -> (Logger, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let logger = Logger::with_sink("KeywordLibrary", Box::new(buffer.clone()));
        (logger, buffer)
    }

    #[test]
    fn test_levels_are_tagged() {
        let (mut log, buffer) = logger();
        log.info("one").unwrap();
        log.debug("two").unwrap();
        log.warn("three").unwrap();
        log.html("<b>four</b>").unwrap();
        assert_eq!(
            buffer.contents(),
            "*INFO* one\n*DEBUG* two\n*WARN* three\n*HTML* <b>four</b>\n"
        );
    }

    #[test]
    fn test_call_trace_line() {
        let (mut log, buffer) = logger();
        let args = [Value::from("Calc"), Value::from(""), Value::Int(5)];
        let call = CallRecord::new(
            "WinWait",
            &["WindowTitle", "WindowText", "TimeOut"],
            &args,
            &[],
        );
        log.info_kw(&call).unwrap();
        log.debug_kw(&call).unwrap();
        assert_eq!(
            buffer.contents(),
            "*INFO* KeywordLibrary.WinWait(WindowTitle='Calc', WindowText='', TimeOut=5)\n\
             *DEBUG* KeywordLibrary.WinWait(WindowTitle='Calc', WindowText='', TimeOut=5)\n"
        );
    }

    #[test]
    fn test_take_drains() {
        let (mut log, buffer) = logger();
        log.info("x").unwrap();
        assert_eq!(buffer.take(), "*INFO* x\n");
        assert_eq!(buffer.contents(), "");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut log = Logger::with_sink("KeywordLibrary", Box::new(BrokenPipe));
        let err = log.info("lost").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
