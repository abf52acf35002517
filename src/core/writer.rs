//! Output stream plumbing
//!
//! Appenders and the fallback emitter obtain their stream through a
//! [`MakeWriter`] so output can be redirected away from the real stderr.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Opens a fresh handle to an output stream
pub type MakeWriter = Arc<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

/// Handles to the process standard error stream
pub fn stderr_writer() -> MakeWriter {
    Arc::new(|| -> Box<dyn Write + Send> { Box::new(io::stderr()) })
}

/// In-memory, cloneable sink; every clone appends to the same buffer
///
/// # Example
///
/// ```
/// use container_logs::core::SharedBuffer;
/// use std::io::Write;
///
/// let buffer = SharedBuffer::new();
/// let mut handle = (buffer.make_writer())();
/// writeln!(handle, "{{\"message\":\"hi\"}}").unwrap();
/// assert_eq!(buffer.lines(), vec!["{\"message\":\"hi\"}"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_writer(&self) -> MakeWriter {
        let buffer = self.clone();
        Arc::new(move || -> Box<dyn Write + Send> { Box::new(buffer.clone()) })
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Parse every line as JSON
    pub fn json_lines(&self) -> serde_json::Result<Vec<serde_json::Value>> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line))
            .collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
