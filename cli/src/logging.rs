use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::writer::MakeWriter;

/// Where log lines go: always stderr (stdout carries query output), plus an optional file
/// that is appended to across runs.
#[derive(Clone, Default)]
pub(crate) struct LogSink {
    file: Option<Arc<Mutex<File>>>,
}

impl LogSink {
    pub(crate) fn open(path: Option<&Path>) -> io::Result<Self> {
        let file = path
            .map(|path| OpenOptions::new().create(true).append(true).open(path))
            .transpose()?
            .map(|file| Arc::new(Mutex::new(file)));
        Ok(Self { file })
    }
}

/// Buffers one formatted event and emits it whole when dropped, so concurrent events never
/// interleave inside a line.
pub(crate) struct LogLine {
    buf: Vec<u8>,
    file: Option<Arc<Mutex<File>>>,
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogLine;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine {
            buf: Vec::with_capacity(256),
            file: self.file.clone(),
        }
    }
}

impl LogLine {
    fn emit(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        io::stderr().lock().write_all(&self.buf)?;
        if let Some(file) = &self.file {
            file.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(&self.buf)?;
        }
        self.buf.clear();
        Ok(())
    }
}

impl Write for LogLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()
    }
}

impl Drop for LogLine {
    fn drop(&mut self) {
        // nowhere left to report a failed log write
        let _ = self.emit();
    }
}
