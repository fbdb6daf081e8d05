//! Serialized writer for the shared output file.

use crate::types::{LookupConfig, ResultRecord};
use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, PoisonError};

/// Exclusive-access guard around the single output sink.
///
/// Each record is formatted into a complete line before the lock is taken
/// and then appended with one `write_all`, so lines never interleave.
pub struct OutputWriter<W: Write> {
    inner: Mutex<BufWriter<W>>,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Append one record as a `<hostname>,<result>` line.
    ///
    /// Lines stay whole only while writes succeed. If the sink fails during
    /// a buffer flush, a partial line may remain buffered and the next record
    /// lands right after it.
    pub fn write_record(&self, record: &ResultRecord, config: &LookupConfig) -> io::Result<()> {
        let line = record.format_line(config);
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.write_all(line.as_bytes())
    }

    /// Flush buffered lines and hand back the underlying writer.
    ///
    /// Consumes the guard: this is the only way the output gets closed.
    pub fn finish(self) -> io::Result<W> {
        let inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        inner.into_inner().map_err(|e| e.into_error())
    }
}
