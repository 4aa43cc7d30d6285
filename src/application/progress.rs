//! Human-readable progress reporting for long-running jobs.

use std::io::Write;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("progress output failed: {0}")]
pub struct ProgressError(pub String);

/// Receives one status line at a time. A sink failure aborts the job.
pub trait ProgressSink: Send {
    fn emit(&mut self, line: &str) -> Result<(), ProgressError>;
}

impl<F> ProgressSink for F
where
    F: FnMut(&str) + Send,
{
    fn emit(&mut self, line: &str) -> Result<(), ProgressError> {
        self(line);
        Ok(())
    }
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressSink for Silent {
    fn emit(&mut self, _line: &str) -> Result<(), ProgressError> {
        Ok(())
    }
}

/// Writes each line to an `io::Write`, flushing after every line.
#[derive(Debug)]
pub struct LineWriter<W> {
    writer: W,
}

impl<W: Write + Send> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ProgressSink for LineWriter<W> {
    fn emit(&mut self, line: &str) -> Result<(), ProgressError> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|err| ProgressError(err.to_string()))
    }
}
