//! Destinations for record lines: stdout and an append-only file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Receives one complete record line per tick
pub trait LineSink {
    fn name(&self) -> &str;
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Console sink
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

/// Append-only log file; every line is flushed as soon as it is written
pub struct FileSink {
    label: String,
    file: File,
}

impl FileSink {
    /// Open (creating parent directories and the file if needed) for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let log_file_error = |source| Error::LogFile {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(log_file_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(log_file_error)?;

        Ok(Self {
            label: path.display().to_string(),
            file,
        })
    }
}

impl LineSink for FileSink {
    fn name(&self) -> &str {
        &self.label
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }
}

/// Fans each line out to every sink.
///
/// A failing sink is reported and skipped for that line; the others still
/// receive it.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn LineSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl LineSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Write `line` everywhere; returns how many sinks accepted it.
    pub fn write_line(&mut self, line: &str) -> usize {
        let mut written = 0;
        for sink in &mut self.sinks {
            match sink.write_line(line) {
                Ok(()) => written += 1,
                Err(e) => tracing::warn!(sink = sink.name(), error = %e, "failed to write record"),
            }
        }
        written
    }
}
