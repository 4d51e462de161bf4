//! CSV trace files
//!
//! One file per table (and per source station where the table is not
//! shared). The first record routed to a file in a run truncates it and
//! writes the header; every later record is appended.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{BeamError, Result};

use super::{TraceRecord, TraceSink};

/// Trace sink writing comma-separated files into a directory
#[derive(Debug)]
pub struct CsvTraceSink {
    directory: PathBuf,
    writers: HashMap<PathBuf, BufWriter<File>>,
    rows_written: usize,
}

impl CsvTraceSink {
    /// Create a sink in `directory`, creating the directory if needed
    pub fn new<P: Into<PathBuf>>(directory: P) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|e| BeamError::trace_io(&directory, e))?;
        Ok(Self {
            directory,
            writers: HashMap::new(),
            rows_written: 0,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Files opened so far in this run
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.writers.keys().cloned().collect();
        files.sort();
        files
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn writer_for(&mut self, record: &TraceRecord) -> Result<&mut BufWriter<File>> {
        let path = self.directory.join(record.file_name());
        if !self.writers.contains_key(&path) {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .map_err(|e| BeamError::trace_io(&path, e))?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{}", record.header()).map_err(|e| BeamError::trace_io(&path, e))?;
            debug!(path = %path.display(), "Opened trace file");
            self.writers.insert(path.clone(), writer);
        }
        self.writers.get_mut(&path).ok_or_else(|| BeamError::Internal {
            reason: format!("trace writer for {} vanished", path.display()),
        })
    }
}

impl TraceSink for CsvTraceSink {
    fn record(&mut self, record: TraceRecord) -> Result<()> {
        let row = record.csv_row();
        let path = self.directory.join(record.file_name());
        let writer = self.writer_for(&record)?;
        writeln!(writer, "{}", row).map_err(|e| BeamError::trace_io(&path, e))?;
        self.rows_written += 1;
        trace!(file = %path.display(), "Trace row written");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for (path, writer) in self.writers.iter_mut() {
            writer.flush().map_err(|e| BeamError::trace_io(path, e))?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

impl Drop for CsvTraceSink {
    fn drop(&mut self) {
        let _ = TraceSink::flush(self);
    }
}
