//! Append-only CSV output for one run.
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::ListingRecord;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output I/O failed")]
    Io(#[from] io::Error),
    #[error("CSV encoding failed")]
    Csv(#[from] csv::Error),
    #[error("no free output file name starting with {0}")]
    NoFreeName(PathBuf),
}

/// Owns the output file of one run. The path never changes once reserved.
#[derive(Debug)]
pub struct ListingSink {
    path: PathBuf,
    written: usize,
}

impl ListingSink {
    /// Create `<dir>/<prefix>_<timestamp>.csv` exclusively, falling back to
    /// `_2`, `_3`, ... when another run already holds the name.
    pub fn reserve(dir: &Path, prefix: &str, started: NaiveDateTime) -> Result<Self, SinkError> {
        fs::create_dir_all(dir)?;
        let stem = format!("{prefix}_{}", started.format(TIMESTAMP_FORMAT));

        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let name = if attempt == 1 {
                format!("{stem}.csv")
            } else {
                format!("{stem}_{attempt}.csv")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!(target: "scraper.sink", path = %path.display(), "reserved output file");
                    return Ok(Self { path, written: 0 });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(SinkError::NoFreeName(dir.join(stem)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this sink so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append one batch and flush it. The header goes in only while the file
    /// is empty.
    pub fn append(&mut self, records: &[ListingRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        drop_torn_row(&mut file)?;
        let needs_header = file.seek(SeekFrom::End(0))? == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        self.written += records.len();
        info!(
            target: "scraper.sink",
            path = %self.path.display(),
            rows = records.len(),
            total = self.written,
            "batch appended"
        );
        Ok(records.len())
    }

    /// Remove the reserved file if this run never wrote to it. Returns
    /// whether the file was removed.
    pub fn discard_if_empty(&self) -> Result<bool, SinkError> {
        if self.written > 0 {
            return Ok(false);
        }
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() == 0 => {
                fs::remove_file(&self.path)?;
                debug!(target: "scraper.sink", path = %self.path.display(), "removed empty output file");
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// A previous write that died mid-row leaves bytes after the last newline.
/// Cut the file back to that newline so every remaining row is whole.
fn drop_torn_row(file: &mut File) -> io::Result<()> {
    let len = file.metadata()?.len();
    let mut buf = [0u8; 4096];
    let mut end = len;

    while end > 0 {
        let start = end.saturating_sub(buf.len() as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|b| *b == b'\n') {
            let keep = start + pos as u64 + 1;
            if keep < len {
                warn!(
                    target: "scraper.sink",
                    dropped = len - keep,
                    "output ended mid-row; dropping the partial row"
                );
                file.set_len(keep)?;
            }
            return Ok(());
        }
        end = start;
    }

    if len > 0 {
        warn!(target: "scraper.sink", dropped = len, "output has no complete row");
        file.set_len(0)?;
    }
    Ok(())
}

/// Load every row of an output file.
pub fn read_listings(path: &Path) -> Result<Vec<ListingRecord>, SinkError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader.deserialize().collect::<Result<Vec<ListingRecord>, _>>()?;
    Ok(records)
}
