use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;

use chrono::{DateTime, Datelike, Local, Timelike};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ArchiveEntry;
use crate::error::{IoContext, Result};
use crate::fs_utils::EntryKind;

/// Compression algorithm to use when creating the ZIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compressor {
    #[default]
    Deflate,
    Stored,
}

impl Compressor {
    fn method(self) -> CompressionMethod {
        match self {
            Compressor::Deflate => CompressionMethod::Deflated,
            Compressor::Stored => CompressionMethod::Stored,
        }
    }
}

/// Writes `entries` into a fresh archive at `path`, overwriting any existing file.
///
/// Returns the size of the finished archive in bytes. The `ZipWriter` owns the
/// file handle, so an early return through `?` drops it, which writes the
/// central directory and closes the file before the error reaches the caller.
pub fn write_zip(path: &Path, compressor: Compressor, entries: &[ArchiveEntry]) -> Result<u64> {
    let file = File::create(path).io_context(|| format!("creating archive {path:?}"))?;
    let mut archive = ZipWriter::new(file);
    info!(archive = %path.display(), entries = entries.len(), "writing archive");

    for entry in entries {
        let meta = fs::metadata(&entry.path)
            .io_context(|| format!("reading metadata of {:?}", entry.path))?;
        let options = entry_options(&meta, compressor);

        match entry.kind {
            EntryKind::Dir => {
                archive.add_directory(entry.name_in_archive.clone(), options)?;
            }
            EntryKind::File => {
                let mut src = File::open(&entry.path)
                    .io_context(|| format!("opening {:?}", entry.path))?;
                archive.start_file(entry.name_in_archive.clone(), options)?;
                io::copy(&mut src, &mut archive)
                    .io_context(|| format!("compressing {:?}", entry.path))?;
            }
        }
        debug!(name = %entry.name_in_archive, "added");
    }

    let mut file = archive.finish()?;
    io::Write::flush(&mut file).io_context(|| format!("flushing archive {path:?}"))?;
    drop(file);

    let size = fs::metadata(path)
        .io_context(|| format!("reading metadata of {path:?}"))?
        .len();
    Ok(size)
}

fn entry_options(meta: &Metadata, compressor: Compressor) -> SimpleFileOptions {
    let method = if meta.is_dir() {
        CompressionMethod::Stored
    } else {
        compressor.method()
    };

    let mut options = SimpleFileOptions::default()
        .compression_method(method)
        .large_file(meta.is_file() && meta.len() >= u32::MAX as u64);

    if let Some(modified) = meta.modified().ok().and_then(zip_timestamp) {
        options = options.last_modified_time(modified);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(meta.permissions().mode() & 0o7777);
    }

    options
}

/// Local modification time in ZIP's DOS format; `None` outside 1980..=2107.
fn zip_timestamp(modified: std::time::SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = modified.into();
    let year = u16::try_from(local.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
