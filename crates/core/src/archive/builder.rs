//! Zip archive construction.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::batch::BatchError;
use crate::sanitize::with_counter;

/// What ended up inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Entry names in the order they were written.
    pub entries: Vec<String>,
    /// Entries renamed because their base name was already taken.
    pub renamed: usize,
}

/// Writes every regular file under `source_dir` into a deflate-compressed zip
/// at `archive_path`.
///
/// Entries are stored by base name only. Files from different
/// subdirectories that share a base name get a ` (n)` suffix. A missing
/// source directory produces an empty archive.
///
/// Blocking; run it on the blocking pool.
pub fn build_archive(source_dir: &Path, archive_path: &Path) -> Result<ArchiveSummary, BatchError> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used: HashSet<String> = HashSet::new();
    let mut summary = ArchiveSummary {
        entries: Vec::new(),
        renamed: 0,
    };

    if source_dir.is_dir() {
        let walker = WalkDir::new(source_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = entry.map_err(|e| BatchError::Archive(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let base = entry.file_name().to_string_lossy().to_string();
            let mut name = base.clone();
            let mut counter = 2;
            while !used.insert(name.to_lowercase()) {
                name = with_counter(&base, counter);
                counter += 1;
            }
            if name != base {
                warn!(
                    path = %entry.path().display(),
                    entry = %name,
                    "Archive entry name collision, renamed"
                );
                summary.renamed += 1;
            }

            zip.start_file(name.clone(), options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
            summary.entries.push(name);
        }
    }

    zip.finish()?;

    debug!(
        archive = %archive_path.display(),
        entries = summary.entries.len(),
        "Archive written"
    );

    Ok(summary)
}
