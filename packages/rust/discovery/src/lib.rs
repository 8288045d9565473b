//! Source discovery for tournament result files.
//!
//! Scans a single directory (never recursing) for `*.csv` result files and
//! pairs each with an optional `*.md` metadata file of the same stem.
//! A missing directory is not an error: a fresh site with no results yet
//! still gets an (empty) index.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use resultgen_shared::{Result, ResultgenError, SourceFile};
use tracing::{debug, info, instrument, warn};

/// Extension of tabular result files (matched case-insensitively).
const CSV_EXTENSION: &str = "csv";

/// Extension of paired metadata files (matched case-insensitively).
const METADATA_EXTENSION: &str = "md";

/// Stems never treated as metadata, even without a paired CSV.
const IGNORED_METADATA_STEMS: &[&str] = &["readme"];

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Outcome of scanning the source directory.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Result files, sorted by stem.
    pub sources: Vec<SourceFile>,
    /// Non-fatal oddities found while scanning.
    pub warnings: Vec<DiscoveryWarning>,
}

/// A file that looked relevant but could not be used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// A metadata file with no CSV of the same stem.
    OrphanMetadata { path: PathBuf },
    /// A candidate file whose name is not valid UTF-8.
    NonUtf8Name { path: PathBuf },
    /// A second file mapping onto an already-claimed stem.
    DuplicateStem { stem: String, path: PathBuf },
    /// A directory entry that could not be inspected.
    Unreadable { path: PathBuf, message: String },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanMetadata { path } => {
                write!(f, "{} has no matching .csv file", path.display())
            }
            Self::NonUtf8Name { path } => {
                write!(f, "{} has a non UTF-8 file name", path.display())
            }
            Self::DuplicateStem { stem, path } => {
                write!(f, "{} duplicates stem `{stem}`, ignored", path.display())
            }
            Self::Unreadable { path, message } => {
                write!(f, "could not read {}: {message}", path.display())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Discover result files directly inside `source_dir`.
///
/// Subdirectories are skipped. Entries that cannot be inspected become
/// warnings; only a directory that exists but cannot be listed is an error.
#[instrument(skip_all, fields(dir = %source_dir.display()))]
pub fn discover(source_dir: &Path) -> Result<Discovery> {
    let entries = match fs::read_dir(source_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("source directory not found, nothing to discover");
            return Ok(Discovery::default());
        }
        Err(e) => return Err(ResultgenError::io(source_dir, e)),
    };

    let mut warnings = Vec::new();
    let mut csv_files: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut md_files: BTreeMap<String, PathBuf> = BTreeMap::new();

    // Sorted by name: of two files with the same stem, the first one wins.
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => warnings.push(DiscoveryWarning::Unreadable {
                path: source_dir.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for path in paths {
        let Some(kind) = classify(&path) else {
            continue;
        };

        // Follows symlinks, so a linked CSV still counts as a file.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                debug!(path = %path.display(), "skipping non-file entry");
                continue;
            }
            Err(e) => {
                warnings.push(DiscoveryWarning::Unreadable {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            warnings.push(DiscoveryWarning::NonUtf8Name { path });
            continue;
        };

        if stem.starts_with('.') {
            debug!(path = %path.display(), "skipping hidden file");
            continue;
        }

        let bucket = match kind {
            FileKind::Csv => &mut csv_files,
            FileKind::Metadata => &mut md_files,
        };
        if bucket.contains_key(&stem) {
            warnings.push(DiscoveryWarning::DuplicateStem { stem, path });
            continue;
        }
        bucket.insert(stem, path);
    }

    // Stems are unique per directory, but `Foo` and `foo` would collide on
    // case-insensitive filesystems once written out as posts.
    let mut seen_lower: BTreeMap<String, &str> = BTreeMap::new();
    for stem in csv_files.keys() {
        if let Some(previous) = seen_lower.insert(stem.to_lowercase(), stem) {
            warn!(stem = %stem, previous = %previous, "result stems differ only by case");
        }
    }

    for (stem, path) in &md_files {
        let ignored = IGNORED_METADATA_STEMS.contains(&stem.to_lowercase().as_str());
        if !csv_files.contains_key(stem) && !ignored {
            warnings.push(DiscoveryWarning::OrphanMetadata { path: path.clone() });
        }
    }

    let sources: Vec<SourceFile> = csv_files
        .into_iter()
        .map(|(stem, csv_path)| {
            let metadata_path = md_files.remove(&stem);
            SourceFile {
                stem,
                csv_path,
                metadata_path,
            }
        })
        .collect();

    for warning in &warnings {
        warn!(%warning, "discovery warning");
    }

    info!(
        sources = sources.len(),
        with_metadata = sources.iter().filter(|s| s.metadata_path.is_some()).count(),
        warnings = warnings.len(),
        "source discovery complete"
    );

    Ok(Discovery { sources, warnings })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Metadata,
}

/// Classify a path by its extension, case-insensitively.
fn classify(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        CSV_EXTENSION => Some(FileKind::Csv),
        METADATA_EXTENSION => Some(FileKind::Metadata),
        _ => None,
    }
}
