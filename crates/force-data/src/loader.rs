//! Discovery and loading of the raw log files of one session directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use force_core::error::{ForceError, Result};
use force_core::models::FileTable;
use regex::Regex;
use tracing::{debug, info};

use crate::parser::RecordParser;

/// Sentinel file written by the device self-test, never part of a session.
pub const TEST_FILE_NAME: &str = "TEST.TXT";

fn data_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9]{8}\.txt$").expect("data file pattern is a valid regex")
    })
}

/// Whether `name` is a Datafficheur log file name (`MMDDhhmm.TXT`).
pub fn is_data_file_name(name: &str) -> bool {
    data_file_pattern().is_match(name)
}

/// Whether `path` is the device's self-test file.
pub fn is_excluded(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_uppercase().ends_with(TEST_FILE_NAME))
        .unwrap_or(false)
}

/// List the log files directly inside `dir`, sorted by path.
///
/// Fails with [`ForceError::NotFound`] when `dir` does not exist.
pub fn find_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ForceError::NotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(is_data_file_name)
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .filter(|path| !is_excluded(path))
        .collect();

    files.sort();
    Ok(files)
}

/// Loads every log file of a directory with one [`RecordParser`].
#[derive(Debug, Clone)]
pub struct FileSetLoader {
    parser: RecordParser,
}

impl FileSetLoader {
    pub fn new(parser: RecordParser) -> Self {
        Self { parser }
    }

    /// Parse every log file of `dir`.
    ///
    /// Fails with [`ForceError::EmptyInput`] when no file matches, and with the
    /// first parse error otherwise: one bad file aborts the whole load.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<FileTable>> {
        let files = find_data_files(dir)?;
        if files.is_empty() {
            return Err(ForceError::EmptyInput(dir.to_path_buf()));
        }

        let mut tables = Vec::with_capacity(files.len());
        for path in &files {
            info!("Processing file {}", path.display());
            let table = self.parser.parse_file(path)?;
            debug!("{}: sensors {:?}", path.display(), table.sensors());
            tables.push(table);
        }

        debug!(
            "Loaded {} files ({} samples) from {}",
            tables.len(),
            tables.iter().map(|t| t.rows.len()).sum::<usize>(),
            dir.display()
        );
        Ok(tables)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
