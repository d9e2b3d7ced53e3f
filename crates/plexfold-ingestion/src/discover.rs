//! Input discovery: recursive walk of the base paths for the fixed
//! per-format basenames.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::formats::SourceFormat;

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub format: SourceFormat,
}

/// Walk every base path and collect matching files, sorted by path so
/// runs are deterministic. Unreadable directory entries are logged and
/// skipped; they never abort discovery.
pub fn find_inputs(base_paths: &[PathBuf]) -> Vec<InputFile> {
    let mut inputs = Vec::new();
    for base in base_paths {
        for entry in WalkDir::new(base).follow_links(true) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(base = %base.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(format) = SourceFormat::for_path(entry.path()) {
                inputs.push(InputFile { path: entry.path().to_path_buf(), format });
            }
        }
    }
    inputs.sort_by(|a, b| a.path.cmp(&b.path));
    inputs
}

/// Convenience for single-path callers (tests, tools).
pub fn find_inputs_in(base: &Path) -> Vec<InputFile> {
    find_inputs(&[base.to_path_buf()])
}
