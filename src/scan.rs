//! Lazy discovery of descriptor files under a channel directory.
use crate::error::FilesystemError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One step of a scan: a candidate descriptor or an entry that could not be walked.
#[derive(Debug)]
pub enum ScanItem {
    Descriptor(PathBuf),
    Skipped(FilesystemError),
}

/// Walk `dir` recursively and yield `.json` regular files in sorted order.
///
/// Symbolic links are never followed, so a link cycle cannot loop, and
/// recursion stops at `max_depth`.
pub fn scan(dir: &Path, max_depth: usize) -> impl Iterator<Item = ScanItem> {
    let root = dir.to_path_buf();
    WalkDir::new(dir)
        .follow_links(false)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_json(entry.path()) {
                    Some(ScanItem::Descriptor(entry.into_path()))
                } else {
                    None
                }
            }
            Err(source) => {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                Some(ScanItem::Skipped(FilesystemError::Walk { path, source }))
            }
        })
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
