//! 整理後の後片付け
//!
//! 撮影機が書き出すサムネイルと、移動で空になったディレクトリを削除する。
//! 整理ルート自体は削除しない。

use crate::error::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub thumbnails_removed: Vec<PathBuf>,
    pub directories_removed: Vec<PathBuf>,
}

/// サムネイル判定（大文字小文字を区別しない）
fn is_thumbnail(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(&suffix.to_lowercase()))
        .unwrap_or(false)
}

/// ディレクトリの中身が全て削除済み（予定を含む）か
fn is_effectively_empty(dir: &Path, removed: &HashSet<PathBuf>) -> Result<bool> {
    for entry in fs::read_dir(dir)? {
        if !removed.contains(&entry?.path()) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `root` 以下のサムネイルと空ディレクトリを削除
pub fn clean(root: &Path, thumbnail_suffix: &str, dry_run: bool) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    // ドライランでも削除済みとみなすパス
    let mut removed: HashSet<PathBuf> = HashSet::new();

    // 子から先に走査して、空になった親も続けて削除できるようにする
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type().is_file() {
            if !is_thumbnail(path, thumbnail_suffix) {
                continue;
            }
            if dry_run {
                tracing::info!(path = %path.display(), "[dry-run] サムネイル削除");
            } else {
                fs::remove_file(path)?;
                tracing::debug!(path = %path.display(), "サムネイルを削除");
            }
            removed.insert(path.to_path_buf());
            report.thumbnails_removed.push(path.to_path_buf());
        } else if entry.file_type().is_dir() && is_effectively_empty(path, &removed)? {
            if dry_run {
                tracing::info!(path = %path.display(), "[dry-run] 空ディレクトリ削除");
            } else {
                fs::remove_dir(path)?;
                tracing::debug!(path = %path.display(), "空ディレクトリを削除");
            }
            removed.insert(path.to_path_buf());
            report.directories_removed.push(path.to_path_buf());
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_thumbnail() {
        assert!(is_thumbnail(Path::new("a/Light_M51_0001_thn.jpg"), "_thn.jpg"));
        assert!(is_thumbnail(Path::new("a/Light_M51_0001_THN.JPG"), "_thn.jpg"));
        assert!(!is_thumbnail(Path::new("a/Light_M51_0001.fit"), "_thn.jpg"));
    }
}
