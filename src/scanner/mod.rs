use crate::error::{AstroSortError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 対象とする拡張子（FITS と Canon RAW）
const FRAME_EXTENSIONS: &[&str] = &["fit", "fits", "cr2"];

/// フォルダ以下のフレームファイルを再帰的に収集（パス順）
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(AstroSortError::FolderNotFound(folder.display().to_string()));
    }

    let mut frames = Vec::new();

    for entry in WalkDir::new(folder) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("走査できないエントリをスキップ: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some(ext) = path.extension() {
            if is_frame_extension(&ext.to_string_lossy()) {
                frames.push(path.to_path_buf());
            }
        }
    }

    frames.sort();
    tracing::debug!("{}件のフレームを検出: {}", frames.len(), folder.display());

    Ok(frames)
}

/// 大文字小文字を区別せずに拡張子を判定
fn is_frame_extension(ext: &str) -> bool {
    FRAME_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
