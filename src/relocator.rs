//! ファイル移動
//!
//! 既存ファイルは上書きせず、移動元も削除しない（先に置かれた方を優先）。
//! ドライランではファイルシステムを一切変更せず、予定の操作をログに出す。

use crate::error::Result;
use astro_sort_common::{target_path, CaptureRecord};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 移動の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocateOutcome {
    /// 整理先と移動元が同じ
    AlreadyOrganized,
    /// 整理先に同名ファイルが既にある
    SkippedExisting,
    /// 移動した
    Moved,
    /// ドライラン（移動予定）
    WouldMove,
}

#[derive(Debug, Clone, Default)]
pub struct Relocator {
    dry_run: bool,
    /// ドライランで作成予定として報告済みのディレクトリ
    planned_dirs: HashSet<PathBuf>,
}

impl Relocator {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            planned_dirs: HashSet::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// ドライランで作成予定のディレクトリ
    pub fn planned_directories(&self) -> &HashSet<PathBuf> {
        &self.planned_dirs
    }

    /// レコードを `root` 以下の整理先へ移動
    pub fn relocate_record(&mut self, record: &CaptureRecord, root: &Path) -> Result<RelocateOutcome> {
        let target = root.join(target_path(record));
        self.relocate(record.source_path(), &target)
    }

    /// `source` を `target` へ移動
    pub fn relocate(&mut self, source: &Path, target: &Path) -> Result<RelocateOutcome> {
        if source == target {
            return Ok(RelocateOutcome::AlreadyOrganized);
        }

        if let Some(dir) = target.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                if self.dry_run {
                    if self.planned_dirs.insert(dir.to_path_buf()) {
                        tracing::info!(dir = %dir.display(), "[dry-run] ディレクトリ作成");
                    }
                } else {
                    fs::create_dir_all(dir)?;
                    tracing::debug!(dir = %dir.display(), "ディレクトリを作成");
                }
            }
        }

        if target.exists() {
            tracing::warn!(
                source = %source.display(),
                target = %target.display(),
                "整理先に同名ファイルがあるためスキップ"
            );
            return Ok(RelocateOutcome::SkippedExisting);
        }

        if self.dry_run {
            tracing::info!(
                source = %source.display(),
                target = %target.display(),
                "[dry-run] 移動"
            );
            return Ok(RelocateOutcome::WouldMove);
        }

        move_file(source, target)?;
        tracing::debug!(source = %source.display(), target = %target.display(), "移動");
        Ok(RelocateOutcome::Moved)
    }
}

/// renameできない場合（別デバイス間など）はコピーしてから元を削除
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!("renameに失敗、コピーで移動します: {}", e);
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_same_path_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.fit");
        fs::write(&path, b"frame").unwrap();

        let outcome = Relocator::new(false).relocate(&path, &path).unwrap();
        assert_eq!(outcome, RelocateOutcome::AlreadyOrganized);
        assert!(path.exists());
    }

    #[test]
    fn test_move_creates_directories() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.fit");
        let target = dir.path().join("x").join("y").join("a.fit");
        fs::write(&source, b"frame").unwrap();

        let outcome = Relocator::new(false).relocate(&source, &target).unwrap();
        assert_eq!(outcome, RelocateOutcome::Moved);
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"frame");
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.fit");
        let target = dir.path().join("x").join("a.fit");
        fs::write(&source, b"frame").unwrap();

        let mut relocator = Relocator::new(true);
        assert!(relocator.is_dry_run());
        let outcome = relocator.relocate(&source, &target).unwrap();

        assert_eq!(outcome, RelocateOutcome::WouldMove);
        assert!(source.exists());
        assert!(!dir.path().join("x").exists());
    }

    #[test]
    fn test_existing_target_is_skipped() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.fit");
        let target = dir.path().join("x").join("a.fit");
        fs::write(&source, b"new").unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"old").unwrap();

        let outcome = Relocator::new(false).relocate(&source, &target).unwrap();
        assert_eq!(outcome, RelocateOutcome::SkippedExisting);
        assert_eq!(fs::read(&source).unwrap(), b"new");
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_dry_run_plans_each_directory_once() {
        let dir = tempdir().unwrap();
        let mut relocator = Relocator::new(true);

        for name in ["a.fit", "b.fit", "c.fit"] {
            let source = dir.path().join(name);
            fs::write(&source, b"frame").unwrap();
            let target = dir.path().join("x").join("y").join(name);
            assert_eq!(relocator.relocate(&source, &target).unwrap(), RelocateOutcome::WouldMove);
        }

        assert_eq!(relocator.planned_directories().len(), 1);
        assert!(relocator.planned_directories().contains(&dir.path().join("x").join("y")));
        assert!(!dir.path().join("x").exists());
    }
}
