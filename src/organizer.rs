//! フレーム整理ワークフロー
//!
//! ## 処理フロー
//! 1. 全ファイルを解析（失敗したファイルは報告してスキップ）
//! 2. パス順に並べ、種別ごとにキャプチャセットへ分割
//! 3. セットごとに不足情報を問い合わせ（ダークフラット・鏡筒・フィルター・カメラ）
//! 4. 移動の確認後、セット内の全ファイルを整理先へ移動
//!
//! 1つのセットの移動が終わるまで次のセットには進まない。

use crate::config::Config;
use crate::error::Result;
use crate::prompt::{SetPrompter, SetSummary};
use crate::relocator::{RelocateOutcome, Relocator};
use astro_sort_common::{capture_sets, target_path, CaptureRecord, FilenameParser, FrameType, SetContext};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// 解析できなかったファイル
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// 整理結果の集計
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeReport {
    /// 処理したキャプチャセット数
    pub sets: usize,
    pub moved: usize,
    /// ドライランでの移動予定数
    pub would_move: usize,
    pub already_organized: usize,
    /// 整理先に同名ファイルがありスキップした数
    pub skipped_existing: usize,
    /// 移動を見送ったセット数
    pub declined_sets: usize,
    pub parse_failures: Vec<ParseFailure>,
}

impl OrganizeReport {
    fn record(&mut self, outcome: RelocateOutcome) {
        match outcome {
            RelocateOutcome::AlreadyOrganized => self.already_organized += 1,
            RelocateOutcome::SkippedExisting => self.skipped_existing += 1,
            RelocateOutcome::Moved => self.moved += 1,
            RelocateOutcome::WouldMove => self.would_move += 1,
        }
    }
}

pub struct Organizer<P: SetPrompter> {
    root: PathBuf,
    config: Config,
    parser: FilenameParser,
    relocator: Relocator,
    prompter: P,
    frame_types: Vec<FrameType>,
}

impl<P: SetPrompter> Organizer<P> {
    pub fn new(root: impl Into<PathBuf>, config: Config, relocator: Relocator, prompter: P) -> Self {
        let parser = FilenameParser::new(config.cameras.iter().cloned());
        Self {
            root: root.into(),
            config,
            parser,
            relocator,
            prompter,
            frame_types: FrameType::ALL.to_vec(),
        }
    }

    /// 処理する種別を限定（空なら全種別）
    pub fn only(mut self, frame_types: &[FrameType]) -> Self {
        if !frame_types.is_empty() {
            self.frame_types = FrameType::ALL
                .iter()
                .copied()
                .filter(|t| frame_types.contains(t))
                .collect();
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// パスを解析してパス順に並べる（マーカーは整理ルート以下から読む）
    pub fn parse_all(&self, paths: &[PathBuf], report: &mut OrganizeReport) -> Vec<CaptureRecord> {
        let mut records = Vec::with_capacity(paths.len());

        for path in paths {
            match self.parser.parse_under(&self.root, path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "解析できないファイルをスキップ: {}", e);
                    report.parse_failures.push(ParseFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        records.sort_by(|a, b| a.source_path().cmp(b.source_path()));
        records
    }

    /// 整理を実行
    pub fn organize(&mut self, paths: &[PathBuf]) -> Result<OrganizeReport> {
        let mut report = OrganizeReport::default();
        let records = self.parse_all(paths, &mut report);

        for frame_type in self.frame_types.clone() {
            let of_type = records
                .iter()
                .filter(|r| r.frame_type == frame_type)
                .cloned();

            for set in capture_sets(of_type) {
                self.process_set(&set, &mut report)?;
            }
        }

        Ok(report)
    }

    fn is_in_place(&self, record: &CaptureRecord) -> bool {
        self.root.join(target_path(record)) == record.source_path()
    }

    fn process_set(&mut self, set: &[CaptureRecord], report: &mut OrganizeReport) -> Result<()> {
        let Some(summary) = SetSummary::new(set) else {
            return Ok(());
        };
        report.sets += 1;

        // 整理済みのセットは問い合わせない
        if set.iter().all(|r| self.is_in_place(r)) {
            tracing::debug!(first = %summary.first_file, "整理済みのセット");
            report.already_organized += set.len();
            return Ok(());
        }

        let Some(context) = self.resolve_context(set, &summary)? else {
            println!("→ スキップ");
            report.declined_sets += 1;
            return Ok(());
        };

        let enriched: Vec<CaptureRecord> = set.iter().map(|r| r.with_context(&context)).collect();
        let Some(summary) = SetSummary::new(&enriched) else {
            return Ok(());
        };

        if !self.prompter.confirm_move(&summary)? {
            println!("→ スキップ");
            report.declined_sets += 1;
            return Ok(());
        }

        // ドライランの予定はログに出すのでバーは出さない
        let pb = if self.relocator.is_dry_run() {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(enriched.len() as u64);
            pb.set_style(ProgressStyle::default_bar());
            pb
        };

        for record in &enriched {
            let outcome = self.relocator.relocate_record(record, &self.root)?;
            report.record(outcome);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(())
    }

    /// セット単位の補完情報を決める（`None` は操作者がキャンセルした）
    fn resolve_context(&mut self, set: &[CaptureRecord], summary: &SetSummary) -> Result<Option<SetContext>> {
        let mut context = SetContext::default();

        if summary.frame_type == FrameType::Dark && all_dark_flat_candidates(set) {
            context.dark_flat = self.prompter.confirm_dark_flat(summary)?;
        }

        if summary.frame_type.needs_optics() {
            if set.iter().any(|r| r.telescope.is_none()) {
                match self.prompter.select_telescope(summary, &self.config.telescopes)? {
                    Some(telescope) => context.telescope = Some(telescope),
                    None => return Ok(None),
                }
            }
            if set.iter().any(|r| r.filter.is_none()) {
                match self.prompter.select_filter(summary, &self.config.filters)? {
                    Some(filter) => context.filter = Some(filter),
                    None => return Ok(None),
                }
            }
        }

        let cameras = distinct_cameras(set);
        context.camera = match cameras.as_slice() {
            [] => match self.prompter.select_camera(summary, &self.config.cameras)? {
                Some(camera) => Some(camera),
                None => return Ok(None),
            },
            [camera] => Some(camera.to_string()),
            many => {
                tracing::warn!(cameras = ?many, first = %summary.first_file, "セット内に複数のカメラがあるため補完しません");
                println!("⚠ セット内に複数のカメラ: {}", many.join(", "));
                None
            }
        };

        Ok(Some(context))
    }
}

/// セット内の全フレームがダークフラット候補か
///
/// 露出の単位が解釈できないフレームは候補外とする。
fn all_dark_flat_candidates(set: &[CaptureRecord]) -> bool {
    set.iter().all(|r| match r.is_dark_flat_candidate() {
        Ok(candidate) => candidate,
        Err(e) => {
            tracing::warn!(file = %r.file_name(), "ダークフラット判定から除外: {}", e);
            false
        }
    })
}

/// セット内のカメラ（重複除去・順序固定）
fn distinct_cameras(set: &[CaptureRecord]) -> Vec<&str> {
    set.iter()
        .filter_map(|r| r.camera.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(names: &[&str]) -> Vec<CaptureRecord> {
        let parser = FilenameParser::new(["ASI533MC", "ASI2600MC"]);
        names
            .iter()
            .map(|n| parser.parse(Path::new(n)).unwrap())
            .collect()
    }

    #[test]
    fn test_distinct_cameras() {
        let set = parse(&[
            "Bias_1.0ms_ASI533MC_gain100_20220309-024714_6.0C_0001.fit",
            "Bias_1.0ms_20220309-024714_6.0C_0002.fit",
            "Bias_1.0ms_ASI533MC_gain100_20220309-024714_6.0C_0003.fit",
        ]);
        assert_eq!(distinct_cameras(&set), vec!["ASI533MC"]);

        let set = parse(&[
            "Bias_1.0ms_ASI533MC_gain100_20220309-024714_6.0C_0001.fit",
            "Bias_1.0ms_ASI2600MC_gain100_20220309-024714_6.0C_0002.fit",
        ]);
        assert_eq!(distinct_cameras(&set), vec!["ASI2600MC", "ASI533MC"]);
    }

    #[test]
    fn test_all_dark_flat_candidates() {
        let set = parse(&[
            "Dark_2.0s_20220309-024714_6.0C_0001.fit",
            "Dark_200.0ms_20220309-024714_6.0C_0002.fit",
        ]);
        assert!(all_dark_flat_candidates(&set));

        let set = parse(&[
            "Dark_2.0s_20220309-024714_6.0C_0001.fit",
            "Dark_120.0s_20220309-024714_6.0C_0002.fit",
        ]);
        assert!(!all_dark_flat_candidates(&set));

        let set = parse(&["Dark_2.0min_20220309-024714_6.0C_0001.fit"]);
        assert!(!all_dark_flat_candidates(&set));
    }

    #[test]
    fn test_report_record() {
        let mut report = OrganizeReport::default();
        report.record(RelocateOutcome::Moved);
        report.record(RelocateOutcome::Moved);
        report.record(RelocateOutcome::SkippedExisting);
        report.record(RelocateOutcome::AlreadyOrganized);
        assert_eq!(report.moved, 2);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(report.already_organized, 1);
        assert_eq!(report.would_move, 0);
    }
}
