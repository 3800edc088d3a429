//! セット単位の対話入力
//!
//! 整理処理は `SetPrompter` を受け取り、必要な選択・確認だけを問い合わせる。
//! 端末では `DialoguerPrompter` を使う。

use crate::error::Result;
use astro_sort_common::{target_directory, CaptureRecord, FrameType};
use dialoguer::{Confirm, Select};
use std::fmt;

/// 問い合わせ時に表示するセットの概要
#[derive(Debug, Clone, PartialEq)]
pub struct SetSummary {
    pub frame_type: FrameType,
    pub count: usize,
    pub first_file: String,
    pub last_file: String,
    pub exposure: String,
    pub target_directory: String,
}

impl SetSummary {
    /// 空のセットには概要がない
    pub fn new(set: &[CaptureRecord]) -> Option<Self> {
        let first = set.first()?;
        let last = set.last()?;
        Some(Self {
            frame_type: first.frame_type,
            count: set.len(),
            first_file: first.file_name().to_string(),
            last_file: last.file_name().to_string(),
            exposure: first.exposure.clone(),
            target_directory: target_directory(first),
        })
    }
}

impl fmt::Display for SetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}枚 (露出 {})", self.frame_type, self.count, self.exposure)?;
        writeln!(f, "  先頭: {}", self.first_file)?;
        writeln!(f, "  末尾: {}", self.last_file)?;
        write!(f, "  整理先: {}", self.target_directory)
    }
}

/// 整理処理が必要とする問い合わせ
pub trait SetPrompter {
    /// 鏡筒を選択（`None` はキャンセル）
    fn select_telescope(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>>;

    /// フィルターを選択（`None` はキャンセル）
    fn select_filter(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>>;

    /// カメラを選択（`None` はキャンセル）
    fn select_camera(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>>;

    /// ダークをダークフラットとして扱うか
    fn confirm_dark_flat(&mut self, summary: &SetSummary) -> Result<bool>;

    /// セットを移動してよいか
    fn confirm_move(&mut self, summary: &SetSummary) -> Result<bool>;
}

impl<P: SetPrompter + ?Sized> SetPrompter for &mut P {
    fn select_telescope(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>> {
        (**self).select_telescope(summary, options)
    }

    fn select_filter(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>> {
        (**self).select_filter(summary, options)
    }

    fn select_camera(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>> {
        (**self).select_camera(summary, options)
    }

    fn confirm_dark_flat(&mut self, summary: &SetSummary) -> Result<bool> {
        (**self).confirm_dark_flat(summary)
    }

    fn confirm_move(&mut self, summary: &SetSummary) -> Result<bool> {
        (**self).confirm_move(summary)
    }
}

/// dialoguerによる端末入力
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }

    fn select(&self, prompt: &str, options: &[String]) -> Result<Option<String>> {
        if options.is_empty() {
            println!("⚠ {}の選択肢が設定されていません（`astro-sort config` で追加できます）", prompt);
            return Ok(None);
        }

        let selected = Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact_opt()?;

        Ok(selected.map(|i| options[i].clone()))
    }
}

impl SetPrompter for DialoguerPrompter {
    fn select_telescope(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>> {
        println!("\n{}", summary);
        self.select("鏡筒", options)
    }

    fn select_filter(&mut self, _summary: &SetSummary, options: &[String]) -> Result<Option<String>> {
        self.select("フィルター", options)
    }

    fn select_camera(&mut self, summary: &SetSummary, options: &[String]) -> Result<Option<String>> {
        println!("\n{}", summary);
        self.select("カメラ", options)
    }

    fn confirm_dark_flat(&mut self, summary: &SetSummary) -> Result<bool> {
        println!("\n{}", summary);
        let answer = Confirm::new()
            .with_prompt("露出が短いダークです。ダークフラットとして整理しますか？")
            .default(true)
            .interact()?;
        Ok(answer)
    }

    fn confirm_move(&mut self, summary: &SetSummary) -> Result<bool> {
        println!("\n{}", summary);
        let answer = Confirm::new()
            .with_prompt("このセットを移動しますか？")
            .default(true)
            .interact()?;
        Ok(answer)
    }
}
