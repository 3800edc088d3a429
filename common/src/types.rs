//! 撮影フレームのメタデータ型
//!
//! ファイル名から復元した1枚分の情報（`CaptureRecord`）と、
//! セット単位で後から補完する情報（`SetContext`）を定義する。

use crate::error::{Error, Result};
use chrono::{Datelike, Days, NaiveDateTime, Timelike};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// ダークフラット候補とみなす露出時間の上限（秒）
pub const DARK_FLAT_MAX_EXPOSURE_SECS: f64 = 10.0;

/// フレーム種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameType {
    Dark,
    Flat,
    Light,
    Bias,
}

impl FrameType {
    /// 整理時の処理順
    pub const ALL: [FrameType; 4] = [
        FrameType::Dark,
        FrameType::Flat,
        FrameType::Light,
        FrameType::Bias,
    ];

    /// ファイル名先頭トークンとの完全一致で判定
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Dark" => Some(FrameType::Dark),
            "Flat" => Some(FrameType::Flat),
            "Light" => Some(FrameType::Light),
            "Bias" => Some(FrameType::Bias),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameType::Dark => "Dark",
            FrameType::Flat => "Flat",
            FrameType::Light => "Light",
            FrameType::Bias => "Bias",
        }
    }

    /// 鏡筒・フィルターの指定が必要な種別か
    pub fn needs_optics(&self) -> bool {
        matches!(self, FrameType::Flat | FrameType::Light)
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dark" => Ok(FrameType::Dark),
            "flat" => Ok(FrameType::Flat),
            "light" => Ok(FrameType::Light),
            "bias" => Ok(FrameType::Bias),
            _ => Err(Error::UnknownFrameType(s.to_string())),
        }
    }
}

/// 1ファイル分の撮影メタデータ
///
/// `source_path` と `file_name` は生成後に変更できない。
/// 鏡筒・フィルター・カメラ・ダークフラット判定は
/// [`CaptureRecord::with_context`] で補完した新しいレコードとして扱う。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub frame_type: FrameType,
    pub target: Option<String>,
    pub mosaic_pane: Option<String>,
    pub telescope: Option<String>,
    pub filter: Option<String>,
    pub dark_flat: bool,
    /// 単位付きのまま保持（`300.0s`, `200.0ms`, `500us`）
    pub exposure: String,
    pub binning: Option<String>,
    pub camera: Option<String>,
    pub iso: Option<String>,
    pub gain: Option<String>,
    pub captured_at: NaiveDateTime,
    pub sensor_temp: Option<String>,
    pub sequence_index: Option<String>,
    source_path: PathBuf,
    file_name: String,
}

impl CaptureRecord {
    /// 必須項目だけを持つレコードを生成
    pub fn new(
        source_path: impl Into<PathBuf>,
        frame_type: FrameType,
        exposure: impl Into<String>,
        captured_at: NaiveDateTime,
    ) -> Result<Self> {
        let source_path = source_path.into();
        let file_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::InvalidPath(source_path.display().to_string()))?;

        Ok(Self {
            frame_type,
            target: None,
            mosaic_pane: None,
            telescope: None,
            filter: None,
            dark_flat: false,
            exposure: exposure.into(),
            binning: None,
            camera: None,
            iso: None,
            gain: None,
            captured_at,
            sensor_temp: None,
            sequence_index: None,
            source_path,
            file_name,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 小文字の拡張子（なければ空文字）
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// 連番を整数として取得（数値でなければ0）
    pub fn sequence_number(&self) -> u64 {
        self.sequence_index
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// フラットセットID（`YYYYMMDD`）
    ///
    /// Lightは正午以降の撮影を翌日扱いにして、日付をまたぐ一晩の撮影を同じセットにまとめる。
    pub fn flatset_id(&self) -> String {
        let date = self.captured_at.date();
        let date = if self.frame_type == FrameType::Light && self.captured_at.hour() >= 12 {
            date.checked_add_days(Days::new(1)).unwrap_or(date)
        } else {
            date
        };
        date.format("%Y%m%d").to_string()
    }

    /// 月キー（`YYYY-MM`）。ダーク・バイアスの季節ごとの振り分けに使う
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.captured_at.year(), self.captured_at.month())
    }

    /// 露出時間を秒に換算
    pub fn exposure_seconds(&self) -> Result<f64> {
        lazy_static::lazy_static! {
            static ref EXPOSURE_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)([A-Za-z]+)$").unwrap();
        }

        let caps = EXPOSURE_RE
            .captures(&self.exposure)
            .ok_or_else(|| Error::InvalidExposure(self.exposure.clone()))?;
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| Error::InvalidExposure(self.exposure.clone()))?;

        match &caps[2] {
            "s" => Ok(value),
            "ms" => Ok(value / 1_000.0),
            "us" => Ok(value / 1_000_000.0),
            _ => Err(Error::UnknownExposureUnit(self.exposure.clone())),
        }
    }

    /// ダークフラットへの再分類候補か
    ///
    /// 単位が解釈できない露出は `Err` を返す（呼び出し側で候補外として扱う）。
    pub fn is_dark_flat_candidate(&self) -> Result<bool> {
        if self.frame_type != FrameType::Dark || self.dark_flat {
            return Ok(false);
        }
        Ok(self.exposure_seconds()? <= DARK_FLAT_MAX_EXPOSURE_SECS)
    }

    /// セット単位の補完情報を重ねた新しいレコードを返す
    ///
    /// 補完は未設定の項目にのみ適用される。`dark_flat` は論理和。
    pub fn with_context(&self, context: &SetContext) -> CaptureRecord {
        let mut record = self.clone();
        if record.telescope.is_none() {
            record.telescope = context.telescope.clone();
        }
        if record.filter.is_none() {
            record.filter = context.filter.clone();
        }
        if record.camera.is_none() {
            record.camera = context.camera.clone();
        }
        record.dark_flat |= context.dark_flat;
        record
    }
}

/// キャプチャセット単位で後から決まる情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetContext {
    pub telescope: Option<String>,
    pub filter: Option<String>,
    pub camera: Option<String>,
    pub dark_flat: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn record(frame_type: FrameType, exposure: &str, captured_at: NaiveDateTime) -> CaptureRecord {
        CaptureRecord::new("frames/test_0001.fit", frame_type, exposure, captured_at).unwrap()
    }

    #[test]
    fn test_flatset_id_light_before_noon() {
        let r = record(FrameType::Light, "300.0s", at(2022, 3, 9, 2, 47, 14));
        assert_eq!(r.flatset_id(), "20220309");
    }

    #[test]
    fn test_flatset_id_light_after_noon_rolls_over() {
        let r = record(FrameType::Light, "300.0s", at(2022, 3, 9, 14, 0, 0));
        assert_eq!(r.flatset_id(), "20220310");
    }

    #[test]
    fn test_flatset_id_rolls_over_month_end() {
        let r = record(FrameType::Light, "300.0s", at(2022, 2, 28, 21, 30, 0));
        assert_eq!(r.flatset_id(), "20220301");
    }

    #[test]
    fn test_flatset_id_dark_no_rollover() {
        let r = record(FrameType::Dark, "300.0s", at(2022, 3, 9, 14, 0, 0));
        assert_eq!(r.flatset_id(), "20220309");
    }

    #[test]
    fn test_month_key() {
        let r = record(FrameType::Bias, "1.0ms", at(2022, 3, 9, 14, 0, 0));
        assert_eq!(r.month_key(), "2022-03");
    }

    #[test]
    fn test_exposure_seconds_units() {
        let t = at(2022, 3, 9, 2, 0, 0);
        assert_eq!(record(FrameType::Dark, "5.0s", t).exposure_seconds().unwrap(), 5.0);
        assert!((record(FrameType::Dark, "200.0ms", t).exposure_seconds().unwrap() - 0.2).abs() < 1e-9);
        assert!((record(FrameType::Dark, "500us", t).exposure_seconds().unwrap() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_dark_flat_candidate() {
        let t = at(2022, 3, 9, 2, 0, 0);
        assert!(record(FrameType::Dark, "5.0s", t).is_dark_flat_candidate().unwrap());
        assert!(!record(FrameType::Dark, "15.0s", t).is_dark_flat_candidate().unwrap());
        assert!(record(FrameType::Dark, "200.0ms", t).is_dark_flat_candidate().unwrap());
        assert!(record(FrameType::Dark, "10.0s", t).is_dark_flat_candidate().unwrap());
    }

    #[test]
    fn test_dark_flat_candidate_excludes_other_types_and_flagged() {
        let t = at(2022, 3, 9, 2, 0, 0);
        assert!(!record(FrameType::Flat, "1.0s", t).is_dark_flat_candidate().unwrap());

        let mut flagged = record(FrameType::Dark, "1.0s", t);
        flagged.dark_flat = true;
        assert!(!flagged.is_dark_flat_candidate().unwrap());
    }

    #[test]
    fn test_dark_flat_candidate_unknown_unit() {
        let t = at(2022, 3, 9, 2, 0, 0);
        let err = record(FrameType::Dark, "5.0min", t).is_dark_flat_candidate().unwrap_err();
        assert!(matches!(err, Error::UnknownExposureUnit(_)));

        let err = record(FrameType::Dark, "fast", t).is_dark_flat_candidate().unwrap_err();
        assert!(matches!(err, Error::InvalidExposure(_)));
    }

    #[test]
    fn test_sequence_number_non_numeric_is_zero() {
        let mut r = record(FrameType::Light, "1.0s", at(2022, 3, 9, 2, 0, 0));
        assert_eq!(r.sequence_number(), 0);
        r.sequence_index = Some("0040".into());
        assert_eq!(r.sequence_number(), 40);
        r.sequence_index = Some("abc".into());
        assert_eq!(r.sequence_number(), 0);
    }

    #[test]
    fn test_with_context_fills_only_missing() {
        let mut r = record(FrameType::Light, "300.0s", at(2022, 3, 9, 2, 0, 0));
        r.telescope = Some("EdgeHD8".into());

        let context = SetContext {
            telescope: Some("RedCat51".into()),
            filter: Some("BaaderMoon".into()),
            camera: Some("ASI533MC".into()),
            dark_flat: false,
        };
        let enriched = r.with_context(&context);

        assert_eq!(enriched.telescope.as_deref(), Some("EdgeHD8"));
        assert_eq!(enriched.filter.as_deref(), Some("BaaderMoon"));
        assert_eq!(enriched.camera.as_deref(), Some("ASI533MC"));
        assert_eq!(enriched.source_path(), r.source_path());
        // 元のレコードは変更されない
        assert!(r.filter.is_none());
    }

    #[test]
    fn test_frame_type_from_str() {
        assert_eq!("light".parse::<FrameType>().unwrap(), FrameType::Light);
        assert_eq!("DARK".parse::<FrameType>().unwrap(), FrameType::Dark);
        assert!("snapshot".parse::<FrameType>().is_err());
        assert_eq!(FrameType::from_token("light"), None);
        assert_eq!(FrameType::from_token("Bias"), Some(FrameType::Bias));
    }
}
