//! 整理先パスの決定
//!
//! レコードの現在の値だけから整理先ディレクトリ名を組み立てる純粋関数群。
//! 同じ値のレコードからは常に同じパスが得られる。

use crate::types::{CaptureRecord, FrameType};
use std::path::PathBuf;

/// セグメント区切り
const SEGMENT_DELIMITER: &str = "_";

/// Lightに温度セグメントを付ける旧形式の拡張子
pub const LEGACY_EXTENSION: &str = "cr2";

/// 旧形式の温度トークンから除く接尾辞
const LEGACY_TEMP_SUFFIX: &str = "C";

/// ディレクトリ名のセグメント列
#[derive(Debug, Default)]
struct Segments(Vec<String>);

impl Segments {
    fn new(marker: &str) -> Self {
        Self(vec![marker.to_string()])
    }

    fn push(&mut self, value: impl Into<String>) -> &mut Self {
        self.0.push(value.into());
        self
    }

    /// `<LABEL>_<value>`（値がなければ何も追加しない）
    fn labeled(&mut self, label: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.0.push(format!("{}{}{}", label, SEGMENT_DELIMITER, value));
        }
        self
    }

    /// ISOがあればISO、なければゲイン
    fn iso_or_gain(&mut self, record: &CaptureRecord) -> &mut Self {
        if record.iso.is_some() {
            self.labeled("ISO", record.iso.as_deref())
        } else {
            self.labeled("GAIN", record.gain.as_deref())
        }
    }

    fn join(&self) -> String {
        self.0.join(SEGMENT_DELIMITER)
    }
}

/// 整理先ディレクトリ名
pub fn target_directory(record: &CaptureRecord) -> String {
    let flatset = record.flatset_id();
    let month = record.month_key();

    match record.frame_type {
        FrameType::Dark if record.dark_flat => Segments::new("DarkFlat")
            .labeled("FLATSET", Some(flatset.as_str()))
            .iso_or_gain(record)
            .labeled("EXP", Some(record.exposure.as_str()))
            .labeled("Bin", record.binning.as_deref())
            .labeled("CAMERA", record.camera.as_deref())
            .join(),
        FrameType::Dark => Segments::new("Dark")
            .iso_or_gain(record)
            .labeled("EXP", Some(record.exposure.as_str()))
            .labeled("TEMP", record.sensor_temp.as_deref())
            .labeled("CAMERA", record.camera.as_deref())
            .labeled("MONTH", Some(month.as_str()))
            .join(),
        FrameType::Flat => Segments::new("Flat")
            .labeled("FLATSET", Some(flatset.as_str()))
            .iso_or_gain(record)
            .labeled("EXP", Some(record.exposure.as_str()))
            .labeled("Bin", record.binning.as_deref())
            .labeled("TELESCOPE", record.telescope.as_deref())
            .labeled("FILTER", record.filter.as_deref())
            .labeled("CAMERA", record.camera.as_deref())
            .join(),
        FrameType::Light => {
            let mut segments = Segments::new("Light");
            if let Some(target) = &record.target {
                segments.push(target.as_str());
            }
            if let Some(pane) = &record.mosaic_pane {
                segments.push(pane.as_str());
            }
            segments
                .labeled("FLATSET", Some(flatset.as_str()))
                .iso_or_gain(record)
                .labeled("EXP", Some(record.exposure.as_str()))
                .labeled("Bin", record.binning.as_deref());
            if record.extension() == LEGACY_EXTENSION {
                let temp = record
                    .sensor_temp
                    .as_deref()
                    .map(|t| t.strip_suffix(LEGACY_TEMP_SUFFIX).unwrap_or(t));
                segments.labeled("TEMP", temp);
            }
            segments
                .labeled("TELESCOPE", record.telescope.as_deref())
                .labeled("FILTER", record.filter.as_deref())
                .labeled("CAMERA", record.camera.as_deref())
                .join()
        }
        FrameType::Bias => Segments::new("Bias")
            .iso_or_gain(record)
            .labeled("EXP", Some(record.exposure.as_str()))
            .labeled("Bin", record.binning.as_deref())
            .labeled("CAMERA", record.camera.as_deref())
            .labeled("MONTH", Some(month.as_str()))
            .join(),
    }
}

/// 整理先パス（整理ルートからの相対パス）
pub fn target_path(record: &CaptureRecord) -> PathBuf {
    PathBuf::from(target_directory(record)).join(record.file_name())
}
