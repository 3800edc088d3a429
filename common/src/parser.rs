//! ファイル名パーサー
//!
//! 撮影機が出力するファイル名を `_` 区切りのトークン列に分解し、
//! 左から順に「条件が合えば1つ消費する」ステップで `CaptureRecord` を組み立てる。
//!
//! ```text
//! <Type>[_<Target>][_<Pane>]_<Exposure>[_Bin<N>][_<Camera>][_ISO<N>|_gain<N>]_<YYYYMMDD-HHMMSS>_<Temp>_<Seq>
//! ```
//!
//! 鏡筒・フィルター・カメラ・ダークフラットはトークン列ではなく、整理済みディレクトリ名の
//! マーカー（`TELESCOPE_<name>`, `FILTER_<name>`, `CAMERA_<name>`, `DarkFlat`）から復元する。
//! 整理ルートより上のディレクトリ名は見ない（`FilenameParser::parse_under`）。

use crate::error::{Error, Result};
use crate::types::{CaptureRecord, FrameType};
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::{Component, Path};

/// トークン区切り文字
pub const TOKEN_DELIMITER: char = '_';

/// 取り除く拡張子（大文字小文字は区別しない）
pub const KNOWN_EXTENSIONS: &[&str] = &["fit", "fits", "cr2"];

/// 撮影日時トークンの書式
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// ダークフラット整理先ディレクトリのマーカー
pub const DARK_FLAT_MARKER: &str = "DarkFlat";

const BINNING_PREFIX: &str = "Bin";
const ISO_PREFIX: &str = "ISO";
const GAIN_PREFIX: &str = "gain";

/// 変更不可なトークン列上のカーソル
struct TokenCursor<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    fn new(tokens: Vec<&'a str>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    /// 無条件に1つ消費
    fn next(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// 条件に一致した場合のみ消費
    fn next_if(&mut self, predicate: impl Fn(&str) -> bool) -> Option<&'a str> {
        match self.peek() {
            Some(token) if predicate(token) => {
                self.pos += 1;
                Some(token)
            }
            _ => None,
        }
    }

    /// 接頭辞に一致した場合のみ消費し、接頭辞を除いた値を返す
    fn next_prefixed(&mut self, prefix: &str) -> Option<&'a str> {
        self.next_if(|t| t.starts_with(prefix))
            .map(|t| &t[prefix.len()..])
    }
}

/// ファイル名をトークン列に分解（既知の拡張子は除去）
pub fn tokenize(file_name: &str) -> Vec<&str> {
    strip_known_extension(file_name)
        .split(TOKEN_DELIMITER)
        .collect()
}

fn strip_known_extension(file_name: &str) -> &str {
    if let Some((stem, ext)) = file_name.rsplit_once('.') {
        if KNOWN_EXTENSIONS.iter().any(|k| k.eq_ignore_ascii_case(ext)) {
            return stem;
        }
    }
    file_name
}

fn is_mosaic_pane(token: &str) -> bool {
    lazy_static::lazy_static! {
        static ref PANE_RE: Regex = Regex::new(r"^\d+-\d+$").unwrap();
    }
    PANE_RE.is_match(token)
}

/// マーカーを探すディレクトリ名（ファイルに近い順）
fn marker_directories(scope: &Path) -> Vec<String> {
    let mut dirs: Vec<String> = scope
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    dirs.reverse();
    dirs
}

/// ディレクトリ名から `<LABEL>_<value>` の値を取り出す
///
/// 値は次に来るラベルの直前、なければ名前の末尾まで（値に `_` を含んでよい）。
fn path_marker(dirs: &[String], marker: &Regex) -> Option<String> {
    dirs.iter()
        .find_map(|dir| marker.captures(dir).map(|caps| caps[1].to_string()))
}

fn is_dark_flat_directory(dir: &str) -> bool {
    dir == DARK_FLAT_MARKER
        || dir
            .strip_prefix(DARK_FLAT_MARKER)
            .is_some_and(|rest| rest.starts_with(TOKEN_DELIMITER))
}

/// 設定済みカメラ一覧を持つファイル名パーサー
#[derive(Debug, Clone, Default)]
pub struct FilenameParser {
    cameras: Vec<String>,
}

impl FilenameParser {
    pub fn new<I, S>(cameras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cameras: cameras.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cameras(&self) -> &[String] {
        &self.cameras
    }

    /// パスから `CaptureRecord` を生成（マーカーはパス中の全ディレクトリから探す）
    ///
    /// トークンの過不足は検証しない。順序がずれた場合は後続の項目に値がずれて入る。
    /// 失敗するのは種別トークンが不明な場合と、露出・撮影日時が欠けているか
    /// 日時の書式が合わない場合のみ。
    pub fn parse(&self, path: &Path) -> Result<CaptureRecord> {
        self.parse_with_markers(path, path)
    }

    /// `root` より下のディレクトリからだけマーカーを読んで生成
    ///
    /// `root` の外にあるパスは `parse` と同じ扱い。
    pub fn parse_under(&self, root: &Path, path: &Path) -> Result<CaptureRecord> {
        let scope = path.strip_prefix(root).unwrap_or(path);
        self.parse_with_markers(path, scope)
    }

    fn parse_with_markers(&self, path: &Path, marker_scope: &Path) -> Result<CaptureRecord> {
        lazy_static::lazy_static! {
            static ref TELESCOPE_RE: Regex =
                Regex::new(r"(?:^|_)TELESCOPE_(.+?)(?:_FILTER_|_CAMERA_|$)").unwrap();
            static ref FILTER_RE: Regex =
                Regex::new(r"(?:^|_)FILTER_(.+?)(?:_CAMERA_|$)").unwrap();
            static ref CAMERA_RE: Regex =
                Regex::new(r"(?:^|_)CAMERA_(.+?)(?:_MONTH_|$)").unwrap();
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
        let dirs = marker_directories(marker_scope);

        let mut cursor = TokenCursor::new(tokenize(&file_name));

        let type_token = cursor.next().unwrap_or_default();
        let frame_type = FrameType::from_token(type_token)
            .ok_or_else(|| Error::UnknownFrameType(type_token.to_string()))?;

        let target = if frame_type == FrameType::Light {
            Some(cursor.next().ok_or(Error::MissingToken("target"))?)
        } else {
            None
        };
        let mosaic_pane = cursor.next_if(is_mosaic_pane);

        let exposure = cursor.next().ok_or(Error::MissingToken("exposure"))?;
        let binning = cursor.next_prefixed(BINNING_PREFIX);
        let camera = cursor.next_if(|t| self.cameras.iter().any(|c| c == t));
        let iso = cursor.next_prefixed(ISO_PREFIX);
        let gain = cursor.next_prefixed(GAIN_PREFIX);

        let timestamp = cursor.next().ok_or(Error::MissingToken("timestamp"))?;
        let captured_at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|source| Error::InvalidTimestamp {
                token: timestamp.to_string(),
                source,
            })?;

        let sensor_temp = cursor.next();
        let sequence_index = cursor.next();

        let mut record = CaptureRecord::new(path, frame_type, exposure, captured_at)?;
        record.target = target.map(str::to_string);
        record.mosaic_pane = mosaic_pane.map(str::to_string);
        record.binning = binning.map(str::to_string);
        record.iso = iso.map(str::to_string);
        record.gain = gain.map(str::to_string);
        record.sensor_temp = sensor_temp.map(str::to_string);
        record.sequence_index = sequence_index.map(str::to_string);

        // パス埋め込みマーカー（トークンは消費しない）
        record.telescope = path_marker(&dirs, &TELESCOPE_RE);
        record.filter = path_marker(&dirs, &FILTER_RE);
        record.camera = camera
            .map(str::to_string)
            .or_else(|| path_marker(&dirs, &CAMERA_RE));
        record.dark_flat = dirs.iter().any(|d| is_dark_flat_directory(d));

        Ok(record)
    }
}
