//! Astro Sort Common Library
//!
//! 撮影ファイル名の解析、キャプチャセット分割、整理先パス決定の共通ロジック（I/Oなし）

pub mod error;
pub mod grouper;
pub mod parser;
pub mod path;
pub mod types;

pub use error::{Error, Result};
pub use grouper::{capture_sets, CaptureSets, Sequenced};
pub use parser::FilenameParser;
pub use path::{target_directory, target_path};
pub use types::{CaptureRecord, FrameType, SetContext, DARK_FLAT_MAX_EXPOSURE_SECS};
