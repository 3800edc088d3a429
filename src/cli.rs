use astro_sort_common::FrameType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "astro-sort")]
#[command(about = "天体写真フレームの自動振り分けツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// フレームを解析して整理先ディレクトリへ移動
    Organize {
        /// 整理するフォルダ（整理先のルートを兼ねる）
        #[arg(required = true)]
        folder: PathBuf,

        /// ドライラン（移動せずに予定を表示）
        #[arg(long)]
        dry_run: bool,

        /// 後片付け（サムネイル・空フォルダ削除）を行わない
        #[arg(long)]
        no_cleanup: bool,

        /// 処理する種別を限定 (dark/flat/light/bias)
        #[arg(long, value_delimiter = ',')]
        only: Vec<FrameType>,
    },

    /// ファイル名の解析結果と整理先を表示（移動しない）
    Inspect {
        /// 対象ファイル
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// サムネイルと空フォルダを削除
    Clean {
        /// 対象フォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// ドライラン（削除せずに予定を表示）
        #[arg(long)]
        dry_run: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 鏡筒を追加
        #[arg(long)]
        add_telescope: Option<String>,

        /// フィルターを追加
        #[arg(long)]
        add_filter: Option<String>,

        /// カメラを追加
        #[arg(long)]
        add_camera: Option<String>,
    },
}
