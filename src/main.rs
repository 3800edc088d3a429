use astro_sort::{cleanup, cli, config, error, organizer, prompt, relocator, scanner};
use astro_sort_common::{target_directory, CaptureRecord, FilenameParser};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use organizer::{OrganizeReport, Organizer};
use prompt::DialoguerPrompter;
use relocator::Relocator;
use serde::Serialize;

/// inspectの出力行
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectRow {
    record: CaptureRecord,
    flatset_id: String,
    month_key: String,
    dark_flat_candidate: Option<bool>,
    target_directory: String,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "astro_sort=debug,astro_sort_common=debug"
    } else {
        "astro_sort=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &OrganizeReport, dry_run: bool) {
    println!("  セット数: {}", report.sets);
    if dry_run {
        println!("  移動予定: {}", report.would_move);
    } else {
        println!("  移動: {}", report.moved);
    }
    println!("  整理済み: {}", report.already_organized);
    println!("  既存のためスキップ: {}", report.skipped_existing);
    println!("  見送ったセット: {}", report.declined_sets);

    if !report.parse_failures.is_empty() {
        println!("  ⚠ 解析できなかったファイル: {}件", report.parse_failures.len());
        for failure in &report.parse_failures {
            println!("    - {} ({})", failure.path.display(), failure.reason);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Organize { folder, dry_run, no_cleanup, only } => {
            println!("🔭 astro-sort - フレーム整理{}\n", if dry_run { " (ドライラン)" } else { "" });

            // 1. スキャン
            println!("[1/3] フレームをスキャン中...");
            let frames = scanner::scan_folder(&folder)?;
            println!("✔ {}件のフレームを検出\n", frames.len());

            if frames.is_empty() {
                return Err(error::AstroSortError::NoFramesFound(
                    folder.display().to_string()
                ));
            }

            // 2. セットごとに整理
            println!("[2/3] セットごとに整理中...");
            let thumbnail_suffix = config.thumbnail_suffix.clone();
            let mut organizer = Organizer::new(
                folder.clone(),
                config,
                Relocator::new(dry_run),
                DialoguerPrompter::new(),
            )
            .only(&only);
            let report = organizer.organize(&frames)?;
            println!("\n✔ 整理結果");
            print_report(&report, dry_run);

            // 3. 後片付け
            if no_cleanup {
                println!("\n[3/3] 後片付けをスキップ");
            } else {
                println!("\n[3/3] 後片付け中...");
                let cleaned = cleanup::clean(&folder, &thumbnail_suffix, dry_run)?;
                println!(
                    "✔ サムネイル {}件・空フォルダ {}件{}",
                    cleaned.thumbnails_removed.len(),
                    cleaned.directories_removed.len(),
                    if dry_run { "を削除予定" } else { "を削除" }
                );
            }

            println!("\n✅ 整理完了");
        }

        Commands::Inspect { files, json } => {
            let parser = FilenameParser::new(config.cameras.iter().cloned());
            let mut rows = Vec::new();

            for file in &files {
                match parser.parse(file) {
                    Ok(record) => rows.push(InspectRow {
                        flatset_id: record.flatset_id(),
                        month_key: record.month_key(),
                        dark_flat_candidate: record.is_dark_flat_candidate().ok(),
                        target_directory: target_directory(&record),
                        record,
                    }),
                    Err(e) => eprintln!("⚠ {}: {}", file.display(), e),
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{}", row.record.file_name());
                    println!("  種別: {}", row.record.frame_type);
                    println!("  撮影日時: {}", row.record.captured_at);
                    println!("  フラットセット: {}", row.flatset_id);
                    println!("  月: {}", row.month_key);
                    match row.dark_flat_candidate {
                        Some(candidate) => println!("  ダークフラット候補: {}", candidate),
                        None => println!("  ダークフラット候補: 判定不可（露出単位が不明）"),
                    }
                    println!("  整理先: {}", row.target_directory);
                }
            }
        }

        Commands::Clean { folder, dry_run } => {
            println!("🧹 astro-sort - 後片付け{}\n", if dry_run { " (ドライラン)" } else { "" });

            if !folder.exists() {
                return Err(error::AstroSortError::FolderNotFound(folder.display().to_string()));
            }
            let cleaned = cleanup::clean(&folder, &config.thumbnail_suffix, dry_run)?;
            for path in &cleaned.thumbnails_removed {
                println!("  - {}", path.display());
            }
            for path in &cleaned.directories_removed {
                println!("  - {}/", path.display());
            }
            println!(
                "\n✅ サムネイル {}件・空フォルダ {}件",
                cleaned.thumbnails_removed.len(),
                cleaned.directories_removed.len()
            );
        }

        Commands::Config { show, add_telescope, add_filter, add_camera } => {
            let mut config = config;
            let mut changed = false;

            if let Some(name) = add_telescope {
                changed |= config.add_telescope(name)?;
            }
            if let Some(name) = add_filter {
                changed |= config.add_filter(name)?;
            }
            if let Some(name) = add_camera {
                changed |= config.add_camera(name)?;
            }

            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("設定:");
                println!("  鏡筒: {}", config.telescopes.join(", "));
                println!("  フィルター: {}", config.filters.join(", "));
                println!("  カメラ: {}", config.cameras.join(", "));
                println!("  サムネイル接尾辞: {}", config.thumbnail_suffix);
            }
        }
    }

    Ok(())
}
