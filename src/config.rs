use crate::error::{AstroSortError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 設定ファイルの場所を上書きする環境変数
pub const CONFIG_ENV: &str = "ASTRO_SORT_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 選択肢に出す鏡筒
    pub telescopes: Vec<String>,
    /// 選択肢に出すフィルター
    pub filters: Vec<String>,
    /// ファイル名トークンとして認識するカメラ
    pub cameras: Vec<String>,
    /// 後処理で削除するサムネイルの接尾辞
    pub thumbnail_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default_config())
        }
    }

    /// 指定ファイルから読み込む（省略した項目は既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            AstroSortError::Config(format!("{} の形式が不正です: {}", path.display(), e))
        })?;
        config
            .validate()
            .map_err(|e| AstroSortError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// 整理先のディレクトリ名に埋め込めない値がないか
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.telescopes
            .iter()
            .chain(&self.filters)
            .chain(&self.cameras)
            .try_for_each(|name| check_name(name))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        // 環境変数を優先
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| AstroSortError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("astro-sort").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            telescopes: vec!["RedCat51".into(), "EdgeHD8".into()],
            filters: vec!["NoFilter".into(), "BaaderMoon".into(), "LPro".into(), "LeXtreme".into()],
            cameras: vec!["ASI533MC".into(), "ASI2600MC".into(), "ASI294MC".into()],
            thumbnail_suffix: "_thn.jpg".into(),
        }
    }

    pub fn add_telescope(&mut self, name: String) -> Result<bool> {
        push_unique(&mut self.telescopes, name)
    }

    pub fn add_filter(&mut self, name: String) -> Result<bool> {
        push_unique(&mut self.filters, name)
    }

    pub fn add_camera(&mut self, name: String) -> Result<bool> {
        push_unique(&mut self.cameras, name)
    }
}

/// 空の名前とパス区切りを含む名前は使えない
fn check_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("空の名前は使えません".into());
    }
    if name.contains(['/', '\\']) {
        return Err(format!("名前にパス区切りは使えません: {}", name));
    }
    Ok(())
}

/// 重複しなければ追加（追加したらtrue）
fn push_unique(list: &mut Vec<String>, name: String) -> Result<bool> {
    check_name(&name).map_err(AstroSortError::Config)?;
    if list.iter().any(|n| *n == name) {
        return Ok(false);
    }
    list.push(name);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_choices() {
        let config = Config::default();
        assert!(!config.telescopes.is_empty());
        assert!(!config.filters.is_empty());
        assert!(!config.cameras.is_empty());
        assert_eq!(config.thumbnail_suffix, "_thn.jpg");
    }

    #[test]
    fn test_add_deduplicates() {
        let mut config = Config::default();
        assert!(config.add_camera("ASI183MM".into()).unwrap());
        assert!(!config.add_camera("ASI183MM".into()).unwrap());
        assert!(!config.add_telescope("RedCat51".into()).unwrap());
        assert!(config.add_filter("Ha7nm".into()).unwrap());
        assert!(config.add_telescope("Sky_Watcher".into()).unwrap());
    }

    #[test]
    fn test_add_rejects_path_separators() {
        let mut config = Config::default();
        assert!(matches!(config.add_filter("Ha/OIII".into()), Err(AstroSortError::Config(_))));
        assert!(matches!(config.add_camera("ZWO\\ASI".into()), Err(AstroSortError::Config(_))));
        assert!(matches!(config.add_telescope("  ".into()), Err(AstroSortError::Config(_))));
        assert!(!config.filters.iter().any(|f| f == "Ha/OIII"));
    }

    #[test]
    fn test_load_from_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, AstroSortError::Config(ref m) if m.contains("config.json")));

        std::fs::write(&path, r#"{"filters": ["Ha/OIII"]}"#).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, AstroSortError::Config(ref m) if m.contains("Ha/OIII")));

        std::fs::write(&path, r#"{"telescopes": ["Sky_Watcher"]}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.telescopes, vec!["Sky_Watcher".to_string()]);
        assert_eq!(config.thumbnail_suffix, "_thn.jpg");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"telescopes": ["Esprit100"]}"#).unwrap();
        assert_eq!(config.telescopes, vec!["Esprit100".to_string()]);
        assert_eq!(config.thumbnail_suffix, "_thn.jpg");
    }
}
