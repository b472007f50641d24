//! 設定ファイル（`meta.toml`）の読み込み
//!
//! どのセクションも省略でき、省略時は既定値を使います。

use super::error::MetaError;
use super::scatter::{ChartLayout, Margin};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 既定の設定ファイル名
pub const DEFAULT_CONFIG_FILE: &str = "meta.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaConfig {
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

impl MetaConfig {
    pub fn from_file(path: &Path) -> Result<Self, MetaError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, MetaError> {
        Ok(toml::from_str(content)?)
    }

    /// 明示されたパス、なければカレントディレクトリの`meta.toml`を読みます
    ///
    /// 明示されていないファイルが存在しない場合は既定値を返します。
    pub fn load(path: Option<&Path>) -> Result<Self, MetaError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let layout = ChartLayout::default();
        Self {
            width: layout.width,
            height: layout.height,
            margin_top: layout.margin.top,
            margin_right: layout.margin.right,
            margin_bottom: layout.margin.bottom,
            margin_left: layout.margin.left,
        }
    }
}

impl ChartConfig {
    pub fn layout(&self) -> ChartLayout {
        ChartLayout {
            width: self.width,
            height: self.height,
            margin: Margin {
                top: self.margin_top,
                right: self.margin_right,
                bottom: self.margin_bottom,
                left: self.margin_left,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// `owner/name` 形式のリポジトリ名（コミットURLに使う）
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetaConfig::from_toml("").unwrap();
        assert_eq!(config, MetaConfig::default());
        assert_eq!(config.chart.layout(), ChartLayout::default());
        assert!(config.dataset.repo.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = MetaConfig::from_toml(
            r#"
[chart]
width = 800
margin_left = 60

[dataset]
repo = "jktrn/portfolio"

[generate]
exclude = ["**/*.svg"]
"#,
        )
        .unwrap();

        let layout = config.chart.layout();
        assert_eq!(layout.width, 800.0);
        assert_eq!(layout.height, 500.0);
        assert_eq!(layout.left(), 60.0);
        assert_eq!(config.dataset.repo.as_deref(), Some("jktrn/portfolio"));
        assert_eq!(config.generate.exclude, vec!["**/*.svg".to_string()]);
        assert!(config.generate.include.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            MetaConfig::from_toml("[chart]\nwidth = \"wide\""),
            Err(MetaError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.toml");
        std::fs::write(&path, "[chart]\nheight = 300\n").unwrap();
        let config = MetaConfig::load(Some(&path)).unwrap();
        assert_eq!(config.chart.height, 300.0);
    }
}
