//! 命令行工具配置
//!
//! 配置文件为 JSON，位于 `<config_dir>/chess-rules/config.json`。
//! 文件缺失或格式错误时使用默认配置，不会中断运行。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 命令行工具配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// 存档目录（为空时使用系统数据目录）
    pub saves_dir: Option<PathBuf>,
    /// 默认日志级别（`--verbose` 时改为 debug）
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            saves_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// 配置文件路径
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("chess-rules");
            path.push("config.json");
            path
        })
    }

    /// 从默认位置加载配置
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Config directory unavailable, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// 从指定文件加载配置
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::debug!("Loaded config: {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Invalid config file {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Cannot read config file {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Config directory unavailable")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// 保存到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Config saved: {:?}", path);
        Ok(())
    }
}
