//! 局面存档
//!
//! 每个存档是一个单行 FEN 文件，文件名为 `<时间戳>_<名称>.fen`。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chess_rules::GameState;
use chrono::{DateTime, Utc};

/// 存档文件扩展名
const SAVE_EXTENSION: &str = "fen";

/// 时间戳前缀格式
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 存储管理器
pub struct StorageManager {
    saves_dir: PathBuf,
}

impl StorageManager {
    /// 使用系统数据目录创建存储管理器
    pub fn new() -> Result<Self> {
        Self::with_dir(get_saves_directory()?)
    }

    /// 使用指定目录创建存储管理器
    pub fn with_dir(saves_dir: impl Into<PathBuf>) -> Result<Self> {
        let saves_dir = saves_dir.into();

        // 确保目录存在
        if !saves_dir.exists() {
            fs::create_dir_all(&saves_dir)
                .with_context(|| format!("Failed to create saves directory: {:?}", saves_dir))?;
        }

        Ok(Self { saves_dir })
    }

    /// 保存局面，返回存档 ID（文件名）
    ///
    /// 写入前会先校验 FEN，写入的是规范化后的 FEN。
    pub fn save_game(&self, name: &str, fen: &str) -> Result<String> {
        let game = GameState::from_fen_str(fen)
            .with_context(|| format!("Refusing to save invalid FEN: {}", fen))?;

        let filename = generate_filename(&Utc::now(), name);
        let filepath = self.saves_dir.join(&filename);

        fs::write(&filepath, format!("{}\n", game.to_fen()))
            .with_context(|| format!("Failed to write save file: {:?}", filepath))?;

        tracing::info!("Saved game {}", filename);
        Ok(filename)
    }

    /// 读取存档中的 FEN
    pub fn load_fen(&self, game_id: &str) -> Result<String> {
        let filepath = self.save_path(game_id)?;
        if !filepath.exists() {
            anyhow::bail!("Save file not found: {}", game_id);
        }

        let content = fs::read_to_string(&filepath)
            .with_context(|| format!("Failed to read save file: {:?}", filepath))?;
        let fen = content.lines().next().unwrap_or_default().trim();
        if fen.is_empty() {
            anyhow::bail!("Save file is empty: {}", game_id);
        }
        Ok(fen.to_string())
    }

    /// 读取存档并恢复对局
    pub fn load_game(&self, game_id: &str) -> Result<GameState> {
        let fen = self.load_fen(game_id)?;
        GameState::from_fen_str(&fen)
            .with_context(|| format!("Failed to parse save file: {}", game_id))
    }

    /// 按存档 ID 或名称查找存档
    ///
    /// 名称匹配多个存档时返回最新的一个。
    pub fn find_game(&self, name_or_id: &str) -> Result<Option<String>> {
        if self.save_path(name_or_id).is_ok_and(|path| path.is_file()) {
            return Ok(Some(name_or_id.to_string()));
        }

        let name = sanitize_filename(name_or_id);
        Ok(self
            .list_saved_games()?
            .into_iter()
            .find(|info| info.name == name)
            .map(|info| info.game_id))
    }

    /// 列出所有存档，最新的在前
    pub fn list_saved_games(&self) -> Result<Vec<SavedGameInfo>> {
        let mut games = Vec::new();

        if !self.saves_dir.exists() {
            return Ok(games);
        }

        let entries = fs::read_dir(&self.saves_dir)
            .with_context(|| format!("Failed to read saves directory: {:?}", self.saves_dir))?;

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            // 跳过损坏的存档
            let fen = match self.load_fen(filename) {
                Ok(fen) if GameState::from_fen_str(&fen).is_ok() => fen,
                Ok(_) | Err(_) => {
                    tracing::warn!("Skipping unreadable save file {}", filename);
                    continue;
                }
            };

            let saved_at = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());

            games.push(SavedGameInfo {
                game_id: filename.to_string(),
                name: name_from_filename(filename),
                saved_at,
                fen,
            });
        }

        // 按保存时间倒序，同一时间按文件名倒序
        games.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then_with(|| b.game_id.cmp(&a.game_id))
        });
        Ok(games)
    }

    /// 删除存档
    pub fn delete_game(&self, game_id: &str) -> Result<()> {
        let filepath = self.save_path(game_id)?;

        if filepath.exists() {
            fs::remove_file(&filepath)
                .with_context(|| format!("Failed to delete save file: {:?}", filepath))?;
            tracing::info!("Deleted game {}", game_id);
        }

        Ok(())
    }

    /// 获取存储目录路径
    pub fn saves_directory(&self) -> &Path {
        &self.saves_dir
    }

    fn save_path(&self, game_id: &str) -> Result<PathBuf> {
        if game_id.is_empty() || game_id.contains(['/', '\\']) || game_id.starts_with('.') {
            anyhow::bail!("Invalid save id: {:?}", game_id);
        }
        Ok(self.saves_dir.join(game_id))
    }
}

/// 存档信息
#[derive(Debug, Clone)]
pub struct SavedGameInfo {
    /// 存档 ID（文件名）
    pub game_id: String,
    /// 保存时使用的名称
    pub name: String,
    /// 保存时间
    pub saved_at: DateTime<Utc>,
    /// 局面
    pub fen: String,
}

/// 获取跨平台存储目录
fn get_saves_directory() -> Result<PathBuf> {
    let app_data_dir = dirs::data_dir().context("Cannot determine application data directory")?;

    Ok(app_data_dir.join("chess-rules").join("saves"))
}

/// 生成文件名
fn generate_filename(timestamp: &DateTime<Utc>, name: &str) -> String {
    let timestamp_str = timestamp.format(TIMESTAMP_FORMAT).to_string();
    let mut clean_name = sanitize_filename(name);
    if clean_name.is_empty() {
        clean_name = "game".to_string();
    }
    format!("{}_{}.{}", timestamp_str, clean_name, SAVE_EXTENSION)
}

/// 从文件名还原存档名称
fn name_from_filename(filename: &str) -> String {
    let stem = filename
        .strip_suffix(SAVE_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(filename);

    // 时间戳形如 20260109_153022，共 15 个字符
    let is_timestamp = stem.get(..16).is_some_and(|prefix| {
        prefix.ends_with('_')
            && prefix.bytes().take(15).all(|b| b.is_ascii_digit() || b == b'_')
    });
    if is_timestamp {
        stem[16..].to_string()
    } else {
        stem.to_string()
    }
}

/// 清理文件名中的特殊字符
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches(['_', '.'])
        .to_string()
}
