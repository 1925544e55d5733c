//! 国际象棋规则引擎命令行工具
//!
//! 包含:
//! - 局面查询、走子和走法计数命令
//! - FEN 存档管理
//! - 配置文件

pub mod commands;
pub mod config;
pub mod storage;

pub use commands::{PerftReport, StatusReport};
pub use config::CliConfig;
pub use storage::{SavedGameInfo, StorageManager};
