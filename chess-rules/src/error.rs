//! 错误类型定义

use thiserror::Error;

/// 规则引擎错误
///
/// 只用于格式错误的输入；非法走子等规则拒绝通过 `false` 返回，不算错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// 坐标超出 8x8 棋盘
    #[error("Position out of bounds: ({row}, {col})")]
    OutOfBounds { row: i32, col: i32 },

    /// 无效的代数记号格子（如 "e9"）
    #[error("Invalid square: {square:?}")]
    InvalidSquare { square: String },

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },

    /// 无效的升变棋子
    #[error("Invalid promotion kind: {kind:?}")]
    InvalidPromotionKind { kind: String },
}

impl ChessError {
    pub(crate) fn invalid_fen(reason: impl Into<String>) -> Self {
        ChessError::InvalidFen {
            reason: reason.into(),
        }
    }
}

/// 规则引擎操作结果类型
pub type Result<T> = std::result::Result<T, ChessError>;
