//! 规则常量定义

/// 棋盘边长（行数、列数）
pub const BOARD_SIZE: usize = 8;

/// 初始局面 FEN
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// 王的初始列（e 列）
pub const KING_START_COL: u8 = 4;

/// 王翼车的初始列（h 列）
pub const KINGSIDE_ROOK_COL: u8 = 7;

/// 后翼车的初始列（a 列）
pub const QUEENSIDE_ROOK_COL: u8 = 0;

/// 王车易位后车所在列
pub const KINGSIDE_ROOK_TARGET_COL: u8 = 5;
pub const QUEENSIDE_ROOK_TARGET_COL: u8 = 3;

/// 五十回合规则：半回合计数达到该值即可判和
pub const FIFTY_MOVE_LIMIT: u32 = 100;
