//! 国际象棋规则引擎
//!
//! 包含:
//! - 棋子、棋盘、位置等核心数据结构
//! - 伪合法走法规则与将军判定
//! - 对局状态：选子流程、王的安全、王车易位、吃过路兵、兵升变
//! - 将死与逼和判定
//! - FEN 读写
//! - 状态变更通知
//! - perft 走法计数

mod board;
mod constants;
mod error;
mod event;
mod fen;
mod game;
mod perft;
mod piece;
mod rules;

pub use board::Board;
pub use constants::*;
pub use error::{ChessError, Result};
pub use event::{GameEvent, Listener};
pub use fen::{CastlingRights, Fen, FenRecord};
pub use game::{GameState, GameStatus};
pub use perft::{divide, perft};
pub use piece::{Color, Piece, PieceKind, Position};
pub use rules::MoveRules;
