//! FEN 格式解析和生成
//!
//! 国际象棋 FEN 格式：
//! `<棋盘> <走子方> <易位权> <过路兵目标格> <半回合计数> <回合数>`
//!
//! 示例：
//! `rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1`
//!
//! 前四个字段必填，后两个字段缺省为 `0` 和 `1`。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::{KINGSIDE_ROOK_COL, KING_START_COL, QUEENSIDE_ROOK_COL};
use crate::error::{ChessError, Result};
use crate::piece::{Color, Piece, PieceKind, Position};

/// 易位权
///
/// 不单独保存，由棋盘上王和车的走动标记实时推导。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    /// 从棋盘推导易位权：王和对应角上的车都在原位且未走动
    pub fn from_board(board: &Board) -> Self {
        Self {
            white_kingside: Self::pair_unmoved(board, Color::White, KINGSIDE_ROOK_COL),
            white_queenside: Self::pair_unmoved(board, Color::White, QUEENSIDE_ROOK_COL),
            black_kingside: Self::pair_unmoved(board, Color::Black, KINGSIDE_ROOK_COL),
            black_queenside: Self::pair_unmoved(board, Color::Black, QUEENSIDE_ROOK_COL),
        }
    }

    fn pair_unmoved(board: &Board, color: Color, rook_col: u8) -> bool {
        let row = color.home_row();
        let unmoved = |col: u8, kind: PieceKind| {
            board
                .get(Position::new_unchecked(row, col))
                .is_some_and(|p| p.kind == kind && p.color == color && !p.has_moved)
        };
        unmoved(KING_START_COL, PieceKind::King) && unmoved(rook_col, PieceKind::Rook)
    }

    /// 解析易位权字段（`KQkq` 的子集或 `-`）
    pub fn parse(field: &str) -> Result<Self> {
        let mut rights = Self::default();
        if field == "-" {
            return Ok(rights);
        }
        if field.is_empty() {
            return Err(ChessError::invalid_fen("Empty castling field"));
        }

        for c in field.chars() {
            let slot = match c {
                'K' => &mut rights.white_kingside,
                'Q' => &mut rights.white_queenside,
                'k' => &mut rights.black_kingside,
                'q' => &mut rights.black_queenside,
                _ => {
                    return Err(ChessError::invalid_fen(format!(
                        "Invalid castling character: {}",
                        c
                    )))
                }
            };
            if *slot {
                return Err(ChessError::invalid_fen(format!(
                    "Duplicate castling character: {}",
                    c
                )));
            }
            *slot = true;
        }

        Ok(rights)
    }

    fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    /// 按易位权重建王和车的走动标记
    ///
    /// 原位的车：对应易位权缺失即视为已走动；原位的王：两侧易位权都缺失即视为已走动。
    /// 不在原位的王和车一律视为已走动。
    pub fn apply_to_board(&self, board: &mut Board) {
        for (pos, piece) in board.all_pieces() {
            let home = piece.color.home_row();
            let has_moved = match piece.kind {
                PieceKind::King if pos.row() == home && pos.col() == KING_START_COL => {
                    !(self.kingside(piece.color) || self.queenside(piece.color))
                }
                PieceKind::Rook if pos.row() == home && pos.col() == KINGSIDE_ROOK_COL => {
                    !self.kingside(piece.color)
                }
                PieceKind::Rook if pos.row() == home && pos.col() == QUEENSIDE_ROOK_COL => {
                    !self.queenside(piece.color)
                }
                PieceKind::King | PieceKind::Rook => true,
                PieceKind::Pawn => pos.row() != piece.color.pawn_row(),
                _ => false,
            };
            board.set(pos, Some(Piece { has_moved, ..piece }));
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut field = String::new();
        if self.white_kingside {
            field.push('K');
        }
        if self.white_queenside {
            field.push('Q');
        }
        if self.black_kingside {
            field.push('k');
        }
        if self.black_queenside {
            field.push('q');
        }
        if field.is_empty() {
            field.push('-');
        }
        f.write_str(&field)
    }
}

/// FEN 描述的完整局面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenRecord {
    /// 棋盘（王和车的走动标记已按易位权重建）
    pub board: Board,
    /// 当前走子方
    pub turn: Color,
    /// 易位权
    pub castling: CastlingRights,
    /// 过路兵目标格
    pub en_passant: Option<Position>,
    /// 半回合计数（五十回合规则）
    pub halfmove_clock: u32,
    /// 回合数（黑方走完后 +1）
    pub fullmove_number: u32,
}

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串
    pub fn parse(fen: &str) -> Result<FenRecord> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(ChessError::invalid_fen(format!(
                "Expected at least 4 fields, got {}",
                parts.len()
            )));
        }
        if parts.len() > 6 {
            return Err(ChessError::invalid_fen(format!(
                "Expected at most 6 fields, got {}",
                parts.len()
            )));
        }

        let mut board = Board::from_fen_board_field(parts[0])?;

        let turn = Self::parse_turn(parts[1])?;

        let castling = CastlingRights::parse(parts[2])?;
        castling.apply_to_board(&mut board);

        let en_passant = match parts[3] {
            "-" => None,
            square => Some(Position::from_algebraic(square).map_err(|_| {
                ChessError::invalid_fen(format!("Invalid en passant square: {}", square))
            })?),
        };

        let halfmove_clock = match parts.get(4) {
            Some(field) => Self::parse_counter(field, "halfmove clock")?,
            None => 0,
        };
        let fullmove_number = match parts.get(5) {
            Some(field) => Self::parse_counter(field, "fullmove number")?,
            None => 1,
        };

        Ok(FenRecord {
            board,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    fn parse_turn(field: &str) -> Result<Color> {
        let mut chars = field.chars();
        match (chars.next().and_then(Color::from_fen_char), chars.next()) {
            (Some(color), None) => Ok(color),
            _ => Err(ChessError::invalid_fen(format!(
                "Invalid active color: {}",
                field
            ))),
        }
    }

    fn parse_counter(field: &str, name: &str) -> Result<u32> {
        field
            .parse()
            .map_err(|_| ChessError::invalid_fen(format!("Invalid {}: {}", name, field)))
    }

    /// 将局面转换为 FEN 字符串
    pub fn to_string(record: &FenRecord) -> String {
        let en_passant = record
            .en_passant
            .map_or_else(|| "-".to_string(), |pos| pos.to_string());
        format!(
            "{} {} {} {} {} {}",
            record.board.to_fen_board_field(),
            record.turn.to_fen_char(),
            record.castling,
            en_passant,
            record.halfmove_clock,
            record.fullmove_number
        )
    }

    /// 标准初始局面
    pub fn initial() -> FenRecord {
        let board = Board::initial();
        FenRecord {
            castling: CastlingRights::from_board(&board),
            board,
            turn: Color::White,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}
