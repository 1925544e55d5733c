//! 棋子与坐标定义

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::BOARD_SIZE;
use crate::error::{ChessError, Result};
use crate::rules::MoveRules;

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// 可升变的棋子类型
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// 小写代码字母（马为 `n`，避免与王的 `k` 冲突）
    pub fn code_char(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// 获取 FEN 字符（白方大写，黑方小写）
    pub fn to_fen_char(&self, color: Color) -> char {
        let c = self.code_char();
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<(PieceKind, Color)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some((kind, color))
    }

    /// 英文名称（小写）
    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    /// 解析升变选择：`queen`、`rook`、`bishop`、`knight`（不区分大小写）
    ///
    /// 也接受单字母简写 `q`、`r`、`b`、`n`。
    pub fn from_name(name: &str) -> Result<PieceKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "queen" | "q" => Ok(PieceKind::Queen),
            "rook" | "r" => Ok(PieceKind::Rook),
            "bishop" | "b" => Ok(PieceKind::Bishop),
            "knight" | "n" => Ok(PieceKind::Knight),
            _ => Err(ChessError::InvalidPromotionKind {
                kind: name.to_string(),
            }),
        }
    }

    /// 兵能否升变为该类型
    pub fn is_promotable(&self) -> bool {
        matches!(
            self,
            PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight
        )
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// 白方（先手，在下方，第 6、7 行）
    White,
    /// 黑方（后手，在上方，第 0、1 行）
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 获取 FEN 走子方字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// 从 FEN 走子方字符解析
    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// 兵前进方向（行号增量）
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// 底线所在行
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// 兵的初始行
    pub fn pawn_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// 兵升变所在行（对方底线）
    pub fn promotion_row(&self) -> u8 {
        self.opponent().home_row()
    }

    /// 吃过路兵时落点所在行
    pub fn en_passant_row(&self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 5,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    /// 是否走动过（王车易位依赖此标记）
    pub has_moved: bool,
}

impl Piece {
    /// 创建未走动过的棋子
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            color,
            has_moved: false,
        }
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        self.kind.to_fen_char(self.color)
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Piece> {
        PieceKind::from_fen_char(c).map(|(kind, color)| Piece::new(kind, color))
    }

    /// 两字母棋子代码，例如 `wp`、`bn`
    pub fn code(&self) -> String {
        let side = match self.color {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!("{}{}", side, self.kind.code_char())
    }

    /// 伪合法走法检查（不考虑己方王是否被将军）
    ///
    /// `en_passant` 为当前可吃过路兵的目标格。
    pub fn is_valid_move(
        &self,
        from: Position,
        to: Position,
        board: &Board,
        en_passant: Option<Position>,
    ) -> bool {
        MoveRules::is_valid_move(board, *self, from, to, en_passant)
    }
}

/// 棋盘坐标
///
/// 第 0 行为第 8 横线（黑方底线），第 7 行为第 1 横线（白方底线）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    /// 创建新位置，越界时返回 `OutOfBounds`
    pub fn new(row: i32, col: i32) -> Result<Self> {
        if Self::in_bounds(row, col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(ChessError::OutOfBounds { row, col })
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub(crate) const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    fn in_bounds(row: i32, col: i32) -> bool {
        let size = BOARD_SIZE as i32;
        (0..size).contains(&row) && (0..size).contains(&col)
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// 获取偏移后的位置
    pub fn offset(&self, drow: i8, dcol: i8) -> Option<Position> {
        let row = self.row as i32 + drow as i32;
        let col = self.col as i32 + dcol as i32;
        Self::new(row, col).ok()
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < BOARD_SIZE * BOARD_SIZE {
            Some(Self::new_unchecked(
                (index / BOARD_SIZE) as u8,
                (index % BOARD_SIZE) as u8,
            ))
        } else {
            None
        }
    }

    /// 按行优先顺序遍历全部 64 个格子
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE * BOARD_SIZE).filter_map(Position::from_index)
    }

    /// 从代数记号解析，例如 `e4`
    pub fn from_algebraic(square: &str) -> Result<Self> {
        let invalid = || ChessError::InvalidSquare {
            square: square.to_string(),
        };
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(invalid());
        }
        let col = file as u8 - b'a';
        let row = b'8' - rank as u8;
        Ok(Self::new_unchecked(row, col))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.col) as char;
        let rank = (b'8' - self.row) as char;
        write!(f, "{}{}", file, rank)
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_algebraic(s)
    }
}

impl TryFrom<(i32, i32)> for Position {
    type Error = ChessError;

    fn try_from((row, col): (i32, i32)) -> Result<Self> {
        Self::new(row, col)
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.row as i32, pos.col as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_bounds() {
        for row in 0..8 {
            for col in 0..8 {
                let pos = Position::new(row, col).unwrap();
                assert_eq!(pos.row() as i32, row);
                assert_eq!(pos.col() as i32, col);
            }
        }

        assert_eq!(
            Position::new(8, 0),
            Err(ChessError::OutOfBounds { row: 8, col: 0 })
        );
        assert_eq!(
            Position::new(0, -1),
            Err(ChessError::OutOfBounds { row: 0, col: -1 })
        );
        assert!(Position::new(-1, 3).is_err());
        assert!(Position::new(3, 8).is_err());
    }

    #[test]
    fn test_position_algebraic() {
        let e1 = Position::from_algebraic("e1").unwrap();
        assert_eq!((e1.row(), e1.col()), (7, 4));
        assert_eq!(e1.to_string(), "e1");

        let a8: Position = "a8".parse().unwrap();
        assert_eq!((a8.row(), a8.col()), (0, 0));

        assert!(Position::from_algebraic("i1").is_err());
        assert!(Position::from_algebraic("a9").is_err());
        assert!(Position::from_algebraic("e").is_err());
        assert!(Position::from_algebraic("e44").is_err());
    }

    #[test]
    fn test_position_offset() {
        let corner = Position::new(0, 0).unwrap();
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(1, 1), Some(Position::new(1, 1).unwrap()));
        assert_eq!(Position::new(7, 7).unwrap().offset(0, 1), None);
    }

    #[test]
    fn test_position_all() {
        let all: Vec<Position> = Position::all().collect();
        assert_eq!(all.len(), 64);
        assert_eq!(all[0], Position::new(0, 0).unwrap());
        assert_eq!(all[63], Position::new(7, 7).unwrap());
        assert_eq!(Position::from_index(64), None);
    }

    #[test]
    fn test_position_serde_rejects_out_of_range() {
        let pos = Position::new(6, 4).unwrap();
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(json, "[6,4]");
        assert_eq!(serde_json::from_str::<Position>(&json).unwrap(), pos);
        assert!(serde_json::from_str::<Position>("[8,0]").is_err());
    }

    #[test]
    fn test_piece_fen_char() {
        let white_king = Piece::new(PieceKind::King, Color::White);
        assert_eq!(white_king.to_fen_char(), 'K');

        let black_knight = Piece::new(PieceKind::Knight, Color::Black);
        assert_eq!(black_knight.to_fen_char(), 'n');

        assert_eq!(
            Piece::from_fen_char('R'),
            Some(Piece::new(PieceKind::Rook, Color::White))
        );
        assert_eq!(Piece::from_fen_char('x'), None);
    }

    #[test]
    fn test_piece_code() {
        assert_eq!(Piece::new(PieceKind::Knight, Color::White).code(), "wn");
        assert_eq!(Piece::new(PieceKind::King, Color::Black).code(), "bk");
        assert_eq!(Piece::new(PieceKind::Pawn, Color::Black).code(), "bp");
    }

    #[test]
    fn test_promotion_names() {
        assert_eq!(PieceKind::from_name("queen"), Ok(PieceKind::Queen));
        assert_eq!(PieceKind::from_name("Knight"), Ok(PieceKind::Knight));
        assert_eq!(PieceKind::from_name("r"), Ok(PieceKind::Rook));
        assert_eq!(
            PieceKind::from_name("king"),
            Err(ChessError::InvalidPromotionKind {
                kind: "king".to_string()
            })
        );
        assert!(!PieceKind::Pawn.is_promotable());
        assert!(PieceKind::PROMOTIONS.iter().all(|k| k.is_promotable()));
    }

    #[test]
    fn test_color_geometry() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::White.promotion_row(), 0);
        assert_eq!(Color::Black.promotion_row(), 7);
        assert_eq!(Color::White.forward(), -1);
        assert_eq!(Color::from_fen_char('b'), Some(Color::Black));
        assert_eq!(Color::from_fen_char('x'), None);
    }
}
