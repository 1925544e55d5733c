//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::error::{ChessError, Result};
use crate::piece::{Color, Piece, PieceKind, Position};

/// 后排棋子顺序（a 列到 h 列）
const BACK_RANK: [PieceKind; BOARD_SIZE] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// 8x8 棋盘，`squares[row][col]`，第 0 行为第 8 横线
    squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();

        for color in [Color::White, Color::Black] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.set(
                    Position::new_unchecked(color.home_row(), col as u8),
                    Some(Piece::new(*kind, color)),
                );
                board.set(
                    Position::new_unchecked(color.pawn_row(), col as u8),
                    Some(Piece::new(PieceKind::Pawn, color)),
                );
            }
        }

        board
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Position) -> Option<Piece> {
        self.squares[pos.row() as usize][pos.col() as usize]
    }

    /// 按行列读取棋子，越界返回 `None`
    pub fn piece_at(&self, row: i32, col: i32) -> Option<Piece> {
        Position::new(row, col).ok().and_then(|pos| self.get(pos))
    }

    /// 设置指定位置的棋子
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        self.squares[pos.row() as usize][pos.col() as usize] = piece;
    }

    /// 清空棋盘
    pub fn clear(&mut self) {
        self.squares = [[None; BOARD_SIZE]; BOARD_SIZE];
    }

    /// 格子是否为空
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// 移动棋子（不检查规则），返回被覆盖的棋子
    ///
    /// 被移动的棋子会标记为已走动。
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<Piece> {
        let piece = self.get(from).map(|mut piece| {
            piece.has_moved = true;
            piece
        });
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, piece);
        captured
    }

    /// 查找指定阵营的王的位置
    pub fn find_king(&self, color: Color) -> Option<Position> {
        Position::all().find(|&pos| {
            self.get(pos)
                .is_some_and(|piece| piece.kind == PieceKind::King && piece.color == color)
        })
    }

    /// 获取指定阵营的所有棋子位置
    pub fn pieces(&self, color: Color) -> Vec<(Position, Piece)> {
        self.all_pieces()
            .into_iter()
            .filter(|(_, piece)| piece.color == color)
            .collect()
    }

    /// 获取所有棋子
    pub fn all_pieces(&self) -> Vec<(Position, Piece)> {
        Position::all()
            .filter_map(|pos| self.get(pos).map(|piece| (pos, piece)))
            .collect()
    }

    /// 转换为 FEN 棋盘字段
    pub fn to_fen_board_field(&self) -> String {
        let mut ranks = Vec::with_capacity(BOARD_SIZE);

        for row in &self.squares {
            let mut rank = String::new();
            let mut empty_count = 0;

            for square in row {
                if let Some(piece) = square {
                    if empty_count > 0 {
                        rank.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    rank.push(piece.to_fen_char());
                } else {
                    empty_count += 1;
                }
            }

            if empty_count > 0 {
                rank.push_str(&empty_count.to_string());
            }

            ranks.push(rank);
        }

        ranks.join("/")
    }

    /// 解析 FEN 棋盘字段
    ///
    /// 棋子的走动标记一律为未走动，由调用方按易位权重建。
    pub fn from_fen_board_field(field: &str) -> Result<Board> {
        let mut board = Board::empty();
        let ranks: Vec<&str> = field.split('/').collect();

        if ranks.len() != BOARD_SIZE {
            return Err(ChessError::invalid_fen(format!(
                "Expected {} ranks, got {}",
                BOARD_SIZE,
                ranks.len()
            )));
        }

        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;

            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=BOARD_SIZE as u32).contains(&run) {
                        return Err(ChessError::invalid_fen(format!(
                            "Invalid empty-square count '{}' in rank {}",
                            c,
                            row + 1
                        )));
                    }
                    col += run as usize;
                } else if let Some(piece) = Piece::from_fen_char(c) {
                    if col < BOARD_SIZE {
                        board.set(Position::new_unchecked(row as u8, col as u8), Some(piece));
                    }
                    col += 1;
                } else {
                    return Err(ChessError::invalid_fen(format!(
                        "Invalid piece character: {}",
                        c
                    )));
                }

                if col > BOARD_SIZE {
                    return Err(ChessError::invalid_fen(format!(
                        "Rank {} has too many columns",
                        row + 1
                    )));
                }
            }

            if col != BOARD_SIZE {
                return Err(ChessError::invalid_fen(format!(
                    "Rank {} has {} columns, expected {}",
                    row + 1,
                    col,
                    BOARD_SIZE
                )));
            }
        }

        Ok(board)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(square: &str) -> Position {
        Position::from_algebraic(square).unwrap()
    }

    #[test]
    fn test_initial_board() {
        let board = Board::initial();

        assert_eq!(
            board.get(pos("e1")),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.get(pos("d8")),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(
            board.get(pos("g1")),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
        assert_eq!(
            board.get(pos("c7")),
            Some(Piece::new(PieceKind::Pawn, Color::Black))
        );
        assert!(board.is_empty(pos("e4")));
        assert_eq!(board.all_pieces().len(), 32);
        assert_eq!(board.pieces(Color::White).len(), 16);
    }

    #[test]
    fn test_piece_at_out_of_range() {
        let board = Board::initial();
        assert_eq!(board.piece_at(-1, 0), None);
        assert_eq!(board.piece_at(0, 8), None);
        assert_eq!(board.piece_at(8, 8), None);
        assert_eq!(
            board.piece_at(7, 4),
            Some(Piece::new(PieceKind::King, Color::White))
        );
    }

    #[test]
    fn test_move_piece() {
        let mut board = Board::initial();

        let captured = board.move_piece(pos("e2"), pos("e4"));
        assert!(captured.is_none());
        assert!(board.get(pos("e2")).is_none());

        let pawn = board.get(pos("e4")).unwrap();
        assert_eq!(pawn.kind, PieceKind::Pawn);
        assert!(pawn.has_moved);
    }

    #[test]
    fn test_move_piece_overwrites_destination() {
        let mut board = Board::initial();

        let captured = board.move_piece(pos("d1"), pos("d7"));
        assert_eq!(captured, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert_eq!(board.get(pos("d7")).unwrap().kind, PieceKind::Queen);
        assert_eq!(board.get(pos("d7")).unwrap().color, Color::White);
    }

    #[test]
    fn test_clear_and_set() {
        let mut board = Board::initial();
        board.clear();
        assert!(board.all_pieces().is_empty());

        board.set(pos("a1"), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert_eq!(board.all_pieces().len(), 1);
        board.set(pos("a1"), None);
        assert!(board.is_empty(pos("a1")));
    }

    #[test]
    fn test_find_king() {
        let board = Board::initial();
        assert_eq!(board.find_king(Color::White), Some(pos("e1")));
        assert_eq!(board.find_king(Color::Black), Some(pos("e8")));
        assert_eq!(Board::empty().find_king(Color::White), None);
    }

    #[test]
    fn test_fen_board_field() {
        let board = Board::initial();
        assert_eq!(
            board.to_fen_board_field(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
        );
        assert_eq!(Board::empty().to_fen_board_field(), "8/8/8/8/8/8/8/8");

        let parsed = Board::from_fen_board_field("8/8/8/8/8/8/8/R3K2r").unwrap();
        assert_eq!(
            parsed.get(pos("h1")),
            Some(Piece::new(PieceKind::Rook, Color::Black))
        );
        assert_eq!(parsed.to_fen_board_field(), "8/8/8/8/8/8/8/R3K2r");
    }

    #[test]
    fn test_invalid_fen_board_field() {
        // 行数不对
        assert!(Board::from_fen_board_field("8/8/8").is_err());
        assert!(Board::from_fen_board_field("8/8/8/8/8/8/8/8/8").is_err());

        // 列数不对
        assert!(Board::from_fen_board_field("9/8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen_board_field("7/8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen_board_field("ppppppppp/8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen_board_field("44p/8/8/8/8/8/8/8").is_err());

        // 无效字符
        assert!(matches!(
            Board::from_fen_board_field("8/8/8/8/8/8/8/3X4"),
            Err(ChessError::InvalidFen { .. })
        ));
    }
}
