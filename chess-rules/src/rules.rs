//! 走法规则验证
//!
//! 这里只做伪合法检查：走法是否符合棋子本身的走法规则，
//! 不考虑走完后己方王是否处于被将军状态（由 `GameState` 负责）。

use crate::board::Board;
use crate::piece::{Color, Piece, PieceKind, Position};

/// 走法规则
pub struct MoveRules;

impl MoveRules {
    /// 检查棋子从 `from` 走到 `to` 是否伪合法
    ///
    /// `en_passant` 为当前可吃过路兵的目标格。
    pub fn is_valid_move(
        board: &Board,
        piece: Piece,
        from: Position,
        to: Position,
        en_passant: Option<Position>,
    ) -> bool {
        if from == to {
            return false;
        }

        // 不能吃己方棋子
        if board.get(to).is_some_and(|target| target.color == piece.color) {
            return false;
        }

        match piece.kind {
            PieceKind::Pawn => Self::is_valid_pawn_move(board, piece.color, from, to, en_passant),
            PieceKind::Knight => Self::is_knight_step(from, to),
            PieceKind::Bishop => Self::is_diagonal(from, to) && Self::is_path_clear(board, from, to),
            PieceKind::Rook => Self::is_straight(from, to) && Self::is_path_clear(board, from, to),
            PieceKind::Queen => {
                (Self::is_straight(from, to) || Self::is_diagonal(from, to))
                    && Self::is_path_clear(board, from, to)
            }
            PieceKind::King => Self::is_king_step(from, to),
        }
    }

    /// 兵的走法
    fn is_valid_pawn_move(
        board: &Board,
        color: Color,
        from: Position,
        to: Position,
        en_passant: Option<Position>,
    ) -> bool {
        let (drow, dcol) = Self::delta(from, to);
        let forward = color.forward() as i32;

        if dcol == 0 {
            // 前进一格
            if drow == forward {
                return board.is_empty(to);
            }

            // 初始位置前进两格
            if drow == 2 * forward && from.row() == color.pawn_row() {
                let passed = from.offset(color.forward(), 0);
                return board.is_empty(to) && passed.is_some_and(|sq| board.is_empty(sq));
            }

            return false;
        }

        if dcol.abs() == 1 && drow == forward {
            return match board.get(to) {
                // 斜吃（己方棋子已在上面排除）
                Some(_) => true,
                // 吃过路兵
                None => en_passant == Some(to) && to.row() == color.en_passant_row(),
            };
        }

        false
    }

    /// 马的走法：(2,1) 或 (1,2) 偏移
    fn is_knight_step(from: Position, to: Position) -> bool {
        let (drow, dcol) = Self::delta(from, to);
        matches!((drow.abs(), dcol.abs()), (1, 2) | (2, 1))
    }

    /// 王的走法：任意方向一格
    fn is_king_step(from: Position, to: Position) -> bool {
        let (drow, dcol) = Self::delta(from, to);
        drow.abs() <= 1 && dcol.abs() <= 1
    }

    fn is_straight(from: Position, to: Position) -> bool {
        from.row() == to.row() || from.col() == to.col()
    }

    fn is_diagonal(from: Position, to: Position) -> bool {
        let (drow, dcol) = Self::delta(from, to);
        drow.abs() == dcol.abs()
    }

    /// 检查两点之间（不含两端）是否没有棋子
    ///
    /// 两点不在同一直线或斜线上时返回 `false`。
    pub fn is_path_clear(board: &Board, from: Position, to: Position) -> bool {
        let (drow, dcol) = Self::delta(from, to);
        if from == to || !(drow == 0 || dcol == 0 || drow.abs() == dcol.abs()) {
            return false;
        }

        let step = (drow.signum() as i8, dcol.signum() as i8);
        let mut current = from;
        while let Some(next) = current.offset(step.0, step.1) {
            if next == to {
                return true;
            }
            if !board.is_empty(next) {
                return false;
            }
            current = next;
        }
        false
    }

    /// 检查指定阵营的王是否被将军
    ///
    /// 没有王时视为不被将军。
    pub fn is_in_check(board: &Board, color: Color) -> bool {
        let king_pos = match board.find_king(color) {
            Some(pos) => pos,
            None => return false,
        };

        board
            .pieces(color.opponent())
            .into_iter()
            .any(|(pos, piece)| Self::is_valid_move(board, piece, pos, king_pos, None))
    }

    /// 若该走法是吃过路兵，返回被吃掉的兵所在位置
    pub fn en_passant_victim(
        board: &Board,
        piece: Piece,
        from: Position,
        to: Position,
        en_passant: Option<Position>,
    ) -> Option<Position> {
        if piece.kind != PieceKind::Pawn
            || from.col() == to.col()
            || en_passant != Some(to)
            || !board.is_empty(to)
        {
            return None;
        }

        // 被吃的兵与落点同列，位于起点所在行
        let victim = Position::new_unchecked(from.row(), to.col());
        board
            .get(victim)
            .filter(|p| p.kind == PieceKind::Pawn && p.color != piece.color)
            .map(|_| victim)
    }

    fn delta(from: Position, to: Position) -> (i32, i32) {
        (
            to.row() as i32 - from.row() as i32,
            to.col() as i32 - from.col() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(square: &str) -> Position {
        Position::from_algebraic(square).unwrap()
    }

    fn place(board: &mut Board, square: &str, kind: PieceKind, color: Color) -> Piece {
        let piece = Piece::new(kind, color);
        board.set(pos(square), Some(piece));
        piece
    }

    fn targets(board: &Board, square: &str, en_passant: Option<Position>) -> Vec<String> {
        let from = pos(square);
        let piece = board.get(from).unwrap();
        let mut result: Vec<String> = Position::all()
            .filter(|&to| MoveRules::is_valid_move(board, piece, from, to, en_passant))
            .map(|to| to.to_string())
            .collect();
        result.sort();
        result
    }

    #[test]
    fn test_pawn_single_and_double_step() {
        let mut board = Board::empty();
        place(&mut board, "e2", PieceKind::Pawn, Color::White);
        assert_eq!(targets(&board, "e2", None), vec!["e3", "e4"]);

        // 双步被阻挡
        place(&mut board, "e4", PieceKind::Knight, Color::Black);
        assert_eq!(targets(&board, "e2", None), vec!["e3"]);

        // 单步被阻挡时也不能双步
        place(&mut board, "e3", PieceKind::Knight, Color::White);
        assert!(targets(&board, "e2", None).is_empty());
    }

    #[test]
    fn test_pawn_no_double_step_off_start_rank() {
        let mut board = Board::empty();
        place(&mut board, "d3", PieceKind::Pawn, Color::White);
        assert_eq!(targets(&board, "d3", None), vec!["d4"]);

        place(&mut board, "c6", PieceKind::Pawn, Color::Black);
        assert_eq!(targets(&board, "c6", None), vec!["c5"]);
    }

    #[test]
    fn test_pawn_captures() {
        let mut board = Board::empty();
        place(&mut board, "d4", PieceKind::Pawn, Color::White);
        place(&mut board, "c5", PieceKind::Rook, Color::Black);
        place(&mut board, "e5", PieceKind::Bishop, Color::White);
        // 不能吃己方，也不能后退吃子
        place(&mut board, "c3", PieceKind::Rook, Color::Black);
        assert_eq!(targets(&board, "d4", None), vec!["c5", "d5"]);
    }

    #[test]
    fn test_pawn_cannot_capture_forward() {
        let mut board = Board::empty();
        place(&mut board, "a7", PieceKind::Pawn, Color::Black);
        place(&mut board, "a6", PieceKind::Pawn, Color::White);
        assert!(targets(&board, "a7", None).is_empty());
    }

    #[test]
    fn test_pawn_en_passant_target() {
        let mut board = Board::empty();
        place(&mut board, "e5", PieceKind::Pawn, Color::White);
        place(&mut board, "f5", PieceKind::Pawn, Color::Black);

        assert_eq!(targets(&board, "e5", Some(pos("f6"))), vec!["e6", "f6"]);
        assert_eq!(targets(&board, "e5", None), vec!["e6"]);

        let white_pawn = board.get(pos("e5")).unwrap();
        assert_eq!(
            MoveRules::en_passant_victim(&board, white_pawn, pos("e5"), pos("f6"), Some(pos("f6"))),
            Some(pos("f5"))
        );
        assert_eq!(
            MoveRules::en_passant_victim(&board, white_pawn, pos("e5"), pos("e6"), Some(pos("f6"))),
            None
        );
    }

    #[test]
    fn test_pawn_en_passant_wrong_rank_ignored() {
        let mut board = Board::empty();
        place(&mut board, "b2", PieceKind::Pawn, Color::White);
        // 白方双步产生的目标格 a3 不能被白兵利用
        assert_eq!(targets(&board, "b2", Some(pos("a3"))), vec!["b3", "b4"]);
    }

    #[test]
    fn test_knight_moves() {
        let mut board = Board::empty();
        place(&mut board, "b1", PieceKind::Knight, Color::White);
        place(&mut board, "d2", PieceKind::Pawn, Color::White);
        place(&mut board, "c3", PieceKind::Pawn, Color::Black);
        assert_eq!(targets(&board, "b1", None), vec!["a3", "c3"]);

        let mut board = Board::empty();
        place(&mut board, "d4", PieceKind::Knight, Color::Black);
        assert_eq!(targets(&board, "d4", None).len(), 8);
    }

    #[test]
    fn test_bishop_moves() {
        let mut board = Board::empty();
        place(&mut board, "c1", PieceKind::Bishop, Color::White);
        place(&mut board, "e3", PieceKind::Pawn, Color::Black);
        assert_eq!(targets(&board, "c1", None), vec!["a3", "b2", "d2", "e3"]);
    }

    #[test]
    fn test_rook_moves() {
        let mut board = Board::empty();
        place(&mut board, "a1", PieceKind::Rook, Color::White);
        place(&mut board, "a3", PieceKind::Pawn, Color::White);
        place(&mut board, "c1", PieceKind::Knight, Color::Black);
        assert_eq!(targets(&board, "a1", None), vec!["a2", "b1", "c1"]);
    }

    #[test]
    fn test_queen_moves() {
        let mut board = Board::empty();
        place(&mut board, "d4", PieceKind::Queen, Color::White);
        assert_eq!(targets(&board, "d4", None).len(), 27);

        // 马步不是后的走法
        assert!(!MoveRules::is_valid_move(
            &board,
            Piece::new(PieceKind::Queen, Color::White),
            pos("d4"),
            pos("e6"),
            None
        ));
    }

    #[test]
    fn test_king_moves() {
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Color::White);
        place(&mut board, "h1", PieceKind::Rook, Color::White);
        place(&mut board, "d2", PieceKind::Pawn, Color::White);
        place(&mut board, "e2", PieceKind::Pawn, Color::Black);
        // 易位不属于王自身的走法
        assert_eq!(targets(&board, "e1", None), vec!["d1", "e2", "f1", "f2"]);
    }

    #[test]
    fn test_path_clear() {
        let mut board = Board::empty();
        assert!(MoveRules::is_path_clear(&board, pos("a1"), pos("h8")));
        assert!(MoveRules::is_path_clear(&board, pos("e1"), pos("h1")));
        assert!(!MoveRules::is_path_clear(&board, pos("a1"), pos("b3")));

        // 端点上的棋子不算阻挡
        place(&mut board, "h1", PieceKind::Rook, Color::White);
        place(&mut board, "e1", PieceKind::King, Color::White);
        assert!(MoveRules::is_path_clear(&board, pos("e1"), pos("h1")));

        place(&mut board, "g1", PieceKind::Knight, Color::White);
        assert!(!MoveRules::is_path_clear(&board, pos("e1"), pos("h1")));
    }

    #[test]
    fn test_check_detection() {
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Color::White);
        place(&mut board, "e8", PieceKind::Rook, Color::Black);
        assert!(MoveRules::is_in_check(&board, Color::White));

        // 中间挡住
        place(&mut board, "e4", PieceKind::Pawn, Color::White);
        assert!(!MoveRules::is_in_check(&board, Color::White));

        // 兵斜向将军
        place(&mut board, "d2", PieceKind::Pawn, Color::Black);
        assert!(MoveRules::is_in_check(&board, Color::White));
    }

    #[test]
    fn test_check_by_knight() {
        let mut board = Board::empty();
        place(&mut board, "e8", PieceKind::King, Color::Black);
        place(&mut board, "f6", PieceKind::Knight, Color::White);
        assert!(MoveRules::is_in_check(&board, Color::Black));
        assert!(!MoveRules::is_in_check(&board, Color::White));
    }

    #[test]
    fn test_no_king_not_in_check() {
        let mut board = Board::empty();
        place(&mut board, "e8", PieceKind::Queen, Color::Black);
        assert!(!MoveRules::is_in_check(&board, Color::White));
    }
}
