//! 对局状态
//!
//! `GameState` 是规则引擎本体：维护走子方、选子流程、合法性检查（包括王的安全）、
//! 特殊走法（王车易位、吃过路兵、兵升变）、终局判定以及 FEN 的读写。
//!
//! 选子流程是一个两状态的状态机：
//! - 空闲：没有选中棋子，`select_piece` 选中当前走子方的棋子；
//! - 已选中：`select_target` 尝试把选中的棋子走到目标格。
//!
//! 非法走法只返回 `false`，不会修改任何状态。

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::Board;
use crate::constants::{
    FIFTY_MOVE_LIMIT, KINGSIDE_ROOK_COL, KINGSIDE_ROOK_TARGET_COL, KING_START_COL,
    QUEENSIDE_ROOK_COL, QUEENSIDE_ROOK_TARGET_COL,
};
use crate::error::{ChessError, Result};
use crate::event::{GameEvent, Listener};
use crate::fen::{CastlingRights, Fen, FenRecord};
use crate::piece::{Color, Piece, PieceKind, Position};
use crate::rules::MoveRules;

/// 当前走子方视角下的对局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// 正常进行
    Ongoing,
    /// 被将军，但仍有合法走法
    Check,
    /// 被将死
    Checkmate,
    /// 逼和
    Stalemate,
    /// 等待选择升变棋子
    PromotionPending,
}

/// 试走
///
/// 在棋盘上临时执行一步走法，离开作用域时（包括提前返回）恢复原状，
/// 被移动和被吃掉的棋子的走动标记都原样还原。
struct TrialMove<'a> {
    board: &'a mut Board,
    from: Position,
    to: Position,
    mover: Option<Piece>,
    captured: Option<Piece>,
    /// 吃过路兵时临时拿走的兵
    lifted: Option<(Position, Piece)>,
}

impl<'a> TrialMove<'a> {
    fn begin(board: &'a mut Board, from: Position, to: Position, lift: Option<Position>) -> Self {
        let lifted = lift.and_then(|pos| board.get(pos).map(|piece| (pos, piece)));
        if let Some((pos, _)) = lifted {
            board.set(pos, None);
        }
        let mover = board.get(from);
        let captured = board.move_piece(from, to);
        Self {
            board,
            from,
            to,
            mover,
            captured,
            lifted,
        }
    }

    fn board(&self) -> &Board {
        &*self.board
    }
}

impl Drop for TrialMove<'_> {
    fn drop(&mut self) {
        self.board.set(self.to, self.captured);
        self.board.set(self.from, self.mover);
        if let Some((pos, piece)) = self.lifted {
            self.board.set(pos, Some(piece));
        }
    }
}

/// 对局状态
pub struct GameState {
    board: Board,
    turn: Color,
    selected: Option<Position>,
    pending_promotion: Option<Position>,
    en_passant_target: Option<Position>,
    halfmove_clock: u32,
    fullmove_number: u32,
    listener: Option<Listener>,
}

impl GameState {
    /// 创建标准初始局面
    pub fn new() -> Self {
        Self::from_record(Fen::initial())
    }

    /// 从 FEN 字符串创建对局
    pub fn from_fen_str(fen: &str) -> Result<Self> {
        Ok(Self::from_record(Fen::parse(fen)?))
    }

    fn from_record(record: FenRecord) -> Self {
        let mut game = Self {
            board: Board::empty(),
            turn: Color::White,
            selected: None,
            pending_promotion: None,
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            listener: None,
        };
        game.load_record(record);
        game
    }

    fn load_record(&mut self, record: FenRecord) {
        self.board = record.board;
        self.turn = record.turn;
        self.en_passant_target = record.en_passant;
        self.halfmove_clock = record.halfmove_clock;
        self.fullmove_number = record.fullmove_number;
        self.selected = None;
        // 走子方的兵停在底线上说明升变尚未完成
        self.pending_promotion = self
            .board
            .pieces(self.turn)
            .into_iter()
            .find(|(pos, piece)| {
                piece.kind == PieceKind::Pawn && pos.row() == self.turn.promotion_row()
            })
            .map(|(pos, _)| pos);
    }

    /// 复制当前局面（不带监听器）
    pub fn snapshot(&self) -> Self {
        Self {
            board: self.board.clone(),
            turn: self.turn,
            selected: self.selected,
            pending_promotion: self.pending_promotion,
            en_passant_target: self.en_passant_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            listener: None,
        }
    }

    // ------------------------------------------------------------------
    // 访问器
    // ------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub fn pending_promotion(&self) -> Option<Position> {
        self.pending_promotion
    }

    pub fn has_pending_promotion(&self) -> bool {
        self.pending_promotion.is_some()
    }

    pub fn en_passant_target(&self) -> Option<Position> {
        self.en_passant_target
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// 获取棋子代码，例如 `wp`、`bn`
    pub fn get_piece_code(&self, pos: Position) -> Option<String> {
        self.board.get(pos).map(|piece| piece.code())
    }

    // ------------------------------------------------------------------
    // 自定义局面（测试与摆棋用，不触发通知）
    // ------------------------------------------------------------------

    /// 直接放置或移除棋子
    pub fn place_piece(&mut self, pos: Position, piece: Option<Piece>) {
        self.board.set(pos, piece);
        self.selected = None;
    }

    /// 设置走子方，同时清除选中状态
    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
        self.selected = None;
    }

    pub fn set_en_passant_target(&mut self, target: Option<Position>) {
        self.en_passant_target = target;
    }

    // ------------------------------------------------------------------
    // 通知
    // ------------------------------------------------------------------

    /// 注册监听器（最多一个，新的替换旧的）
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    fn notify(&mut self, event: GameEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------
    // 选子流程
    // ------------------------------------------------------------------

    /// 选中棋子
    ///
    /// 只能选中当前走子方的棋子；已有选中时会替换为新的棋子。
    /// 等待升变时一律返回 `false`。
    pub fn select_piece(&mut self, pos: Position) -> bool {
        if self.pending_promotion.is_some() {
            return false;
        }
        match self.board.get(pos) {
            Some(piece) if piece.color == self.turn => {
                self.selected = Some(pos);
                true
            }
            _ => false,
        }
    }

    /// 清除选择
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// 把选中的棋子走到目标格
    ///
    /// 走法被拒绝时返回 `false`，状态不变（保留选中）。
    pub fn select_target(&mut self, to: Position) -> bool {
        let Some(from) = self.selected else {
            return false;
        };
        if self.pending_promotion.is_some() {
            return false;
        }
        let Some(piece) = self.board.get(from).filter(|p| p.color == self.turn) else {
            self.selected = None;
            return false;
        };

        if let Some(rook) = Self::castling_rook(piece, from, to) {
            if !self.attempt_castling(from, rook) {
                debug!("Castling rejected: {} -> {}", from, to);
                return false;
            }
            self.commit_castling(from, to, rook);
            return true;
        }

        let mut scratch = self.board.clone();
        if !self.is_legal_step(&mut scratch, piece, from, to) {
            debug!("Move rejected: {} -> {}", from, to);
            return false;
        }

        self.commit_move(piece, from, to);
        true
    }

    /// 完成升变，`kind` 为 `queen`、`rook`、`bishop` 或 `knight`
    ///
    /// 没有待升变的兵时返回 `Ok(false)`。
    pub fn promote(&mut self, kind: &str) -> Result<bool> {
        if self.pending_promotion.is_none() {
            return Ok(false);
        }
        let kind = PieceKind::from_name(kind)?;
        self.promote_to(kind)
    }

    /// 完成升变（类型化版本）
    pub fn promote_to(&mut self, kind: PieceKind) -> Result<bool> {
        let Some(at) = self.pending_promotion else {
            return Ok(false);
        };
        if !kind.is_promotable() {
            return Err(ChessError::InvalidPromotionKind {
                kind: kind.name().to_string(),
            });
        }

        let color = self.board.get(at).map_or(self.turn, |pawn| pawn.color);
        self.board.set(
            at,
            Some(Piece {
                kind,
                color,
                has_moved: true,
            }),
        );
        self.pending_promotion = None;
        debug!("Promotion completed: {} = {}", at, kind);

        self.finish_turn();
        self.notify(GameEvent::PromotionCompleted { at, kind });
        Ok(true)
    }

    // ------------------------------------------------------------------
    // 合法性
    // ------------------------------------------------------------------

    /// 王走两列视为王车易位，返回对应的车的位置
    fn castling_rook(piece: Piece, from: Position, to: Position) -> Option<Position> {
        if piece.kind != PieceKind::King
            || from.row() != to.row()
            || from.col().abs_diff(to.col()) != 2
        {
            return None;
        }
        let rook_col = if to.col() > from.col() {
            KINGSIDE_ROOK_COL
        } else {
            QUEENSIDE_ROOK_COL
        };
        Some(Position::new_unchecked(from.row(), rook_col))
    }

    /// 普通走法的合法性：伪合法且走后己方王不被将军
    ///
    /// `scratch` 必须与当前棋盘一致，试走结束后会被还原。
    fn is_legal_step(&self, scratch: &mut Board, piece: Piece, from: Position, to: Position) -> bool {
        if !piece.is_valid_move(from, to, &self.board, self.en_passant_target) {
            return false;
        }
        let victim =
            MoveRules::en_passant_victim(&self.board, piece, from, to, self.en_passant_target);
        let trial = TrialMove::begin(scratch, from, to, victim);
        !MoveRules::is_in_check(trial.board(), piece.color)
    }

    /// 任意走法（含王车易位）的合法性
    fn is_legal(&self, scratch: &mut Board, from: Position, to: Position) -> bool {
        let Some(piece) = self.board.get(from) else {
            return false;
        };
        match Self::castling_rook(piece, from, to) {
            Some(rook) => self.attempt_castling(from, rook),
            None => self.is_legal_step(scratch, piece, from, to),
        }
    }

    /// 检查王车易位是否合法（不修改状态）
    ///
    /// 条件：当前走子方未走动过的王和车在同一横线上，王在 e 列、车在角上，
    /// 两者之间没有棋子，王不在被将军状态，且王经过和到达的格子都不受攻击。
    pub fn attempt_castling(&self, king_pos: Position, rook_pos: Position) -> bool {
        let (Some(king), Some(rook)) = (self.board.get(king_pos), self.board.get(rook_pos)) else {
            return false;
        };
        if king.kind != PieceKind::King || rook.kind != PieceKind::Rook {
            return false;
        }
        if king.color != self.turn || rook.color != self.turn {
            return false;
        }
        if king.has_moved || rook.has_moved {
            return false;
        }
        if king_pos.row() != rook_pos.row()
            || king_pos.col() != KING_START_COL
            || !matches!(rook_pos.col(), KINGSIDE_ROOK_COL | QUEENSIDE_ROOK_COL)
        {
            return false;
        }
        if !MoveRules::is_path_clear(&self.board, king_pos, rook_pos) {
            return false;
        }
        if MoveRules::is_in_check(&self.board, king.color) {
            return false;
        }

        let step = if rook_pos.col() > king_pos.col() { 1 } else { -1 };
        let mut scratch = self.board.clone();
        for distance in 1..=2 {
            let Some(square) = king_pos.offset(0, step * distance) else {
                return false;
            };
            let trial = TrialMove::begin(&mut scratch, king_pos, square, None);
            if MoveRules::is_in_check(trial.board(), king.color) {
                return false;
            }
        }
        true
    }

    /// 检查指定阵营的王是否被将军
    pub fn is_in_check(&self, color: Color) -> bool {
        MoveRules::is_in_check(&self.board, color)
    }

    /// 指定阵营是否还有合法走法
    pub fn has_any_legal_move(&self, color: Color) -> bool {
        let mut scratch = self.board.clone();
        self.board.pieces(color).into_iter().any(|(from, _)| {
            Position::all().any(|to| self.is_legal(&mut scratch, from, to))
        })
    }

    /// 当前走子方是否被将死
    pub fn is_checkmate(&self) -> bool {
        self.is_in_check(self.turn) && !self.has_any_legal_move(self.turn)
    }

    /// 当前走子方是否被逼和
    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check(self.turn) && !self.has_any_legal_move(self.turn)
    }

    /// 五十回合规则是否已满足
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_LIMIT
    }

    /// 当前走子方视角下的状态
    pub fn status(&self) -> GameStatus {
        if self.pending_promotion.is_some() {
            return GameStatus::PromotionPending;
        }
        let in_check = self.is_in_check(self.turn);
        let can_move = self.has_any_legal_move(self.turn);
        match (in_check, can_move) {
            (true, true) => GameStatus::Check,
            (true, false) => GameStatus::Checkmate,
            (false, true) => GameStatus::Ongoing,
            (false, false) => GameStatus::Stalemate,
        }
    }

    /// 获取指定棋子的所有合法目标格（含王车易位）
    ///
    /// 空格、对方棋子或等待升变时返回空列表。
    pub fn get_valid_moves(&self, from: Position) -> Vec<Position> {
        if self.pending_promotion.is_some() {
            return Vec::new();
        }
        match self.board.get(from) {
            Some(piece) if piece.color == self.turn => {}
            _ => return Vec::new(),
        }

        let mut scratch = self.board.clone();
        Position::all()
            .filter(|&to| self.is_legal(&mut scratch, from, to))
            .collect()
    }

    /// 当前走子方的所有合法走法
    pub fn legal_moves(&self) -> Vec<(Position, Position)> {
        self.board
            .pieces(self.turn)
            .into_iter()
            .flat_map(|(from, _)| {
                self.get_valid_moves(from)
                    .into_iter()
                    .map(move |to| (from, to))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // 提交走法
    // ------------------------------------------------------------------

    fn commit_move(&mut self, piece: Piece, from: Position, to: Position) {
        let victim =
            MoveRules::en_passant_victim(&self.board, piece, from, to, self.en_passant_target);
        let mut captured = self.board.move_piece(from, to);
        if let Some(victim) = victim {
            captured = self.board.get(victim);
            self.board.set(victim, None);
            debug!("En passant: {} -> {}, captured on {}", from, to, victim);
        }

        let is_pawn = piece.kind == PieceKind::Pawn;

        // 过路兵目标格只对下一手有效
        self.en_passant_target = if is_pawn && from.row().abs_diff(to.row()) == 2 {
            Some(Position::new_unchecked(
                (from.row() + to.row()) / 2,
                from.col(),
            ))
        } else {
            None
        };

        if is_pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        debug!("Move committed: {} {} -> {}", piece.code(), from, to);

        if is_pawn && to.row() == piece.color.promotion_row() {
            // 升变完成后才交换走子方
            self.pending_promotion = Some(to);
            self.selected = None;
            debug!("Promotion pending on {}", to);
        } else {
            self.finish_turn();
        }

        self.notify(GameEvent::MoveCommitted { from, to });
    }

    fn commit_castling(&mut self, king_from: Position, king_to: Position, rook_from: Position) {
        let rook_col = if rook_from.col() == KINGSIDE_ROOK_COL {
            KINGSIDE_ROOK_TARGET_COL
        } else {
            QUEENSIDE_ROOK_TARGET_COL
        };
        let rook_to = Position::new_unchecked(king_from.row(), rook_col);

        self.board.move_piece(king_from, king_to);
        self.board.move_piece(rook_from, rook_to);
        self.en_passant_target = None;
        self.pending_promotion = None;
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        debug!(
            "Castling: king {} -> {}, rook {} -> {}",
            king_from, king_to, rook_from, rook_to
        );

        self.finish_turn();
        self.notify(GameEvent::MoveCommitted {
            from: king_from,
            to: king_to,
        });
    }

    fn finish_turn(&mut self) {
        self.selected = None;
        if self.turn == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.turn = self.turn.opponent();
    }

    // ------------------------------------------------------------------
    // FEN
    // ------------------------------------------------------------------

    /// 导出 FEN，易位权由王和车的走动标记实时推导
    pub fn to_fen(&self) -> String {
        Fen::to_string(&FenRecord {
            board: self.board.clone(),
            turn: self.turn,
            castling: CastlingRights::from_board(&self.board),
            en_passant: self.en_passant_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        })
    }

    /// 载入 FEN
    ///
    /// 全有或全无：解析失败时原局面保持不变。
    pub fn from_fen(&mut self, fen: &str) -> Result<()> {
        let record = match Fen::parse(fen) {
            Ok(record) => record,
            Err(e) => {
                warn!("Rejected FEN {:?}: {}", fen, e);
                return Err(e);
            }
        };
        self.load_record(record);
        debug!("Position loaded: {}", fen);
        self.notify(GameEvent::PositionLoaded);
        Ok(())
    }

    /// 重置为初始局面
    pub fn reset(&mut self) {
        self.load_record(Fen::initial());
        debug!("Game reset");
        self.notify(GameEvent::Reset);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("fen", &self.to_fen())
            .field("selected", &self.selected)
            .field("pending_promotion", &self.pending_promotion)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
