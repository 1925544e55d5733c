//! 状态变更通知

use serde::{Deserialize, Serialize};

use crate::piece::{PieceKind, Position};

/// 对局状态变更事件
///
/// 每次改变状态的操作完成后，`GameState` 会把事件交给已注册的监听器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// 走子已提交（王车易位时为王的起止格）
    MoveCommitted { from: Position, to: Position },
    /// 兵升变完成
    PromotionCompleted { at: Position, kind: PieceKind },
    /// 从 FEN 载入了新局面
    PositionLoaded,
    /// 重置为初始局面
    Reset,
}

/// 监听器类型
pub type Listener = Box<dyn FnMut(&GameEvent) + Send>;
