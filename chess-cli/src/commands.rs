//! 子命令实现
//!
//! 每个命令接收 FEN 字符串，返回可打印或可序列化的结果；
//! 参数解析和输出在 `main.rs` 中完成。

use std::fmt;
use std::time::Instant;

use anyhow::{Context, Result};
use chess_rules::{divide, perft, Color, GameState, GameStatus, Position};
use serde::Serialize;
use tracing::{debug, info};

/// 局面状态报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub fen: String,
    pub turn: Color,
    pub status: GameStatus,
    pub in_check: bool,
    pub fifty_move_draw: bool,
    pub legal_moves: usize,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::PromotionPending => "promotion pending",
        };
        writeln!(f, "FEN:         {}", self.fen)?;
        writeln!(f, "To move:     {}", self.turn)?;
        writeln!(f, "Status:      {}", status)?;
        writeln!(f, "Legal moves: {}", self.legal_moves)?;
        write!(
            f,
            "Fifty-move:  {}",
            if self.fifty_move_draw { "draw claimable" } else { "no" }
        )
    }
}

/// 走法计数结果
#[derive(Debug, Clone, Serialize)]
pub struct PerftReport {
    pub depth: u32,
    pub nodes: u64,
    pub elapsed_ms: u128,
    /// 按第一步拆分（仅 `--divide`）
    pub divide: Vec<(String, u64)>,
}

impl fmt::Display for PerftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (mv, nodes) in &self.divide {
            writeln!(f, "{}: {}", mv, nodes)?;
        }
        write!(
            f,
            "perft({}) = {} ({} ms)",
            self.depth, self.nodes, self.elapsed_ms
        )
    }
}

fn parse_game(fen: &str) -> Result<GameState> {
    GameState::from_fen_str(fen).with_context(|| format!("Invalid FEN: {}", fen))
}

fn parse_square(square: &str) -> Result<Position> {
    square
        .parse::<Position>()
        .with_context(|| format!("Invalid square: {}", square))
}

/// `status`：报告走子方和终局状态
pub fn status(fen: &str) -> Result<StatusReport> {
    let game = parse_game(fen)?;
    Ok(StatusReport {
        fen: game.to_fen(),
        turn: game.turn(),
        status: game.status(),
        in_check: game.is_in_check(game.turn()),
        fifty_move_draw: game.is_fifty_move_draw(),
        legal_moves: game.legal_moves().len(),
    })
}

/// `moves`：列出合法走法（坐标记法，如 `e2e4`），可限定起点
pub fn list_moves(fen: &str, square: Option<&str>) -> Result<Vec<String>> {
    let game = parse_game(fen)?;

    let moves: Vec<(Position, Position)> = match square {
        Some(square) => {
            let from = parse_square(square)?;
            game.get_valid_moves(from)
                .into_iter()
                .map(|to| (from, to))
                .collect()
        }
        None => game.legal_moves(),
    };

    Ok(moves
        .into_iter()
        .map(|(from, to)| format!("{}{}", from, to))
        .collect())
}

/// `play`：通过选子流程走一步，返回走后的 FEN
///
/// 兵到达底线时按 `promote` 升变，未指定时升变为后。
pub fn play(fen: &str, from: &str, to: &str, promote: Option<&str>) -> Result<String> {
    let mut game = parse_game(fen)?;
    let from = parse_square(from)?;
    let to = parse_square(to)?;

    if !game.select_piece(from) {
        anyhow::bail!("No {} piece on {}", game.turn(), from);
    }
    if !game.select_target(to) {
        anyhow::bail!("Illegal move: {} -> {}", from, to);
    }

    if game.has_pending_promotion() {
        let kind = promote.unwrap_or("queen");
        game.promote(kind)
            .with_context(|| format!("Cannot promote on {}", to))?;
    } else if let Some(kind) = promote {
        anyhow::bail!("Move {} -> {} is not a promotion (got --promote {})", from, to, kind);
    }

    debug!("Played {}{}", from, to);
    Ok(game.to_fen())
}

/// `perft`：统计走法树叶子节点数
pub fn run_perft(fen: &str, depth: u32, split: bool) -> Result<PerftReport> {
    let game = parse_game(fen)?;

    let start = Instant::now();
    let (nodes, divide) = if split {
        let divide = divide(&game, depth);
        let nodes = if depth == 0 {
            1
        } else {
            divide.iter().map(|(_, n)| n).sum::<u64>()
        };
        (nodes, divide)
    } else {
        (perft(&game, depth), Vec::new())
    };
    let elapsed_ms = start.elapsed().as_millis();

    info!("perft({}) = {} in {} ms", depth, nodes, elapsed_ms);
    Ok(PerftReport {
        depth,
        nodes,
        elapsed_ms,
        divide,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rules::INITIAL_FEN;

    #[test]
    fn test_status_report() {
        let report = status(INITIAL_FEN).unwrap();
        assert_eq!(report.turn, Color::White);
        assert_eq!(report.status, GameStatus::Ongoing);
        assert_eq!(report.legal_moves, 20);
        assert!(!report.in_check);

        let mate = status("8/8/8/8/8/2k5/1q6/K7 w - - 0 1").unwrap();
        assert_eq!(mate.status, GameStatus::Checkmate);
        assert!(mate.in_check);
        assert_eq!(mate.legal_moves, 0);
        assert!(mate.to_string().contains("checkmate"));
    }

    #[test]
    fn test_status_json() {
        let report = status("8/8/8/8/8/6q1/5k2/7K w - - 0 1").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "Stalemate");
        assert_eq!(json["turn"], "White");
        assert_eq!(json["legal_moves"], 0);
    }

    #[test]
    fn test_status_invalid_fen() {
        let err = status("nonsense").unwrap_err();
        assert!(err.to_string().contains("Invalid FEN"));
    }

    #[test]
    fn test_list_moves() {
        let all = list_moves(INITIAL_FEN, None).unwrap();
        assert_eq!(all.len(), 20);
        assert!(all.contains(&"e2e4".to_string()));

        let mut knight = list_moves(INITIAL_FEN, Some("g1")).unwrap();
        knight.sort();
        assert_eq!(knight, vec!["g1f3", "g1h3"]);

        assert!(list_moves(INITIAL_FEN, Some("e7")).unwrap().is_empty());
        assert!(list_moves(INITIAL_FEN, Some("z9")).is_err());
    }

    #[test]
    fn test_play() {
        let fen = play(INITIAL_FEN, "e2", "e4", None).unwrap();
        assert_eq!(
            fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );

        assert!(play(INITIAL_FEN, "e2", "e5", None).is_err());
        assert!(play(INITIAL_FEN, "e7", "e5", None).is_err());
        assert!(play(INITIAL_FEN, "e2", "e4", Some("queen")).is_err());
    }

    #[test]
    fn test_play_promotion() {
        let fen = "7k/P7/8/8/8/8/8/7K w - - 0 1";
        assert_eq!(
            play(fen, "a7", "a8", Some("knight")).unwrap(),
            "N6k/8/8/8/8/8/8/7K b - - 0 1"
        );
        assert_eq!(
            play(fen, "a7", "a8", None).unwrap(),
            "Q6k/8/8/8/8/8/8/7K b - - 0 1"
        );
        assert!(play(fen, "a7", "a8", Some("king")).is_err());
    }

    #[test]
    fn test_perft() {
        let report = run_perft(INITIAL_FEN, 2, false).unwrap();
        assert_eq!(report.nodes, 400);
        assert!(report.divide.is_empty());

        let report = run_perft(INITIAL_FEN, 2, true).unwrap();
        assert_eq!(report.nodes, 400);
        assert_eq!(report.divide.len(), 20);
        assert!(report.to_string().ends_with(&format!("({} ms)", report.elapsed_ms)));
    }
}
