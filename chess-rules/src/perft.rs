//! 走法计数（perft）
//!
//! 逐层展开所有合法走法并统计叶子节点数，用于校验走法生成与合法性判定。
//! 每个升变按四种棋子分别计数。

use crate::game::GameState;
use crate::piece::PieceKind;

/// 统计 `depth` 层内的叶子节点数
pub fn perft(game: &GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0;
    for (from, to) in game.legal_moves() {
        let mut child = game.snapshot();
        if !(child.select_piece(from) && child.select_target(to)) {
            continue;
        }

        if child.has_pending_promotion() {
            for kind in PieceKind::PROMOTIONS {
                let mut promoted = child.snapshot();
                if let Ok(true) = promoted.promote_to(kind) {
                    nodes += perft(&promoted, depth - 1);
                }
            }
        } else {
            nodes += perft(&child, depth - 1);
        }
    }
    nodes
}

/// 按第一步拆分的计数结果，便于与其他引擎逐项比对
pub fn divide(game: &GameState, depth: u32) -> Vec<(String, u64)> {
    let mut result = Vec::new();
    if depth == 0 {
        return result;
    }

    for (from, to) in game.legal_moves() {
        let mut child = game.snapshot();
        if !(child.select_piece(from) && child.select_target(to)) {
            continue;
        }

        if child.has_pending_promotion() {
            for kind in PieceKind::PROMOTIONS {
                let mut promoted = child.snapshot();
                if let Ok(true) = promoted.promote_to(kind) {
                    let label = format!("{}{}{}", from, to, kind.code_char());
                    result.push((label, perft(&promoted, depth - 1)));
                }
            }
        } else {
            result.push((format!("{}{}", from, to), perft(&child, depth - 1)));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perft_shallow() {
        let game = GameState::new();
        assert_eq!(perft(&game, 0), 1);
        assert_eq!(perft(&game, 1), 20);
        assert_eq!(perft(&game, 2), 400);
    }

    #[test]
    fn test_divide_sums_to_perft() {
        let game = GameState::new();
        let split = divide(&game, 2);
        assert_eq!(split.len(), 20);
        assert!(split.iter().all(|(_, nodes)| *nodes == 20));
        assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), perft(&game, 2));
    }

    #[test]
    fn test_promotions_counted_per_kind() {
        let game = GameState::from_fen_str("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let split = divide(&game, 1);
        let promotions: Vec<&str> = split
            .iter()
            .map(|(label, _)| label.as_str())
            .filter(|label| label.starts_with("a7a8"))
            .collect();
        assert_eq!(promotions, vec!["a7a8q", "a7a8r", "a7a8b", "a7a8n"]);
        // 4 个升变 + 王的 3 步
        assert_eq!(perft(&game, 1), 7);
    }
}
