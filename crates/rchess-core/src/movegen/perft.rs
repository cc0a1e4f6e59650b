//! perft（葉ノード数の計数）

use crate::position::Position;
use crate::types::Move;

use super::{MoveList, generate_legal};

/// 深さ `depth` の葉ノード数
///
/// 深さ1では合法手数をそのまま数える（bulk counting）。
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    if depth == 1 {
        return list.len() as u64;
    }
    let mut nodes = 0;
    for &m in list.iter() {
        if let Some(undo) = pos.make_move(m) {
            nodes += perft(pos, depth - 1);
            pos.unmake_move(m, &undo);
        }
    }
    nodes
}

/// ルートの各合法手ごとの葉ノード数
pub fn perft_divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    let mut result = Vec::with_capacity(list.len());
    for &m in list.iter() {
        if let Some(undo) = pos.make_move(m) {
            let n = if depth <= 1 {
                1
            } else {
                perft(pos, depth - 1)
            };
            pos.unmake_move(m, &undo);
            result.push((m, n));
        }
    }
    result
}
