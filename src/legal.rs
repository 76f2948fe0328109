//! Legal-move classification.
//!
//! `legal_moves` derives a boolean grid over the whole board from a
//! snapshot. The mask is recomputed from scratch on every query; nothing
//! is maintained incrementally. An empty point is playable when it has a
//! direct liberty, connects to a friendly string that stays alive, or
//! captures an enemy string; the ko point is forced off on top of that.

use crate::board::{Board, Color, Point};
use crate::strings::{self, StringMap};

/// Boolean grid of legal moves for `player`, row-major.
///
/// A point is legal when it is empty and the move would not be suicide;
/// the ko point, if any, is illegal regardless.
pub fn legal_moves(board: &Board, player: Color, ko: Option<Point>) -> Vec<bool> {
    let side = board.side();
    let string_map = strings::analyze(board);
    let infos = strings::neighbor_info(board, &string_map, player);

    let mut mask = vec![false; side * side];
    for (i, info) in infos.iter().enumerate() {
        // Occupied points have no info and stay false.
        let Some(info) = info else {
            continue;
        };
        mask[i] = playable((i / side, i % side), info, &string_map);
    }
    if let Some((row, col)) = ko {
        mask[row * side + col] = false;
    }
    mask
}

fn playable(pt: Point, info: &strings::NeighborInfo, string_map: &StringMap) -> bool {
    // A direct liberty is enough.
    if !info.liberties.is_empty() {
        return true;
    }
    // Connecting to a friendly string that keeps a liberty other than
    // this point keeps the merged group alive.
    for &id in &info.friend_strings {
        let libs = string_map.liberties(id);
        if libs.len() > 1 || !libs.contains(&pt) {
            return true;
        }
    }
    // Capturing: an adjacent enemy string whose only liberty is here.
    for &id in &info.enemy_strings {
        if string_map.liberties(id).len() == 1 {
            return true;
        }
    }
    false
}
