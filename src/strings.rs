//! String and liberty analysis.
//!
//! A "string" is a maximal 4-connected set of same-color stones. This
//! module partitions a board snapshot into strings and computes their
//! liberty sets with a single depth-first flood fill, visiting each
//! occupied point once.
//!
//! Everything here is a pure function of the snapshot. String ids are
//! call-scoped: they identify strings only within the `StringMap` they
//! came from and must never be cached across calls.

use std::collections::HashSet;

use crate::board::{Board, Color, Point};

/// Call-scoped identifier of a string.
pub type StringId = usize;

/// The partition of a board snapshot into strings.
pub struct StringMap {
    side: usize,
    /// Owning string per point, `None` for empty points.
    string_of: Vec<Option<StringId>>,
    /// Liberty set per string, indexed by `StringId`.
    liberties: Vec<HashSet<Point>>,
}

/// Partition the board into strings and compute their liberty sets.
pub fn analyze(board: &Board) -> StringMap {
    let side = board.side();
    let mut string_of: Vec<Option<StringId>> = vec![None; side * side];
    let mut liberties: Vec<HashSet<Point>> = Vec::new();

    for row in 0..side {
        for col in 0..side {
            let pt = (row, col);
            let Some(color) = board.get(pt) else {
                continue;
            };
            if string_of[row * side + col].is_some() {
                continue;
            }
            // New string: flood fill from here.
            let id = liberties.len();
            liberties.push(HashSet::new());
            let mut fringe = vec![pt];
            while let Some(p) = fringe.pop() {
                let i = p.0 * side + p.1;
                if string_of[i].is_some() {
                    continue;
                }
                string_of[i] = Some(id);
                for nb in board.neighbors(p) {
                    match board.get(nb) {
                        None => {
                            liberties[id].insert(nb);
                        }
                        Some(c) if c == color && string_of[nb.0 * side + nb.1].is_none() => {
                            fringe.push(nb);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    StringMap {
        side,
        string_of,
        liberties,
    }
}

impl StringMap {
    /// The string owning `pt`, `None` for empty points.
    pub fn string_of(&self, (row, col): Point) -> Option<StringId> {
        self.string_of[row * self.side + col]
    }

    /// Liberty set of a string.
    pub fn liberties(&self, id: StringId) -> &HashSet<Point> {
        &self.liberties[id]
    }

    pub fn string_count(&self) -> usize {
        self.liberties.len()
    }

    /// Size of the owning string's liberty set, 0 for empty points.
    pub fn liberty_count(&self, pt: Point) -> usize {
        match self.string_of(pt) {
            Some(id) => self.liberties[id].len(),
            None => 0,
        }
    }
}

/// Three disjoint boolean grids classifying every point for `player`.
pub struct ColorMask {
    pub empty: Vec<bool>,
    pub friend: Vec<bool>,
    pub enemy: Vec<bool>,
}

pub fn color_mask(board: &Board, player: Color) -> ColorMask {
    let side = board.side();
    let mut mask = ColorMask {
        empty: vec![false; side * side],
        friend: vec![false; side * side],
        enemy: vec![false; side * side],
    };
    for row in 0..side {
        for col in 0..side {
            let i = row * side + col;
            match board.get((row, col)) {
                None => mask.empty[i] = true,
                Some(c) if c == player => mask.friend[i] = true,
                Some(_) => mask.enemy[i] = true,
            }
        }
    }
    mask
}

/// What surrounds one empty point, from `player`'s perspective.
#[derive(Default)]
pub struct NeighborInfo {
    /// Empty direct neighbors.
    pub liberties: Vec<Point>,
    /// Adjacent strings of `player`'s color.
    pub friend_strings: Vec<StringId>,
    /// Adjacent strings of the opposing color.
    pub enemy_strings: Vec<StringId>,
}

/// Per-empty-point neighborhood summary, `None` at occupied points.
///
/// Precomputed in one pass so that legality classification can decide
/// each point in O(1) instead of re-walking its neighbors.
pub fn neighbor_info(
    board: &Board,
    strings: &StringMap,
    player: Color,
) -> Vec<Option<NeighborInfo>> {
    let side = board.side();
    let mut infos: Vec<Option<NeighborInfo>> = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let pt = (row, col);
            if board.get(pt).is_some() {
                infos.push(None);
                continue;
            }
            let mut info = NeighborInfo::default();
            for nb in board.neighbors(pt) {
                match board.get(nb) {
                    None => info.liberties.push(nb),
                    Some(c) => {
                        let id = strings
                            .string_of(nb)
                            .expect("occupied point must belong to a string");
                        let bucket = if c == player {
                            &mut info.friend_strings
                        } else {
                            &mut info.enemy_strings
                        };
                        if !bucket.contains(&id) {
                            bucket.push(id);
                        }
                    }
                }
            }
            infos.push(Some(info));
        }
    }
    infos
}

/// Sentinel distance for points the bounded BFS never reached.
pub fn unreached_distance(side: usize) -> u32 {
    2 * side as u32
}

/// Distance fields from friendly and enemy stones.
///
/// Multi-source BFS from all friendly stones and from all enemy stones,
/// capped at `max_depth`; unreached points get `2 * side`. Positional
/// feature only, never consulted for legality.
pub fn distance_from_stones(
    board: &Board,
    player: Color,
    max_depth: u32,
) -> (Vec<u32>, Vec<u32>) {
    let to_friend = bfs_distances(board, player, max_depth);
    let to_enemy = bfs_distances(board, player.opponent(), max_depth);
    (to_friend, to_enemy)
}

fn bfs_distances(board: &Board, color: Color, max_depth: u32) -> Vec<u32> {
    let side = board.side();
    let infinity = unreached_distance(side);
    let mut dist = vec![infinity; side * side];
    let mut frontier: Vec<Point> = Vec::new();
    for row in 0..side {
        for col in 0..side {
            if board.get((row, col)) == Some(color) {
                dist[row * side + col] = 0;
                frontier.push((row, col));
            }
        }
    }
    let mut depth = 0;
    while !frontier.is_empty() && depth < max_depth {
        depth += 1;
        let mut next = Vec::new();
        for pt in frontier {
            for nb in board.neighbors(pt) {
                let i = nb.0 * side + nb.1;
                if dist[i] == infinity {
                    dist[i] = depth;
                    next.push(nb);
                }
            }
        }
        frontier = next;
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveError;

    fn board_from(rows: &[&str]) -> Board {
        // Rows are given top to bottom, `X` black, `O` white, `.` empty.
        let side = rows.len();
        let mut board = Board::new(side);
        for (i, row) in rows.iter().enumerate() {
            for (col, ch) in row.chars().enumerate() {
                let color = match ch {
                    'X' => Color::Black,
                    'O' => Color::White,
                    _ => continue,
                };
                board.place((side - 1 - i, col), color).unwrap();
            }
        }
        board
    }

    #[test]
    fn test_empty_board() {
        let board = Board::new(5);
        let strings = analyze(&board);
        assert_eq!(strings.string_count(), 0);
        assert_eq!(strings.liberty_count((2, 2)), 0);
    }

    #[test]
    fn test_single_stone() {
        let board = board_from(&[".....", ".....", "..X..", ".....", "....."]);
        let strings = analyze(&board);
        assert_eq!(strings.string_count(), 1);
        assert_eq!(strings.liberty_count((2, 2)), 4);
    }

    #[test]
    fn test_connected_string_shares_liberties() {
        let board = board_from(&[".....", ".....", ".XX..", ".....", "....."]);
        let strings = analyze(&board);
        assert_eq!(strings.string_count(), 1);
        assert_eq!(strings.string_of((2, 1)), strings.string_of((2, 2)));
        assert_eq!(strings.liberty_count((2, 1)), 6);
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        let board = board_from(&[".....", ".....", ".X...", "..X..", "....."]);
        let strings = analyze(&board);
        assert_eq!(strings.string_count(), 2);
        assert_ne!(strings.string_of((2, 1)), strings.string_of((1, 2)));
    }

    #[test]
    fn test_mixed_colors_split_strings() {
        let board = board_from(&[".....", ".....", ".XO..", ".....", "....."]);
        let strings = analyze(&board);
        assert_eq!(strings.string_count(), 2);
        // Each stone has 3 liberties; the shared edge is not a liberty.
        assert_eq!(strings.liberty_count((2, 1)), 3);
        assert_eq!(strings.liberty_count((2, 2)), 3);
    }

    #[test]
    fn test_liberty_invariant_matches_definition() {
        let board = board_from(&["X.O..", "XXO..", ".XO..", "..X..", "....."]);
        let strings = analyze(&board);
        for row in 0..5 {
            for col in 0..5 {
                let pt = (row, col);
                let Some(id) = strings.string_of(pt) else {
                    continue;
                };
                // Every empty neighbor of a member is in the liberty set.
                for nb in board.neighbors(pt) {
                    if board.get(nb).is_none() {
                        assert!(strings.liberties(id).contains(&nb));
                    }
                }
                // And every liberty is empty and adjacent to some member.
                for &lib in strings.liberties(id) {
                    assert_eq!(board.get(lib), None);
                    assert!(
                        board
                            .neighbors(lib)
                            .any(|nb| strings.string_of(nb) == Some(id))
                    );
                }
            }
        }
    }

    #[test]
    fn test_color_mask_disjoint() {
        let board = board_from(&[".....", ".....", ".XO..", ".....", "....."]);
        let mask = color_mask(&board, Color::Black);
        for i in 0..25 {
            let set = [mask.empty[i], mask.friend[i], mask.enemy[i]]
                .iter()
                .filter(|&&b| b)
                .count();
            assert_eq!(set, 1, "masks must be disjoint and exhaustive");
        }
        assert!(mask.friend[2 * 5 + 1]);
        assert!(mask.enemy[2 * 5 + 2]);
    }

    #[test]
    fn test_neighbor_info() {
        let board = board_from(&[".....", ".....", ".XO..", ".....", "....."]);
        let strings = analyze(&board);
        let infos = neighbor_info(&board, &strings, Color::Black);
        // Occupied points carry no info.
        assert!(infos[2 * 5 + 1].is_none());
        // The point between nothing: corner (0,0) has only empty neighbors.
        let corner = infos[0].as_ref().unwrap();
        assert_eq!(corner.liberties.len(), 2);
        assert!(corner.friend_strings.is_empty());
        // (1, 1) sits under the black stone.
        let under = infos[5 + 1].as_ref().unwrap();
        assert_eq!(under.friend_strings.len(), 1);
        assert!(under.enemy_strings.is_empty());
        assert_eq!(under.liberties.len(), 3);
    }

    #[test]
    fn test_distance_from_stones() {
        let board = board_from(&[".....", ".....", "..X..", ".....", "....."]);
        let (to_friend, to_enemy) = distance_from_stones(&board, Color::Black, 4);
        assert_eq!(to_friend[2 * 5 + 2], 0);
        assert_eq!(to_friend[2 * 5 + 3], 1);
        assert_eq!(to_friend[5 + 2], 1);
        assert_eq!(to_friend[2], 2);
        // The far corner sits at Manhattan distance 4, right at the cap.
        assert_eq!(to_friend[4 * 5 + 4], 4);
        // No enemy stones at all: everything is unreached.
        assert!(to_enemy.iter().all(|&d| d == unreached_distance(5)));
    }

    #[test]
    fn test_distance_cap() {
        let board = board_from(&["X........", ".........", ".........", ".........",
                                 ".........", ".........", ".........", ".........",
                                 "........."]);
        let (to_friend, _) = distance_from_stones(&board, Color::Black, 4);
        let side = 9;
        // Stone sits at (8, 0); depth is capped at 4.
        assert_eq!(to_friend[8 * side], 0);
        assert_eq!(to_friend[4 * side], 4);
        assert_eq!(to_friend[3 * side], unreached_distance(side));
        assert_eq!(to_friend[0], unreached_distance(side));
    }

    #[test]
    fn test_place_occupied() {
        let mut board = Board::new(5);
        board.place((1, 1), Color::Black).unwrap();
        assert_eq!(board.place((1, 1), Color::White), Err(MoveError::Occupied));
    }
}
