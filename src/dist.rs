//! Move probability distributions.
//!
//! A scorer hands back a raw non-negative score per point. The
//! `Normalizer` turns that into a proper distribution: scores on illegal
//! points are zeroed through the legality mask, the rest is renormalized
//! to sum to 1. When nothing legal carries any score the position is a
//! pass.
//!
//! The last distribution is kept for diagnostic reporting only; no
//! control decision ever reads it back.

use std::fmt::Write as _;

use log::debug;

use crate::board::{Board, Color, Point, format_vertex};
use crate::legal::legal_moves;

/// A grid of per-point scores or probabilities, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreGrid {
    side: usize,
    values: Vec<f32>,
}

impl ScoreGrid {
    pub fn new(side: usize, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), side * side);
        Self { side, values }
    }

    /// Uniform grid of ones.
    pub fn uniform(side: usize) -> Self {
        Self::new(side, vec![1.0; side * side])
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn at(&self, (row, col): Point) -> f32 {
        self.values[row * self.side + col]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }

    /// Point with the highest value; ties break toward the lowest index.
    pub fn argmax(&self) -> Point {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        (best / self.side, best % self.side)
    }

    /// Indices sorted by descending value.
    fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[b].total_cmp(&self.values[a]));
        order
    }
}

/// Masks raw score grids into legal-move distributions.
#[derive(Default)]
pub struct Normalizer {
    last: Option<(ScoreGrid, Color)>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw score grid against the position's legality mask.
    ///
    /// `None` in means the scorer already chose to pass; `None` out means
    /// no legal point carries positive score, so the caller should pass.
    pub fn normalize(
        &mut self,
        raw: Option<ScoreGrid>,
        board: &Board,
        player: Color,
        ko: Option<Point>,
    ) -> Option<ScoreGrid> {
        let dist = raw.and_then(|mut grid| {
            let mask = legal_moves(board, player, ko);
            let mut masked_out = 0.0f32;
            for (value, &ok) in grid.values.iter_mut().zip(&mask) {
                if !ok {
                    masked_out += *value;
                    *value = 0.0;
                }
            }
            debug!("masked-out score mass: {masked_out:.6}");

            let sum = grid.sum();
            if sum > 0.0 {
                for value in &mut grid.values {
                    *value /= sum;
                }
                Some(grid)
            } else {
                debug!("no legal scored point, passing");
                None
            }
        });

        self.last = dist.clone().map(|d| (d, player));
        dist
    }

    /// Human-readable report on the most recent distribution: mean,
    /// standard deviation and the `top` most probable vertices with
    /// their cumulative coverage. Empty when nothing was computed yet.
    pub fn stats(&self, top: usize) -> String {
        let Some((dist, player)) = &self.last else {
            return String::new();
        };
        let n = dist.values.len() as f32;
        let mean = dist.sum() / n;
        let var = dist.values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;

        let mut out = String::new();
        let _ = writeln!(out, "last distribution for {player}");
        let _ = writeln!(out, "mean:   {mean:.6}");
        let _ = writeln!(out, "stddev: {:.6}", var.sqrt());
        let mut covered = 0.0;
        for (rank, i) in dist.ranked().into_iter().take(top).enumerate() {
            let pt = (i / dist.side, i % dist.side);
            let prob = dist.values[i];
            covered += prob;
            let _ = writeln!(out, "{}: {}  {prob:.6}", rank + 1, format_vertex(pt));
        }
        let _ = write!(out, "top {top} moves cover: {:.2} %", 100.0 * covered);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_over_three_legal_points() {
        // 3x3 board with 6 occupied points leaves exactly 3 legal moves.
        let mut board = Board::new(3);
        for (pt, color) in [
            ((0, 0), Color::Black),
            ((0, 1), Color::White),
            ((1, 0), Color::Black),
            ((1, 1), Color::White),
            ((2, 0), Color::Black),
            ((2, 1), Color::White),
        ] {
            board.place(pt, color).unwrap();
        }
        let mut norm = Normalizer::new();
        let dist = norm
            .normalize(Some(ScoreGrid::uniform(3)), &board, Color::Black, None)
            .expect("three legal points remain");
        for pt in [(0, 2), (1, 2), (2, 2)] {
            assert!((dist.at(pt) - 1.0 / 3.0).abs() < 1e-6);
        }
        for pt in [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)] {
            assert_eq!(dist.at(pt), 0.0);
        }
        assert!((dist.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pass_when_masked_sum_zero() {
        let board = Board::new(3);
        let mut norm = Normalizer::new();
        // All-zero raw scores: nothing legal carries score.
        let dist = norm.normalize(
            Some(ScoreGrid::new(3, vec![0.0; 9])),
            &board,
            Color::Black,
            None,
        );
        assert!(dist.is_none());
    }

    #[test]
    fn test_scorer_pass_is_forwarded() {
        let board = Board::new(3);
        let mut norm = Normalizer::new();
        assert!(norm.normalize(None, &board, Color::White, None).is_none());
    }

    #[test]
    fn test_ko_point_gets_zero() {
        let board = Board::new(3);
        let mut norm = Normalizer::new();
        let dist = norm
            .normalize(Some(ScoreGrid::uniform(3)), &board, Color::Black, Some((1, 1)))
            .unwrap();
        assert_eq!(dist.at((1, 1)), 0.0);
        assert!((dist.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stats_lists_top_moves() {
        let board = Board::new(3);
        let mut values = vec![0.0; 9];
        values[4] = 3.0; // (1, 1) = B2
        values[0] = 1.0; // (0, 0) = A1
        let mut norm = Normalizer::new();
        norm.normalize(Some(ScoreGrid::new(3, values)), &board, Color::Black, None)
            .unwrap();
        let stats = norm.stats(2);
        assert!(stats.contains("B2"), "{stats}");
        assert!(stats.contains("0.75"), "{stats}");
        assert!(stats.contains("top 2 moves cover: 100.00 %"), "{stats}");
    }

    #[test]
    fn test_stats_empty_before_first_distribution() {
        let norm = Normalizer::new();
        assert_eq!(norm.stats(3), "");
    }

    #[test]
    fn test_argmax() {
        let mut values = vec![0.0; 9];
        values[7] = 2.0;
        let grid = ScoreGrid::new(3, values);
        assert_eq!(grid.argmax(), (2, 1));
    }
}
