//! Position feature tensors for external scorers.
//!
//! A scorer consumes a fixed-shape stack of float planes describing the
//! position; this module shapes that stack. The core never interprets
//! scores, it only encodes positions and consumes the resulting grid.
//!
//! Encodings are an explicit enum, resolved once when the encoder is
//! built. The per-plane layout:
//!
//! - `ClarkStorkey2014`: 7 binary planes, one-hot by owner and liberty
//!   count (friend with 1 / 2 / >=3 liberties, enemy likewise, ko point).
//! - `DeepCl`: the same planes scaled to 0/255 floats, matching the
//!   binary v2 dataset convention.
//! - `Lattice`: the 7 planes plus two bounded distance fields (to the
//!   nearest friendly and enemy stone).

use crate::board::{Board, Color, Point};
use crate::strings::{self, color_mask, distance_from_stones};

/// Depth cap for the distance planes.
const DISTANCE_DEPTH: u32 = 4;

/// Supported position encodings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaneSet {
    ClarkStorkey2014,
    DeepCl,
    Lattice,
}

impl PlaneSet {
    pub fn plane_count(self) -> usize {
        match self {
            PlaneSet::ClarkStorkey2014 | PlaneSet::DeepCl => 7,
            PlaneSet::Lattice => 9,
        }
    }
}

/// A stack of `planes` x `side` x `side` floats, planes outermost.
pub struct FeatureTensor {
    pub planes: usize,
    pub side: usize,
    pub values: Vec<f32>,
}

impl FeatureTensor {
    pub fn at(&self, plane: usize, (row, col): Point) -> f32 {
        self.values[(plane * self.side + row) * self.side + col]
    }
}

/// Shapes position snapshots into feature tensors.
///
/// The encoder owns its per-size geometry; build one per board size and
/// reuse it for every encode call.
pub struct FeatureEncoder {
    planes: PlaneSet,
    side: usize,
}

impl FeatureEncoder {
    pub fn new(planes: PlaneSet, side: usize) -> Self {
        Self { planes, side }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn plane_count(&self) -> usize {
        self.planes.plane_count()
    }

    /// Encode a position from `player`'s perspective.
    pub fn encode(&self, board: &Board, ko: Option<Point>, player: Color) -> FeatureTensor {
        assert_eq!(board.side(), self.side, "encoder built for a different size");
        let side = self.side;
        let area = side * side;
        let mut values = vec![0.0f32; self.plane_count() * area];

        let string_map = strings::analyze(board);
        let mask = color_mask(board, player);
        let hot = match self.planes {
            PlaneSet::DeepCl => 255.0,
            _ => 1.0,
        };

        for row in 0..side {
            for col in 0..side {
                let i = row * side + col;
                if mask.empty[i] {
                    continue;
                }
                let libs = string_map.liberty_count((row, col));
                // Planes 0-2 friend, 3-5 enemy, bucketed 1 / 2 / >=3.
                // Setup positions may hold a libertyless string; it goes
                // in the 1-liberty bucket.
                let bucket = libs.clamp(1, 3) - 1;
                let plane = if mask.friend[i] { bucket } else { 3 + bucket };
                values[plane * area + i] = hot;
            }
        }
        if let Some((row, col)) = ko {
            values[6 * area + row * side + col] = hot;
        }

        if self.planes == PlaneSet::Lattice {
            let (to_friend, to_enemy) = distance_from_stones(board, player, DISTANCE_DEPTH);
            for i in 0..area {
                values[7 * area + i] = to_friend[i] as f32;
                values[8 * area + i] = to_enemy[i] as f32;
            }
        }

        FeatureTensor {
            planes: self.plane_count(),
            side,
            values,
        }
    }
}
