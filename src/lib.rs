//! Tengen: a Go rules engine behind a GTP server, with pluggable
//! distribution-based move generation.
//!
//! The rules core partitions a position into strings, tracks their
//! liberties and derives an exact legal-move mask (captures, suicide,
//! simple ko). On top of it sits a GTP session that keeps per-game state
//! and dispatches commands, asking a pluggable generator for moves. The
//! bundled generators score positions through the [`player::Scorer`]
//! seam; real scoring backends (a CNN behind a pipe, say) plug in there.
//!
//! ## Modules
//!
//! - [`board`] - grid, atomic move execution, vertex notation
//! - [`strings`] - string/liberty analysis, masks, distance fields
//! - [`legal`] - legal-move classification
//! - [`dist`] - score normalization into move distributions
//! - [`features`] - position encodings for external scorers
//! - [`player`] - move generators, scorers, the generation pipeline
//! - [`sgf`] - game-record reading for `loadsgf`
//! - [`gtp`] - the protocol session engine
//! - [`error`] - error taxonomy
//!
//! ## Example
//!
//! ```
//! use tengen::board::{Board, Color};
//! use tengen::legal::legal_moves;
//!
//! let mut board = Board::new(9);
//! board.play((4, 4), Color::Black).unwrap();
//! let mask = legal_moves(&board, Color::White, None);
//! assert!(!mask[4 * 9 + 4]);
//! ```

pub mod board;
pub mod dist;
pub mod error;
pub mod features;
pub mod gtp;
pub mod legal;
pub mod player;
pub mod sgf;
pub mod strings;
