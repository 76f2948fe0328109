//! Move generators and the scorer seam.
//!
//! The protocol engine owns one `MoveGenerator` and hands it a position
//! snapshot on every generation request. Distribution players shape the
//! position into a feature tensor, ask a `Scorer` for raw scores, run
//! them through the `Normalizer` and pick a point; the real scoring
//! process (a CNN behind a pipe in production) stays behind the trait.
//!
//! Generators compose through `GeneratorPipeline`: an ordered list of
//! pre-stages configured once at startup, each of which may short-circuit
//! the base generator.

use anyhow::Result;
use log::debug;

use crate::board::{Board, Color, Point};
use crate::dist::{Normalizer, ScoreGrid};
use crate::features::{FeatureEncoder, FeatureTensor, PlaneSet};

/// One entry of the move history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub color: Color,
    /// `None` is a pass.
    pub point: Option<Point>,
}

/// Read-only position snapshot handed to generators.
pub struct GameView<'a> {
    pub board: &'a Board,
    pub ko: Option<Point>,
    pub history: &'a [MoveRecord],
    pub komi: f32,
}

impl GameView<'_> {
    /// Did the last recorded move pass?
    pub fn opponent_passed(&self) -> bool {
        matches!(self.history.last(), Some(m) if m.point.is_none())
    }
}

/// What a generator wants to do with the position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Play(Point),
    Pass,
    Resign,
}

/// The pluggable move-generation collaborator.
pub trait MoveGenerator {
    fn name(&self) -> &str;

    fn generate(&mut self, view: &GameView<'_>, player: Color) -> Result<Decision>;

    /// Diagnostic report on the last move distribution, for generators
    /// that keep one.
    fn dist_stats(&self, _top: usize) -> Option<String> {
        None
    }

    /// Release externally held resources (pipes, subprocesses). Called
    /// once when the session loop exits.
    fn close(&mut self) {}
}

/// External scoring collaborator: feature tensor in, raw scores out.
/// `Ok(None)` is an explicit pass signal.
pub trait Scorer {
    fn name(&self) -> &str;

    fn score(&mut self, tensor: &FeatureTensor) -> Result<Option<ScoreGrid>>;

    fn close(&mut self) {}
}

/// Scores every point equally. Useful as a deterministic baseline.
pub struct UniformScorer;

impl Scorer for UniformScorer {
    fn name(&self) -> &str {
        "uniform"
    }

    fn score(&mut self, tensor: &FeatureTensor) -> Result<Option<ScoreGrid>> {
        Ok(Some(ScoreGrid::uniform(tensor.side)))
    }
}

/// Random scores with one spiked point, so the argmax moves around.
pub struct RandomScorer {
    rng: fastrand::Rng,
}

impl RandomScorer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        Self { rng }
    }
}

impl Scorer for RandomScorer {
    fn name(&self) -> &str {
        "random"
    }

    fn score(&mut self, tensor: &FeatureTensor) -> Result<Option<ScoreGrid>> {
        let side = tensor.side;
        let mut values: Vec<f32> = (0..side * side).map(|_| self.rng.f32()).collect();
        // Spike one point so it wins the argmax most of the time.
        let spike = self.rng.usize(0..side * side);
        values[spike] = (side * side) as f32;
        Ok(Some(ScoreGrid::new(side, values)))
    }
}

/// How a distribution player turns a distribution into a point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Take the most probable point.
    Best,
    /// Sample proportionally to the distribution.
    Sample,
}

/// Distribution-driven generator: encode, score, normalize, pick.
pub struct DistPlayer<S: Scorer> {
    label: String,
    scorer: S,
    encoder: Option<FeatureEncoder>,
    planes: PlaneSet,
    normalizer: Normalizer,
    selection: Selection,
    rng: fastrand::Rng,
}

impl<S: Scorer> DistPlayer<S> {
    pub fn new(scorer: S, planes: PlaneSet, selection: Selection, seed: Option<u64>) -> Self {
        let label = format!("dist-{}", scorer.name());
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        Self {
            label,
            scorer,
            encoder: None,
            planes,
            normalizer: Normalizer::new(),
            selection,
            rng,
        }
    }

    fn encoder_for(&mut self, side: usize) -> &FeatureEncoder {
        // Rebuilt only when the board size changes.
        if self.encoder.as_ref().is_none_or(|e| e.side() != side) {
            self.encoder = Some(FeatureEncoder::new(self.planes, side));
        }
        self.encoder.as_ref().unwrap()
    }

    fn pick(&mut self, dist: &ScoreGrid) -> Point {
        match self.selection {
            Selection::Best => dist.argmax(),
            Selection::Sample => {
                let side = dist.side();
                let mut target = self.rng.f32();
                for row in 0..side {
                    for col in 0..side {
                        target -= dist.at((row, col));
                        if target <= 0.0 {
                            return (row, col);
                        }
                    }
                }
                // Rounding left us past the end; fall back to the mode.
                dist.argmax()
            }
        }
    }
}

impl<S: Scorer> MoveGenerator for DistPlayer<S> {
    fn name(&self) -> &str {
        &self.label
    }

    fn generate(&mut self, view: &GameView<'_>, player: Color) -> Result<Decision> {
        let tensor = self
            .encoder_for(view.board.side())
            .encode(view.board, view.ko, player);
        let raw = self.scorer.score(&tensor)?;
        match self
            .normalizer
            .normalize(raw, view.board, player, view.ko)
        {
            Some(dist) => {
                let pt = self.pick(&dist);
                debug!("{}: playing {:?} for {player}", self.label, pt);
                Ok(Decision::Play(pt))
            }
            None => Ok(Decision::Pass),
        }
    }

    fn dist_stats(&self, top: usize) -> Option<String> {
        Some(self.normalizer.stats(top))
    }

    fn close(&mut self) {
        self.scorer.close();
    }
}

/// Probes a handful of random points; resigns when none is empty.
pub struct RandomPlayer {
    rng: fastrand::Rng,
}

impl RandomPlayer {
    const PROBES: usize = 10;

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        Self { rng }
    }
}

impl MoveGenerator for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn generate(&mut self, view: &GameView<'_>, _player: Color) -> Result<Decision> {
        if view.opponent_passed() {
            return Ok(Decision::Pass);
        }
        let side = view.board.side();
        for _ in 0..Self::PROBES {
            let pt = (self.rng.usize(0..side), self.rng.usize(0..side));
            if view.board.get(pt).is_none() {
                return Ok(Decision::Play(pt));
            }
        }
        Ok(Decision::Resign)
    }
}

/// A pre-stage: may decide instead of the base generator.
pub type Stage = fn(&GameView<'_>, Color) -> Option<Decision>;

/// Answer an opponent pass with a pass once the opening is over.
pub fn follow_pass(view: &GameView<'_>, _player: Color) -> Option<Decision> {
    if view.history.len() > 2 && view.opponent_passed() {
        Some(Decision::Pass)
    } else {
        None
    }
}

/// An explicit ordered pipeline: stages run in order and the first one
/// that decides wins; otherwise the base generator runs.
pub struct GeneratorPipeline {
    stages: Vec<Stage>,
    base: Box<dyn MoveGenerator>,
}

impl GeneratorPipeline {
    pub fn new(stages: Vec<Stage>, base: Box<dyn MoveGenerator>) -> Self {
        Self { stages, base }
    }
}

impl MoveGenerator for GeneratorPipeline {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn generate(&mut self, view: &GameView<'_>, player: Color) -> Result<Decision> {
        for stage in &self.stages {
            if let Some(decision) = stage(view, player) {
                debug!("pipeline stage decided {decision:?} for {player}");
                return Ok(decision);
            }
        }
        self.base.generate(view, player)
    }

    fn dist_stats(&self, top: usize) -> Option<String> {
        self.base.dist_stats(top)
    }

    fn close(&mut self) {
        self.base.close();
    }
}
