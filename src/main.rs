//! Tengen: a Go engine speaking GTP.
//!
//! - `tengen gtp` - start the GTP server on stdin/stdout
//! - `tengen demo` - play a short self-play demo

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use tengen::board::format_vertex;
use tengen::features::PlaneSet;
use tengen::gtp::Session;
use tengen::player::{
    follow_pass, Decision, DistPlayer, GameView, GeneratorPipeline, MoveGenerator, RandomPlayer,
    RandomScorer, Selection,
};

/// A Go engine with distribution-based move generation
#[derive(Parser)]
#[command(name = "tengen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (stderr)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Which move generator to run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum GeneratorKind {
    /// Pick the most probable point of the scored distribution
    Best,
    /// Sample a point from the scored distribution
    Sample,
    /// Probe random empty points (baseline)
    Random,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP server for use with GUI applications
    Gtp {
        /// Move generator variant
        #[arg(long, value_enum, default_value_t = GeneratorKind::Best)]
        generator: GeneratorKind,

        /// RNG seed for reproducible play
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a simple self-play demo
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    )
    .target(env_logger::Target::Stderr)
    .init();

    match cli.command {
        Some(Commands::Gtp { generator, seed }) => run_gtp(generator, seed),
        Some(Commands::Demo) | None => run_demo(),
    }
}

/// Resolve the generator variant once, at startup.
fn build_generator(kind: GeneratorKind, seed: Option<u64>) -> Box<dyn MoveGenerator> {
    let base: Box<dyn MoveGenerator> = match kind {
        GeneratorKind::Best => Box::new(DistPlayer::new(
            RandomScorer::new(seed),
            PlaneSet::ClarkStorkey2014,
            Selection::Best,
            seed,
        )),
        GeneratorKind::Sample => Box::new(DistPlayer::new(
            RandomScorer::new(seed),
            PlaneSet::ClarkStorkey2014,
            Selection::Sample,
            seed,
        )),
        GeneratorKind::Random => Box::new(RandomPlayer::new(seed)),
    };
    Box::new(GeneratorPipeline::new(vec![follow_pass], base))
}

fn run_gtp(kind: GeneratorKind, seed: Option<u64>) -> Result<()> {
    let mut session = Session::new(build_generator(kind, seed));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    session.run(stdin.lock(), &mut stdout)?;
    Ok(())
}

fn run_demo() -> Result<()> {
    use tengen::board::{Board, Color};

    println!("Tengen self-play demo\n");
    let mut board = Board::new(9);
    let mut generator = build_generator(GeneratorKind::Best, Some(42));
    let mut history = Vec::new();
    let mut ko = None;
    let mut color = Color::Black;

    for _ in 0..20 {
        let view = GameView {
            board: &board,
            ko,
            history: &history,
            komi: 7.5,
        };
        match generator.generate(&view, color)? {
            Decision::Play(pt) => {
                ko = board.play(pt, color)?;
                history.push(tengen::player::MoveRecord {
                    color,
                    point: Some(pt),
                });
                println!("{color} {}", format_vertex(pt));
            }
            Decision::Pass => {
                ko = None;
                history.push(tengen::player::MoveRecord { color, point: None });
                println!("{color} pass");
            }
            Decision::Resign => {
                println!("{color} resigns");
                break;
            }
        }
        color = color.opponent();
    }
    println!("\n{board}");
    generator.close();
    Ok(())
}
