//! Go Text Protocol (GTP) session engine.
//!
//! One session per connection: a synchronous line loop that owns the
//! game state and a move generator. Every command is processed fully,
//! including any blocking call into the generator, before the next line
//! is read. Responses are framed as `=<id> <payload>` on success and
//! `?<id> <message>` on failure, each terminated by a blank line and
//! flushed immediately.
//!
//! The loop ends on `quit` or end-of-input, after which the generator's
//! `close` hook releases any externally held resources.

use std::io::{self, BufRead, Write};
use std::path::Path;

use log::{debug, info};

use crate::board::{Board, Color, Point, format_vertex, parse_vertex, MAX_SIDE};
use crate::error::{CommandError, MoveError, ProtocolError};
use crate::player::{Decision, GameView, MoveGenerator, MoveRecord};
use crate::sgf;

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "fixed_handicap",
    "genmove",
    "known_command",
    "komi",
    "list_commands",
    "loadsgf",
    "name",
    "place_free_handicap",
    "play",
    "protocol_version",
    "quit",
    "reg_genmove",
    "set_free_handicap",
    "showboard",
    "tengen-dist",
    "version",
];

const DEFAULT_SIZE: usize = 19;
const DEFAULT_KOMI: f32 = 7.5;

/// Everything one game in progress consists of.
pub struct GameState {
    side: usize,
    komi: f32,
    /// `None` between `boardsize` and the next `clear_board`.
    board: Option<Board>,
    ko: Option<Point>,
    history: Vec<MoveRecord>,
    to_move: Color,
}

impl GameState {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            komi: DEFAULT_KOMI,
            board: Some(Board::new(side)),
            ko: None,
            history: Vec::new(),
            to_move: Color::Black,
        }
    }

    pub fn board(&self) -> Result<&Board, ProtocolError> {
        self.board.as_ref().ok_or(ProtocolError::BoardUninitialized)
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    /// Apply one move (or pass) atomically: ko check, board play, then
    /// history/ko/turn bookkeeping. On error nothing changes.
    pub fn play(&mut self, color: Color, point: Option<Point>) -> Result<(), CommandError> {
        let Some(board) = self.board.as_mut() else {
            return Err(ProtocolError::BoardUninitialized.into());
        };
        match point {
            Some(pt) => {
                if self.ko == Some(pt) {
                    return Err(MoveError::KoViolation.into());
                }
                self.ko = board.play(pt, color).map_err(CommandError::Move)?;
            }
            // A pass clears the ko like any other move.
            None => self.ko = None,
        }
        self.history.push(MoveRecord { color, point });
        self.to_move = color.opponent();
        Ok(())
    }
}

/// A GTP session: game state plus the pluggable move generator.
pub struct Session {
    state: GameState,
    generator: Box<dyn MoveGenerator>,
}

impl Session {
    pub fn new(generator: Box<dyn MoveGenerator>) -> Self {
        Self {
            state: GameState::new(DEFAULT_SIZE),
            generator,
        }
    }

    /// Run the command loop until `quit` or end-of-input, then release
    /// the generator's resources.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> io::Result<()> {
        let result = self.run_loop(reader, writer);
        info!("session over, closing generator");
        self.generator.close();
        result
    }

    fn run_loop<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            let command = parts[0].to_lowercase();
            let args = &parts[1..];

            debug!("command: {command} {args:?}");
            let result = self.execute(&command, args);

            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            match &result {
                Ok(payload) => writeln!(writer, "={id_str} {payload}\n")?,
                Err(err) => writeln!(writer, "?{id_str} {err}\n")?,
            }
            writer.flush()?;

            if command == "quit" && result.is_ok() {
                break;
            }
        }
        Ok(())
    }

    /// Execute a single command against the session state.
    pub fn execute(&mut self, command: &str, args: &[&str]) -> Result<String, CommandError> {
        match command {
            "name" => Ok("tengen".to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => Ok("2".to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let arg = first(args, "command name")?;
                let known = KNOWN_COMMANDS.contains(&arg.to_lowercase().as_str());
                Ok(if known { "true" } else { "false" }.to_string())
            }

            "quit" => Ok(String::new()),

            "boardsize" => {
                let side = parse_arg::<usize>(args, "size")?;
                if side < 2 || side > MAX_SIDE {
                    return Err(ProtocolError::UnacceptableSize(side).into());
                }
                self.state.side = side;
                self.state.board = None;
                self.state.history.clear();
                self.state.ko = None;
                Ok(String::new())
            }

            "clear_board" => {
                let komi = self.state.komi;
                let side = self.state.side;
                self.state = GameState::new(side);
                self.state.komi = komi;
                Ok(String::new())
            }

            "komi" => {
                self.state.komi = parse_arg::<f32>(args, "komi")?;
                Ok(String::new())
            }

            "play" => {
                let color = Color::parse(first(args, "color")?)?;
                let vertex = args.get(1).ok_or(ProtocolError::MissingArgument("vertex"))?;
                let point = parse_vertex(vertex, self.state.side)?;
                self.state.play(color, point)?;
                Ok(String::new())
            }

            "genmove" => {
                let color = Color::parse(first(args, "color")?)?;
                match self.generate(color)? {
                    Decision::Play(pt) => {
                        self.state.play(color, Some(pt))?;
                        Ok(format_vertex(pt))
                    }
                    Decision::Pass => {
                        self.state.play(color, None)?;
                        Ok("pass".to_string())
                    }
                    Decision::Resign => Ok("resign".to_string()),
                }
            }

            "reg_genmove" => {
                let color = Color::parse(first(args, "color")?)?;
                match self.generate(color)? {
                    Decision::Play(pt) => Ok(format_vertex(pt)),
                    Decision::Pass => Ok("pass".to_string()),
                    Decision::Resign => Ok("resign".to_string()),
                }
            }

            "fixed_handicap" | "place_free_handicap" => {
                let n = parse_arg::<usize>(args, "handicap")?;
                let points = handicap_points(n, self.state.side)?;
                self.place_handicap(&points)?;
                let vertices: Vec<String> = points.iter().map(|&p| format_vertex(p)).collect();
                Ok(vertices.join(" "))
            }

            "set_free_handicap" => {
                if args.len() < 2 {
                    return Err(ProtocolError::BadHandicap(args.len()).into());
                }
                let mut points = Vec::with_capacity(args.len());
                for arg in args {
                    let pt = parse_vertex(arg, self.state.side)?
                        .ok_or_else(|| ProtocolError::BadVertex(arg.to_string()))?;
                    if points.contains(&pt) {
                        return Err(ProtocolError::BadVertex(arg.to_string()).into());
                    }
                    points.push(pt);
                }
                self.place_handicap(&points)?;
                Ok(String::new())
            }

            "loadsgf" => {
                let path = first(args, "filename")?;
                let limit = match args.get(1) {
                    Some(v) => Some(parse_one::<usize>(v, "move limit")?),
                    None => None,
                };
                self.load_record(Path::new(path), limit)?;
                Ok(String::new())
            }

            "showboard" => {
                let board = self.state.board()?;
                Ok(format!("\n{}", board.to_string().trim_end()))
            }

            "tengen-dist" => {
                let top = match args.first() {
                    Some(v) => parse_one::<usize>(v, "top count")?,
                    None => 3,
                };
                Ok(self.generator.dist_stats(top).unwrap_or_default())
            }

            _ => Err(ProtocolError::UnknownCommand(command.to_string()).into()),
        }
    }

    fn generate(&mut self, color: Color) -> Result<Decision, CommandError> {
        let board = self.state.board.as_ref().ok_or(ProtocolError::BoardUninitialized)?;
        let view = GameView {
            board,
            ko: self.state.ko,
            history: &self.state.history,
            komi: self.state.komi,
        };
        self.generator
            .generate(&view, color)
            .map_err(CommandError::Generator)
    }

    /// Place handicap stones in setup mode and give white the turn.
    fn place_handicap(&mut self, points: &[Point]) -> Result<(), CommandError> {
        let board = self.state.board.as_ref().ok_or(ProtocolError::BoardUninitialized)?;
        if !board.is_empty() {
            return Err(ProtocolError::BoardNotEmpty.into());
        }
        let board = self.state.board.as_mut().expect("checked above");
        for &pt in points {
            board.place(pt, Color::Black).map_err(CommandError::Move)?;
        }
        self.state.to_move = Color::White;
        Ok(())
    }

    /// Replace the session state by replaying a game record. The prior
    /// state survives any failure untouched.
    fn load_record(&mut self, path: &Path, limit: Option<usize>) -> Result<(), CommandError> {
        let record = sgf::read_file(path)?;

        let mut state = GameState::new(record.side);
        state.komi = record.komi;
        let board = state.board.as_mut().expect("fresh state has a board");
        for &(color, pt) in &record.setup {
            board.place(pt, color).map_err(|e| {
                crate::error::RecordError::IllegalMove {
                    index: 0,
                    vertex: format_vertex(pt),
                    source: e,
                }
            })?;
        }
        if !record.setup.is_empty() {
            state.to_move = Color::White;
        }

        let count = limit.unwrap_or(record.moves.len()).min(record.moves.len());
        for (i, &(color, pt)) in record.moves[..count].iter().enumerate() {
            state.play(color, pt).map_err(|e| match e {
                CommandError::Move(source) => {
                    CommandError::Record(crate::error::RecordError::IllegalMove {
                        index: i + 1,
                        vertex: pt.map(format_vertex).unwrap_or_else(|| "pass".into()),
                        source,
                    })
                }
                other => other,
            })?;
        }

        info!(
            "loaded record from {}: {} setup stones, {count} moves replayed",
            path.display(),
            record.setup.len(),
        );
        self.state = state;
        Ok(())
    }
}

/// Parse an optional numeric command id off the front of the line.
fn parse_id(line: &str) -> (Option<u32>, &str) {
    let trimmed = line.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    if end > 0 {
        if let Ok(id) = trimmed[..end].parse::<u32>() {
            return (Some(id), trimmed[end..].trim());
        }
    }
    (None, trimmed)
}

fn first<'a>(args: &[&'a str], what: &'static str) -> Result<&'a str, ProtocolError> {
    args.first().copied().ok_or(ProtocolError::MissingArgument(what))
}

fn parse_arg<T: std::str::FromStr>(args: &[&str], what: &'static str) -> Result<T, ProtocolError> {
    parse_one(first(args, what)?, what)
}

fn parse_one<T: std::str::FromStr>(value: &str, what: &'static str) -> Result<T, ProtocolError> {
    value.parse().map_err(|_| ProtocolError::BadArgument {
        what,
        value: value.to_string(),
    })
}

/// Star points for a fixed handicap, in the conventional order.
fn handicap_points(n: usize, side: usize) -> Result<Vec<Point>, ProtocolError> {
    if !(2..=9).contains(&n) || side < 7 {
        return Err(ProtocolError::BadHandicap(n));
    }
    // Placements beyond the four corners need the middle lines.
    if n > 4 && side % 2 == 0 {
        return Err(ProtocolError::BadHandicap(n));
    }
    let edge = if side >= 13 { 3 } else { 2 };
    let far = side - 1 - edge;
    let mid = side / 2;

    let mut points = vec![(edge, edge), (far, far)];
    if n >= 3 {
        points.push((far, edge));
    }
    if n >= 4 {
        points.push((edge, far));
    }
    if n >= 6 {
        points.push((mid, edge));
        points.push((mid, far));
    }
    if n >= 8 {
        points.push((edge, mid));
        points.push((far, mid));
    }
    // Odd counts above 4 take the center as well.
    if n >= 5 && n % 2 == 1 {
        points.push((mid, mid));
    }
    Ok(points)
}
