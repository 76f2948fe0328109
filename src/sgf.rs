//! Game-record (SGF) reading.
//!
//! `loadsgf` replays persisted games, so the engine needs to read the
//! main variation of an SGF file: board size, komi, setup stones and the
//! ordered move list, plus the player ranks as opaque metadata. Nothing
//! else of the format matters here; variations beyond the first child
//! are ignored and unknown properties are skipped.
//!
//! SGF coordinates are letter pairs counted from the top-left corner;
//! they are converted to bottom-origin points on the way in.

use std::fs;
use std::path::Path;

use crate::board::{Color, MAX_SIDE, Point};
use crate::error::RecordError;

/// The replayable content of one game record.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub side: usize,
    pub komi: f32,
    /// Setup stones (`AB`/`AW`), placed before any move.
    pub setup: Vec<(Color, Point)>,
    /// Ordered moves; `None` is a pass.
    pub moves: Vec<(Color, Option<Point>)>,
    pub black_rank: Option<String>,
    pub white_rank: Option<String>,
}

/// Read and parse a game record from a file.
pub fn read_file(path: &Path) -> Result<GameRecord, RecordError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

/// Parse a game record from SGF text (main variation only).
pub fn parse(text: &str) -> Result<GameRecord, RecordError> {
    let props = collect_properties(text)?;

    let mut record = GameRecord {
        side: 19,
        komi: 0.0,
        setup: Vec::new(),
        moves: Vec::new(),
        black_rank: None,
        white_rank: None,
    };

    // Size first: move coordinates depend on it.
    for (ident, values) in &props {
        if ident == "SZ" {
            let side: usize = first_value(values, "SZ")?
                .parse()
                .map_err(|_| RecordError::Syntax("bad SZ value".into()))?;
            if side < 2 || side > MAX_SIDE {
                return Err(RecordError::UnsupportedSize(side));
            }
            record.side = side;
        }
    }

    for (ident, values) in &props {
        match ident.as_str() {
            "SZ" => {}
            "KM" => {
                record.komi = first_value(values, "KM")?
                    .parse()
                    .map_err(|_| RecordError::Syntax("bad KM value".into()))?;
            }
            "BR" => record.black_rank = Some(first_value(values, "BR")?.to_string()),
            "WR" => record.white_rank = Some(first_value(values, "WR")?.to_string()),
            "AB" | "AW" => {
                let color = if ident == "AB" { Color::Black } else { Color::White };
                for v in values {
                    let pt = parse_coord(v, record.side)?
                        .ok_or_else(|| RecordError::Syntax(format!("bad setup point '{v}'")))?;
                    record.setup.push((color, pt));
                }
            }
            "B" | "W" => {
                let color = if ident == "B" { Color::Black } else { Color::White };
                let pt = parse_coord(first_value(values, "move")?, record.side)?;
                record.moves.push((color, pt));
            }
            _ => {}
        }
    }

    Ok(record)
}

/// Walk the main variation and list `(identifier, values)` pairs in
/// order. At every level only the first subtree is followed; sibling
/// subtrees are consumed without being read.
fn collect_properties(text: &str) -> Result<Vec<(String, Vec<String>)>, RecordError> {
    let mut props: Vec<(String, Vec<String>)> = Vec::new();
    let mut chars = text.chars().peekable();

    if !text.trim_start().starts_with('(') {
        return Err(RecordError::Syntax("missing game tree".into()));
    }

    let mut depth = 0usize;
    // Per open level: has a child subtree already been closed?
    let mut closed_child: Vec<bool> = Vec::new();
    while let Some(c) = chars.next() {
        match c {
            '(' => {
                if depth > 0 && closed_child[depth - 1] {
                    // A sibling of the main line: skip it wholesale.
                    skip_subtree(&mut chars)?;
                } else {
                    depth += 1;
                    closed_child.push(false);
                }
            }
            ')' => {
                if depth == 0 {
                    return Err(RecordError::Syntax("unbalanced parentheses".into()));
                }
                depth -= 1;
                closed_child.pop();
                if depth > 0 {
                    closed_child[depth - 1] = true;
                }
            }
            ';' => {}
            c if c.is_ascii_uppercase() => {
                let mut ident = String::from(c);
                while let Some(&c2) = chars.peek() {
                    if c2.is_ascii_uppercase() {
                        ident.push(c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let mut values = Vec::new();
                loop {
                    // Property values may be separated by whitespace.
                    while chars.peek().is_some_and(|c2| c2.is_whitespace()) {
                        chars.next();
                    }
                    if chars.peek() != Some(&'[') {
                        break;
                    }
                    chars.next();
                    values.push(read_value(&mut chars)?);
                }
                if values.is_empty() {
                    return Err(RecordError::Syntax(format!("property {ident} has no value")));
                }
                props.push((ident, values));
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(RecordError::Syntax("unbalanced parentheses".into()));
    }
    if props.is_empty() {
        return Err(RecordError::Syntax("empty game tree".into()));
    }
    Ok(props)
}

/// Read one bracketed value body, the opening `[` already consumed.
fn read_value(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, RecordError> {
    let mut value = String::new();
    let mut escaped = false;
    loop {
        let Some(c) = chars.next() else {
            return Err(RecordError::Syntax("unterminated value".into()));
        };
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ']' {
            return Ok(value);
        } else {
            value.push(c);
        }
    }
}

/// Consume a balanced subtree, the opening `(` already consumed.
/// Parentheses inside bracketed values do not count.
fn skip_subtree(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<(), RecordError> {
    let mut depth = 1usize;
    while let Some(c) = chars.next() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            '[' => {
                read_value(chars)?;
            }
            _ => {}
        }
    }
    Err(RecordError::Syntax("unbalanced parentheses".into()))
}

fn first_value<'a>(values: &'a [String], what: &str) -> Result<&'a str, RecordError> {
    values
        .first()
        .map(String::as_str)
        .ok_or_else(|| RecordError::Syntax(format!("{what} has no value")))
}

/// Parse an SGF coordinate pair. Empty and `tt` (on boards up to 19)
/// mean pass.
fn parse_coord(s: &str, side: usize) -> Result<Option<Point>, RecordError> {
    if s.is_empty() || (s == "tt" && side <= 19) {
        return Ok(None);
    }
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return Err(RecordError::Syntax(format!("bad coordinate '{s}'")));
    }
    let col = (bytes[0].to_ascii_lowercase() as i32) - ('a' as i32);
    let row_from_top = (bytes[1].to_ascii_lowercase() as i32) - ('a' as i32);
    if col < 0 || row_from_top < 0 || col as usize >= side || row_from_top as usize >= side {
        return Err(RecordError::Syntax(format!("coordinate '{s}' off board")));
    }
    Ok(Some((side - 1 - row_from_top as usize, col as usize)))
}
