//! Protocol-level tests: the session loop driven over in-memory
//! buffers, checking framing, state transitions and error reporting.

use std::fs;
use std::io::Write as _;

use tengen::features::PlaneSet;
use tengen::gtp::Session;
use tengen::player::{DistPlayer, Selection, UniformScorer};

fn session() -> Session {
    Session::new(Box::new(DistPlayer::new(
        UniformScorer,
        PlaneSet::ClarkStorkey2014,
        Selection::Best,
        Some(1),
    )))
}

/// Feed a script to a fresh session and return the raw output.
fn transcript(input: &str) -> String {
    let mut s = session();
    let mut out = Vec::new();
    s.run(input.as_bytes(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

/// Split a transcript into responses (each response ends with a blank
/// line).
fn responses(input: &str) -> Vec<String> {
    transcript(input)
        .split("\n\n")
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

#[test]
fn success_and_failure_framing() {
    let out = transcript("name\nbogus\nquit\n");
    assert_eq!(out, "= tengen\n\n? unknown command: bogus\n\n= \n\n");
}

#[test]
fn numeric_ids_are_echoed() {
    let out = transcript("7 protocol_version\n9 bogus\n3 quit\n");
    assert!(out.contains("=7 2\n"));
    assert!(out.contains("?9 "));
    assert!(out.contains("=3 \n"));
}

#[test]
fn blank_and_comment_lines_get_no_response() {
    let out = transcript("\n# a comment\n   \nname\nquit\n");
    let rs = out.matches('=').count() + out.matches('?').count();
    assert_eq!(rs, 2, "only name and quit answered: {out}");
}

#[test]
fn quit_terminates_the_loop() {
    let out = transcript("quit\nname\n");
    assert!(!out.contains("tengen"), "commands after quit are not read");
}

#[test]
fn full_game_flow() {
    let rs = responses("boardsize 9\nclear_board\nkomi 6.5\nplay b d4\ngenmove w\nquit\n");
    assert_eq!(rs.len(), 6);
    for r in &rs[..4] {
        assert!(r.starts_with('='), "setup commands succeed: {r}");
    }
    let genmove = rs[4].trim_start_matches("= ").trim();
    assert_ne!(genmove, "d4");
    assert_ne!(genmove.to_lowercase(), "d4", "genmove must avoid the occupied point");
    assert!(!genmove.is_empty());
}

#[test]
fn play_errors_keep_session_alive() {
    let rs = responses("clear_board\nplay b d4\nplay w d4\nplay w d5\nquit\n");
    assert!(rs[1].starts_with('='));
    assert!(rs[2].starts_with('?'), "occupied point is refused: {}", rs[2]);
    assert!(rs[3].starts_with('='), "session keeps going after an error");
}

#[test]
fn known_and_list_commands() {
    let out = transcript("list_commands\nquit\n");
    for cmd in ["play", "genmove", "loadsgf", "fixed_handicap", "tengen-dist"] {
        assert!(out.contains(cmd), "missing {cmd} in {out}");
    }
    let out = transcript("known_command genmove\nknown_command gibberish\nquit\n");
    assert!(out.contains("= true"));
    assert!(out.contains("= false"));
}

#[test]
fn boardsize_without_clear_board_refuses_play() {
    let rs = responses("boardsize 13\nplay b a1\nclear_board\nplay b a1\nquit\n");
    assert!(rs[0].starts_with('='));
    assert!(rs[1].starts_with('?'), "board is uninitialized: {}", rs[1]);
    assert!(rs[3].starts_with('='));
}

#[test]
fn reg_genmove_leaves_the_board_alone() {
    // reg_genmove twice must propose the same deterministic move, since
    // nothing changed in between.
    let rs = responses("boardsize 9\nclear_board\nreg_genmove b\nreg_genmove b\nquit\n");
    assert_eq!(rs[2], rs[3]);
}

#[test]
fn handicap_then_genmove_white() {
    let rs = responses("boardsize 9\nclear_board\nfixed_handicap 2\ngenmove w\nquit\n");
    let stones = rs[2].trim_start_matches("= ");
    assert_eq!(stones.split_whitespace().count(), 2);
    assert!(rs[3].starts_with('='));
}

#[test]
fn tengen_dist_reports_after_genmove() {
    let rs = responses("boardsize 9\nclear_board\ngenmove b\ntengen-dist 2\nquit\n");
    let report = &rs[3];
    assert!(report.contains("top 2 moves cover"), "{report}");
}

#[test]
fn loadsgf_replays_and_survives_bad_files() {
    let dir = std::env::temp_dir();
    let path = dir.join("tengen_gtp_test_game.sgf");
    let mut f = fs::File::create(&path).unwrap();
    // Black D4, white G7 on a 9x9 board.
    write!(f, "(;GM[1]FF[4]SZ[9]KM[5.5];B[df];W[gc])").unwrap();
    drop(f);

    let script = format!(
        "loadsgf {p}\nshowboard\nloadsgf /no/such/file.sgf\nplay b a1\nquit\n",
        p = path.display()
    );
    let rs = responses(&script);
    assert!(rs[0].starts_with('='), "loadsgf succeeds: {}", rs[0]);
    assert!(rs[1].contains('X') && rs[1].contains('O'), "both stones visible");
    assert!(rs[2].starts_with('?'), "unreadable file is an error");
    assert!(rs[3].starts_with('='), "prior state still usable after the failure");

    fs::remove_file(&path).ok();
}

#[test]
fn loadsgf_respects_the_move_limit() {
    let dir = std::env::temp_dir();
    let path = dir.join("tengen_gtp_test_limit.sgf");
    fs::write(&path, "(;SZ[9];B[aa];W[bb];B[cc])").unwrap();

    let script = format!("loadsgf {p} 1\nshowboard\nquit\n", p = path.display());
    let rs = responses(&script);
    let board = &rs[1];
    assert_eq!(board.matches('X').count(), 1, "only the first move replayed");
    assert_eq!(board.matches('O').count(), 0, "{board}");

    fs::remove_file(&path).ok();
}
