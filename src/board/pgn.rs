//! PGN reader and writer.
//!
//! The reader is lenient: anything it does not understand inside the movetext
//! is handed to the rules adapter as a SAN token, which then decides whether
//! the game replays. Comments, variations and NAGs are dropped.

use crate::board::fen::START_FEN;
use crate::board::rules::{Game, Outcome};
use crate::board::square::Side;

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];
const ROSTER: [(&str, &str); 7] = [
    ("Event", "?"),
    ("Site", "?"),
    ("Date", "????.??.??"),
    ("Round", "?"),
    ("White", "?"),
    ("Black", "?"),
    ("Result", "*"),
];
const LINE_WIDTH: usize = 80;

/// A parsed game record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub headers: Vec<(String, String)>,
    pub sans: Vec<String>,
    pub result: Option<String>,
}

impl PgnGame {
    /// Value of a tag pair, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Read tag pairs and mainline SAN tokens from PGN text.
pub fn parse(text: &str) -> PgnGame {
    let mut game = PgnGame::default();
    let mut chars = text.chars().peekable();
    let mut token = String::new();
    let mut depth = 0usize;

    while let Some(ch) = chars.next() {
        match ch {
            '[' if depth == 0 => {
                flush(&mut token, &mut game);
                let mut tag = String::new();
                let mut quoted = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' if quoted => {
                            if let Some(escaped) = chars.next() {
                                tag.push(escaped);
                            }
                        }
                        '"' => {
                            quoted = !quoted;
                            tag.push(c);
                        }
                        ']' if !quoted => break,
                        _ => tag.push(c),
                    }
                }
                if let Some(pair) = parse_tag(&tag) {
                    game.headers.push(pair);
                }
            }
            '{' => {
                flush_at(&mut token, &mut game, depth);
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
            }
            ';' => {
                flush_at(&mut token, &mut game, depth);
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                flush_at(&mut token, &mut game, depth);
                depth += 1;
            }
            ')' => {
                token.clear();
                depth = depth.saturating_sub(1);
            }
            c if c.is_whitespace() => flush_at(&mut token, &mut game, depth),
            c => token.push(c),
        }
    }
    flush_at(&mut token, &mut game, depth);
    game
}

fn flush_at(token: &mut String, game: &mut PgnGame, depth: usize) {
    if depth > 0 {
        token.clear();
    } else {
        flush(token, game);
    }
}

fn flush(token: &mut String, game: &mut PgnGame) {
    if token.is_empty() {
        return;
    }
    let raw = std::mem::take(token);
    if RESULTS.contains(&raw.as_str()) {
        game.result = Some(raw);
        return;
    }
    if raw.starts_with('$') {
        return;
    }
    let san = strip_move_number(&raw);
    if !san.is_empty() {
        game.sans.push(san.to_string());
    }
}

/// `12.` / `12...` / `12.Nf3` -> `""` / `""` / `"Nf3"`. Castling written
/// with zeros is left alone.
fn strip_move_number(token: &str) -> &str {
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || !token[digits..].starts_with('.') {
        return token;
    }
    token[digits..].trim_start_matches('.')
}

fn parse_tag(tag: &str) -> Option<(String, String)> {
    let tag = tag.trim();
    let (name, rest) = tag.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.to_string()))
}

/// Embedded `[FEN "..."]` tag of a parsed record, if it carries one.
pub fn fen_tag(record: &PgnGame) -> Option<String> {
    record
        .header("FEN")
        .map(str::trim)
        .filter(|fen| !fen.is_empty())
        .map(str::to_string)
}

/// Result token for the live position of `game`.
pub fn result_token(game: &Game) -> &'static str {
    match game.outcome() {
        Outcome::Checkmate { winner: Side::White } => "1-0",
        Outcome::Checkmate { winner: Side::Black } => "0-1",
        Outcome::Stalemate => "1/2-1/2",
        Outcome::Ongoing => "*",
    }
}

/// Export `game` as PGN.
///
/// The seven-tag roster is always present; caller headers override its
/// defaults and any extra tags follow it. `Result`, `SetUp` and `FEN` are
/// derived from the game and cannot be overridden.
pub fn write(headers: &[(String, String)], game: &Game) -> String {
    let result = result_token(game);
    let lookup = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let mut out = String::new();
    for (name, default) in ROSTER {
        let value = if name == "Result" {
            result
        } else {
            lookup(name).unwrap_or(default)
        };
        out.push_str(&format!("[{} \"{}\"]\n", name, escape(value)));
    }
    if game.start_fen() != START_FEN {
        out.push_str("[SetUp \"1\"]\n");
        out.push_str(&format!("[FEN \"{}\"]\n", escape(game.start_fen())));
    }
    for (name, value) in headers {
        let reserved = ROSTER.iter().any(|(key, _)| key == name) || name == "SetUp" || name == "FEN";
        if !reserved {
            out.push_str(&format!("[{} \"{}\"]\n", name, escape(value)));
        }
    }
    out.push('\n');

    let mut tokens = Vec::with_capacity(game.ply_count() * 3 / 2 + 1);
    let mut number = game.starting_fullmove();
    let mut side = game.starting_side();
    for (i, san) in game.history().iter().enumerate() {
        match side {
            Side::White => tokens.push(format!("{}.", number)),
            Side::Black if i == 0 => tokens.push(format!("{}...", number)),
            Side::Black => {}
        }
        tokens.push(san.clone());
        if side == Side::Black {
            number += 1;
        }
        side = side.opposite();
    }
    tokens.push(result.to_string());

    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    out.push_str(&line);
    out.push('\n');
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
