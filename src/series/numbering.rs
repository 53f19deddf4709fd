//! Shot-id patterns
//!
//! Placeholders: `{number}`, `{number:Nd}` (space padded), `{number:0Nd}`
//! (zero padded), `{episode}` and `{sequence}`.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BifrostError, Result};
use crate::util::constants::{DEFAULT_SHOT_PATTERN, SERIES_FILE};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)(?::(0?)([0-9]*)d)?\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Number { width: usize, zero: bool },
    Episode,
    Sequence,
}

/// Compiled `numbering.shot_pattern`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotNumbering {
    pattern: String,
    pieces: Vec<Piece>,
}

impl ShotNumbering {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |details: String| BifrostError::ConfigLoad {
            document: SERIES_FILE.to_string(),
            reason: format!("numbering.shot_pattern '{}': {}", pattern, details),
        };

        let mut pieces = Vec::new();
        let mut last = 0;
        let mut has_number = false;
        for cap in PLACEHOLDER_RE.captures_iter(pattern) {
            let Some(m) = cap.get(0) else { continue };
            push_literal(&mut pieces, &pattern[last..m.start()]).map_err(&invalid)?;
            let spec = cap.get(3).map_or("", |w| w.as_str());
            let piece = match &cap[1] {
                "number" => {
                    has_number = true;
                    Piece::Number {
                        width: spec.parse().unwrap_or(0),
                        zero: cap.get(2).is_some_and(|z| !z.as_str().is_empty()),
                    }
                }
                "episode" if spec.is_empty() => Piece::Episode,
                "sequence" if spec.is_empty() => Piece::Sequence,
                other => return Err(invalid(format!("unsupported placeholder '{}'", other))),
            };
            pieces.push(piece);
            last = m.end();
        }
        push_literal(&mut pieces, &pattern[last..]).map_err(&invalid)?;

        if !has_number {
            return Err(invalid("no {number} placeholder".to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
            pieces,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Shot id for `number` within an episode and sequence
    pub fn format(&self, episode: &str, sequence: &str, number: u32) -> String {
        let mut out = String::with_capacity(self.pattern.len() + 8);
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Number { width, zero: true } => {
                    let _ = write!(out, "{:0width$}", number, width = width);
                }
                Piece::Number { width, zero: false } => {
                    let _ = write!(out, "{:width$}", number, width = width);
                }
                Piece::Episode => out.push_str(episode),
                Piece::Sequence => out.push_str(sequence),
            }
        }
        out
    }
}

impl Default for ShotNumbering {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_SHOT_PATTERN.to_string(),
            pieces: vec![
                Piece::Literal("SH".to_string()),
                Piece::Number { width: 4, zero: true },
            ],
        }
    }
}

fn push_literal(pieces: &mut Vec<Piece>, text: &str) -> std::result::Result<(), String> {
    if let Some(pos) = text.find(['{', '}']) {
        return Err(format!("stray '{}'", &text[pos..pos + 1]));
    }
    if !text.is_empty() {
        pieces.push(Piece::Literal(text.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_parsed_default() {
        let parsed = ShotNumbering::parse(DEFAULT_SHOT_PATTERN).unwrap();
        assert_eq!(parsed, ShotNumbering::default());
        assert_eq!(parsed.format("ep01", "seq001", 10), "SH0010");
    }

    #[test]
    fn padding_and_context_placeholders() {
        let n = ShotNumbering::parse("{episode}_{sequence}_sh{number:03d}").unwrap();
        assert_eq!(n.format("ep02", "sq05", 7), "ep02_sq05_sh007");

        let spaced = ShotNumbering::parse("S{number:4d}").unwrap();
        assert_eq!(spaced.format("", "", 12), "S  12");

        let bare = ShotNumbering::parse("shot{number}").unwrap();
        assert_eq!(bare.format("", "", 12345), "shot12345");
    }

    #[test]
    fn wider_numbers_are_not_truncated() {
        let n = ShotNumbering::default();
        assert_eq!(n.format("ep01", "seq001", 123456), "SH123456");
    }

    #[test]
    fn invalid_patterns() {
        for pattern in ["SH{num:04d}", "SH{number", "SH}{number}", "SH0010", "{episode:02d}{number}"] {
            let err = ShotNumbering::parse(pattern).unwrap_err();
            assert_eq!(err.code(), "BIF-001", "{}", pattern);
        }
    }
}
