//! Token stream abstraction for the brace-delimited text asset formats.
//!
//! The loaders in [`crate::animation`] and [`crate::rig`] consume parsed
//! floats/ints/strings through the [`Tokenizer`] trait rather than touching
//! files directly, keeping the file format plumbing swappable. The bundled
//! [`TextTokenizer`] handles the whitespace-separated grammar used by the
//! `.skel`/`.skin`/`.anim` files, treating `{` and `}` as standalone tokens
//! even when glued to neighbouring text.

use log::warn;

/// Seam between the loaders and the token source.
///
/// All methods are forgiving: numeric getters return `0`/`0.0` on malformed
/// input (logged), and `find_token` reports failure instead of aborting, so
/// a damaged file degrades to a partially-loaded asset rather than a crash.
pub trait Tokenizer {
    /// Returns the next token, or `None` at end of input.
    fn get_token(&mut self) -> Option<String>;

    /// Parses the next token as `f32`. Malformed input yields 0.0.
    fn get_float(&mut self) -> f32;

    /// Parses the next token as `i32`. Malformed input yields 0.
    fn get_int(&mut self) -> i32;

    /// Scans forward until `literal` is consumed. Returns `false` if the
    /// stream ends first.
    fn find_token(&mut self, literal: &str) -> bool;

    /// Discards the remainder of the current line.
    fn skip_line(&mut self);
}

/// In-memory tokenizer over the text asset grammar.
pub struct TextTokenizer {
    tokens: Vec<Token>,
    cursor: usize,
}

struct Token {
    text: String,
    line: usize,
}

impl TextTokenizer {
    /// Tokenizes `source`, splitting on whitespace and isolating braces.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut tokens = Vec::new();
        for (line_no, line) in source.lines().enumerate() {
            // asset files allow trailing # comments
            let line = line.split('#').next().unwrap_or("");
            for raw in line.split_whitespace() {
                split_braces(raw, line_no, &mut tokens);
            }
        }
        Self { tokens, cursor: 0 }
    }

    fn peek_line(&self) -> Option<usize> {
        self.tokens.get(self.cursor).map(|t| t.line)
    }
}

/// Splits a raw word into brace tokens and plain tokens, e.g. `"{foo}"`
/// becomes `{`, `foo`, `}`.
fn split_braces(raw: &str, line: usize, out: &mut Vec<Token>) {
    let mut rest = raw;
    while !rest.is_empty() {
        if let Some(pos) = rest.find(['{', '}']) {
            if pos > 0 {
                out.push(Token {
                    text: rest[..pos].to_string(),
                    line,
                });
            }
            out.push(Token {
                text: rest[pos..=pos].to_string(),
                line,
            });
            rest = &rest[pos + 1..];
        } else {
            out.push(Token {
                text: rest.to_string(),
                line,
            });
            rest = "";
        }
    }
}

impl Tokenizer for TextTokenizer {
    fn get_token(&mut self) -> Option<String> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(token.text.clone())
    }

    fn get_float(&mut self) -> f32 {
        match self.get_token() {
            Some(tok) => tok.parse().unwrap_or_else(|_| {
                warn!("TextTokenizer: expected float, got '{tok}'");
                0.0
            }),
            None => {
                warn!("TextTokenizer: expected float, got end of input");
                0.0
            }
        }
    }

    fn get_int(&mut self) -> i32 {
        match self.get_token() {
            Some(tok) => tok.parse().unwrap_or_else(|_| {
                warn!("TextTokenizer: expected int, got '{tok}'");
                0
            }),
            None => {
                warn!("TextTokenizer: expected int, got end of input");
                0
            }
        }
    }

    fn find_token(&mut self, literal: &str) -> bool {
        while let Some(tok) = self.get_token() {
            if tok == literal {
                return true;
            }
        }
        warn!("TextTokenizer: token '{literal}' not found before end of input");
        false
    }

    fn skip_line(&mut self) {
        let Some(current) = self.peek_line() else {
            return;
        };
        while let Some(line) = self.peek_line() {
            if line != current {
                break;
            }
            self.cursor += 1;
        }
    }
}
