//! Expression tokenizer
//!
//! Converts an expression string into a [`TokenBuffer`] by trying an
//! ordered list of anchored regular expressions at each position. The
//! first rule that matches wins, so the order of [`RULES`] is significant.

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::LexError;
use super::token::{Token, TokenBuffer, TokenKind, MAX_TOKENS, MAX_TOKEN_LEN};

/// A lexical rule: pattern plus the token it produces (`None` = skip)
struct Rule {
    pattern: &'static str,
    kind: Option<TokenKind>,
}

const RULES: &[Rule] = &[
    Rule { pattern: " +", kind: None },
    Rule { pattern: r"\+", kind: Some(TokenKind::Plus) },
    Rule { pattern: "==", kind: Some(TokenKind::Eq) },
    Rule { pattern: "-", kind: Some(TokenKind::Minus) },
    Rule { pattern: r"\*", kind: Some(TokenKind::Star) },
    Rule { pattern: "/", kind: Some(TokenKind::Slash) },
    Rule { pattern: r"\(", kind: Some(TokenKind::LParen) },
    Rule { pattern: r"\)", kind: Some(TokenKind::RParen) },
    Rule { pattern: "!=", kind: Some(TokenKind::NotEq) },
    Rule { pattern: "&&", kind: Some(TokenKind::And) },
    Rule { pattern: r"\|\|", kind: Some(TokenKind::Or) },
    // Two-digit s-registers come first: alternation here is leftmost-first
    Rule {
        pattern: r"\$(\$0|ra|[sgt]p|t[0-6]|a[0-7]|s(1[01]|[0-9]))",
        kind: Some(TokenKind::Register),
    },
    Rule { pattern: "0[xX][0-9a-fA-F]+", kind: Some(TokenKind::HexNumber) },
    Rule { pattern: "[0-9]+", kind: Some(TokenKind::Number) },
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| {
            Regex::new(&format!("^(?:{})", rule.pattern))
                .unwrap_or_else(|e| panic!("invalid lexical rule {:?}: {}", rule.pattern, e))
        })
        .collect()
});

/// Tokenizer with configurable capacity bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexer {
    max_tokens: usize,
    max_token_len: usize,
}

impl Lexer {
    pub fn new() -> Self {
        Self::with_limits(MAX_TOKENS, MAX_TOKEN_LEN)
    }

    pub fn with_limits(max_tokens: usize, max_token_len: usize) -> Self {
        Self {
            max_tokens,
            max_token_len,
        }
    }

    /// Split `input` into tokens in source order. Whitespace is dropped.
    ///
    /// `-` and `*` are returned as `Minus`/`Star`; see
    /// [`TokenBuffer::mark_unary`] for the prefix-operator pass.
    pub fn tokenize(&self, input: &str) -> Result<TokenBuffer, LexError> {
        let mut tokens = TokenBuffer::with_limits(self.max_tokens, self.max_token_len);
        let mut position = 0;

        while position < input.len() {
            let rest = &input[position..];
            let (index, len) = COMPILED
                .iter()
                .enumerate()
                .find_map(|(i, re)| re.find(rest).map(|m| (i, m.end())).filter(|(_, l)| *l > 0))
                .ok_or(LexError::NoMatch { position })?;

            let text = &rest[..len];
            trace!(
                "match rules[{}] = {:?} at position {} with len {}: {}",
                index,
                RULES[index].pattern,
                position,
                len,
                text
            );

            if let Some(kind) = RULES[index].kind {
                tokens.push(position, Token::new(kind, text))?;
            }
            position += len;
        }

        Ok(tokens)
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize with the default limits
pub fn tokenize(input: &str) -> Result<TokenBuffer, LexError> {
    Lexer::new().tokenize(input)
}
