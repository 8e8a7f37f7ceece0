//! Token definitions for monitor expressions

use super::error::LexError;

/// Default upper bound on the number of tokens in one expression
pub const MAX_TOKENS: usize = 32;

/// Default upper bound on the byte length of a single token
pub const MAX_TOKEN_LEN: usize = 32;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Arithmetic
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /

    // Grouping
    LParen, // (
    RParen, // )

    // Comparison
    Eq,    // ==
    NotEq, // !=

    // Logical
    And, // &&
    Or,  // ||

    // Unary, produced only by reclassifying Minus / Star
    Negate,      // -
    Dereference, // *

    // Operands
    Number,
    HexNumber,
    Register,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Negate => "neg",
            TokenKind::Dereference => "deref",
            TokenKind::Number => "number",
            TokenKind::HexNumber => "hex number",
            TokenKind::Register => "register",
        }
    }

    /// Whether a token of this kind can close a value expression.
    ///
    /// A `-` or `*` following such a token is binary; anywhere else it is
    /// a prefix operator.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Number | TokenKind::HexNumber | TokenKind::Register | TokenKind::RParen
        )
    }

    /// Binding strength when this kind is considered as a split point.
    ///
    /// Lower binds looser and is evaluated last. `None` for operands and
    /// parentheses.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            TokenKind::Or => Some(1),
            TokenKind::And => Some(2),
            TokenKind::Eq | TokenKind::NotEq => Some(3),
            TokenKind::Plus | TokenKind::Minus => Some(4),
            TokenKind::Star | TokenKind::Slash => Some(5),
            TokenKind::Negate | TokenKind::Dereference => Some(6),
            _ => None,
        }
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, TokenKind::Negate | TokenKind::Dereference)
    }
}

/// A lexed token: its kind plus the exact source text it matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Capacity-checked token sequence produced by one tokenizer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    max_tokens: usize,
    max_token_len: usize,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::with_limits(MAX_TOKENS, MAX_TOKEN_LEN)
    }

    pub fn with_limits(max_tokens: usize, max_token_len: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(max_tokens),
            max_tokens,
            max_token_len,
        }
    }

    /// Append a token that started at byte `position` of the source.
    pub fn push(&mut self, position: usize, token: Token) -> Result<(), LexError> {
        if token.text.len() > self.max_token_len {
            return Err(LexError::TokenTooLong {
                position,
                len: token.text.len(),
                max: self.max_token_len,
            });
        }
        if self.tokens.len() >= self.max_tokens {
            return Err(LexError::TooManyTokens {
                max: self.max_tokens,
            });
        }
        self.tokens.push(token);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }

    /// Turn `-` and `*` into their prefix forms where no operand precedes them.
    ///
    /// Each decision looks only at the left neighbour's kind, and the
    /// reclassified kinds never end an operand, so a single pass is enough
    /// and running it twice changes nothing.
    pub fn mark_unary(&mut self) {
        let mut prev: Option<TokenKind> = None;
        for token in &mut self.tokens {
            let current = token.kind;
            let prefix_position = !prev.is_some_and(|k| k.ends_operand());
            if prefix_position {
                token.kind = match current {
                    TokenKind::Minus => TokenKind::Negate,
                    TokenKind::Star => TokenKind::Dereference,
                    other => other,
                };
            }
            prev = Some(current);
        }
    }
}

impl Default for TokenBuffer {
    fn default() -> Self {
        Self::new()
    }
}
