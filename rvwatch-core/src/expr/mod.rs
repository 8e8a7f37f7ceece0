//! Expression evaluation module
//!
//! Tokenizes and evaluates monitor expressions over machine registers and
//! memory.

pub mod error;
pub mod eval;
pub mod lexer;
pub mod token;

pub use error::{EvalError, LexError};
pub use eval::Evaluator;
pub use lexer::{tokenize, Lexer};
pub use token::{Token, TokenBuffer, TokenKind};
