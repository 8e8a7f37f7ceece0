//! Expression error types

use thiserror::Error;

use crate::machine::UnknownRegister;

/// Tokenizer failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("No token matches at position {position}")]
    NoMatch { position: usize },

    #[error("Token at position {position} is {len} bytes long, the limit is {max}")]
    TokenTooLong {
        position: usize,
        len: usize,
        max: usize,
    },

    #[error("Expression has more than {max} tokens")]
    TooManyTokens { max: usize },
}

impl LexError {
    pub fn position(&self) -> Option<usize> {
        match self {
            LexError::NoMatch { position } | LexError::TokenTooLong { position, .. } => {
                Some(*position)
            }
            LexError::TooManyTokens { .. } => None,
        }
    }

    /// Render the error under the offending input with a caret at the position.
    pub fn render(&self, input: &str) -> String {
        match self.position() {
            Some(position) => format!("{}\n{}\n{:>width$}", self, input, "^", width = position + 1),
            None => self.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Malformed expression")]
    Malformed,

    #[error("Unknown register: '{name}'")]
    UnknownRegister { name: String },

    #[error("Division by zero")]
    DivideByZero,

    #[error("Number out of range: {text}")]
    NumberOutOfRange { text: String },
}

impl From<UnknownRegister> for EvalError {
    fn from(err: UnknownRegister) -> Self {
        EvalError::UnknownRegister { name: err.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_points_at_position() {
        let err = LexError::NoMatch { position: 2 };
        assert_eq!(
            err.render("1+#"),
            "No token matches at position 2\n1+#\n  ^"
        );
    }

    #[test]
    fn test_render_without_position() {
        let err = LexError::TooManyTokens { max: 32 };
        assert_eq!(err.render("1"), "Expression has more than 32 tokens");
    }

    #[test]
    fn test_unknown_register_conversion() {
        let err: EvalError = UnknownRegister::new("pc").into();
        assert_eq!(err, EvalError::UnknownRegister { name: "pc".into() });
        assert_eq!(err.to_string(), "Unknown register: 'pc'");
    }
}
