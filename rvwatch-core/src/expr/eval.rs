//! Expression evaluator
//!
//! Evaluates a token sequence by recursive splitting: a range is either a
//! single operand, a fully parenthesized range, or is split at its
//! dominant operator (the loosest-binding one outside any parentheses).
//! All arithmetic is unsigned 32-bit with wraparound.

use std::ops::RangeInclusive;

use super::error::EvalError;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use crate::machine::{Machine, WORD_BYTES};

/// Expression evaluator bound to a machine
pub struct Evaluator<M> {
    machine: M,
    lexer: Lexer,
}

impl<M: Machine> Evaluator<M> {
    pub fn new(machine: M) -> Self {
        Self {
            machine,
            lexer: Lexer::new(),
        }
    }

    pub fn with_lexer(machine: M, lexer: Lexer) -> Self {
        Self { machine, lexer }
    }

    /// Tokenize, mark prefix operators and evaluate `input`.
    pub fn evaluate(&self, input: &str) -> Result<u32, EvalError> {
        let mut tokens = self.lexer.tokenize(input)?;
        tokens.mark_unary();
        self.eval_tokens(tokens.as_slice())
    }

    /// Evaluate the inclusive token range `span`.
    pub fn eval_range(&self, tokens: &[Token], span: RangeInclusive<usize>) -> Result<u32, EvalError> {
        let tokens = tokens.get(span).ok_or(EvalError::Malformed)?;
        self.eval_tokens(tokens)
    }

    /// Evaluate a complete token slice.
    pub fn eval_tokens(&self, tokens: &[Token]) -> Result<u32, EvalError> {
        match tokens {
            [] => Err(EvalError::Malformed),
            [token] => self.eval_operand(token),
            _ if is_wrapped(tokens) => self.eval_tokens(&tokens[1..tokens.len() - 1]),
            _ => {
                let op = dominant_operator(tokens).ok_or(EvalError::Malformed)?;
                let kind = tokens[op].kind;

                if kind.is_unary() {
                    // A prefix operator only dominates when it leads the range
                    if op != 0 {
                        return Err(EvalError::Malformed);
                    }
                    let value = self.eval_tokens(&tokens[1..])?;
                    return Ok(self.apply_unary(kind, value));
                }

                let left = self.eval_tokens(&tokens[..op])?;
                let right = self.eval_tokens(&tokens[op + 1..])?;
                apply_binary(kind, left, right)
            }
        }
    }

    fn eval_operand(&self, token: &Token) -> Result<u32, EvalError> {
        match token.kind {
            TokenKind::Number => token
                .text
                .parse::<u32>()
                .map_err(|_| out_of_range(token)),
            TokenKind::HexNumber => {
                let digits = token.text.get(2..).ok_or(EvalError::Malformed)?;
                u32::from_str_radix(digits, 16).map_err(|_| out_of_range(token))
            }
            TokenKind::Register => {
                let name = token.text.strip_prefix('$').unwrap_or(&token.text);
                Ok(self.machine.read_register(name)?)
            }
            _ => Err(EvalError::Malformed),
        }
    }

    fn apply_unary(&self, kind: TokenKind, value: u32) -> u32 {
        match kind {
            TokenKind::Negate => value.wrapping_neg(),
            TokenKind::Dereference => self.machine.read_memory(value, WORD_BYTES),
            _ => unreachable!("not a prefix operator: {:?}", kind),
        }
    }
}

fn out_of_range(token: &Token) -> EvalError {
    EvalError::NumberOutOfRange {
        text: token.text.clone(),
    }
}

fn apply_binary(kind: TokenKind, left: u32, right: u32) -> Result<u32, EvalError> {
    Ok(match kind {
        TokenKind::Plus => left.wrapping_add(right),
        TokenKind::Minus => left.wrapping_sub(right),
        TokenKind::Star => left.wrapping_mul(right),
        TokenKind::Slash => {
            if right == 0 {
                return Err(EvalError::DivideByZero);
            }
            left / right
        }
        TokenKind::Eq => (left == right) as u32,
        TokenKind::NotEq => (left != right) as u32,
        TokenKind::And => (left != 0 && right != 0) as u32,
        TokenKind::Or => (left != 0 || right != 0) as u32,
        _ => return Err(EvalError::Malformed),
    })
}

/// True if the first and last tokens are a matching pair of parentheses.
fn is_wrapped(tokens: &[Token]) -> bool {
    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        return false;
    };
    if first.kind != TokenKind::LParen || last.kind != TokenKind::RParen || tokens.len() < 2 {
        return false;
    }

    let mut depth = 0i32;
    for token in &tokens[1..tokens.len() - 1] {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

/// Index of the operator to split on, if any appears outside parentheses.
///
/// The loosest-binding class wins. Within a binary class the rightmost
/// occurrence is taken so that chains group to the left; within the prefix
/// class the leftmost is taken so that chains group to the right.
fn dominant_operator(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0i32;
    let mut best: Option<(usize, u8)> = None;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth -= 1,
            kind if depth == 0 => {
                let Some(prec) = kind.precedence() else {
                    continue;
                };
                let replace = match best {
                    None => true,
                    Some((_, best_prec)) if prec < best_prec => true,
                    Some((_, best_prec)) => prec == best_prec && !kind.is_unary(),
                };
                if replace {
                    best = Some((i, prec));
                }
            }
            _ => {}
        }
    }

    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::error::LexError;
    use crate::machine::SimpleMachine;

    fn machine() -> SimpleMachine {
        let mut m = SimpleMachine::new();
        m.set_register("a0", 5).unwrap();
        m.set_register("sp", 0x8000_0000).unwrap();
        m.write_word(100, 7);
        m.write_word(0x8000_0000, 0x1234);
        m.write_word(0x1234, 99);
        m
    }

    fn eval(input: &str) -> Result<u32, EvalError> {
        Evaluator::new(machine()).evaluate(input)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("0"), Ok(0));
        assert_eq!(eval("42"), Ok(42));
        assert_eq!(eval("4294967295"), Ok(u32::MAX));
        assert_eq!(eval("0x1F"), Ok(31));
        assert_eq!(eval("0X1f"), Ok(31));
        assert_eq!(eval("007"), Ok(7));
    }

    #[test]
    fn test_literal_out_of_range() {
        assert_eq!(
            eval("4294967296"),
            Err(EvalError::NumberOutOfRange {
                text: "4294967296".into()
            })
        );
        assert!(matches!(
            eval("0x100000000"),
            Err(EvalError::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(eval("10-2-3"), Ok(5));
        assert_eq!(eval("100/10/2"), Ok(5));
        assert_eq!(eval("8/4*2"), Ok(4));
        assert_eq!(eval("1-1==0"), Ok(1));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2+3*4"), Ok(14));
        assert_eq!(eval("(2+3)*4"), Ok(20));
        assert_eq!(eval("1+1==2 && 3!=4"), Ok(1));
        assert_eq!(eval("0 && 1 || 1"), Ok(1));
        assert_eq!(eval("1 || 0 && 0"), Ok(1));
        assert_eq!(eval("((1))"), Ok(1));
        assert_eq!(eval("(1+2)*(3+4)"), Ok(21));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("-3+5"), Ok(2));
        assert_eq!(eval("3*-2"), Ok((-6i32) as u32));
        assert_eq!(eval("--3"), Ok(3));
        assert_eq!(eval("- -3"), Ok(3));
        assert_eq!(eval("1 - -1"), Ok(2));
        assert_eq!(eval("-(2+3)"), Ok((-5i32) as u32));
        assert_eq!(eval("*100"), Ok(7));
        assert_eq!(eval("*100+1"), Ok(8));
        assert_eq!(eval("2**100"), Ok(14));
        assert_eq!(eval("**$sp"), Ok(99));
        assert_eq!(eval("-*100"), Ok((-7i32) as u32));
    }

    #[test]
    fn test_registers() {
        assert_eq!(eval("$a0"), Ok(5));
        assert_eq!(eval("$a0 * 2 + $$0"), Ok(10));
        assert_eq!(eval("*$sp"), Ok(0x1234));
        assert_eq!(
            eval("$t0 + $pc"),
            Err(EvalError::Lex(LexError::NoMatch { position: 6 }))
        );
    }

    #[test]
    fn test_wraparound() {
        assert_eq!(eval("0-1"), Ok(u32::MAX));
        assert_eq!(eval("0xffffffff+2"), Ok(1));
        assert_eq!(eval("0x10000*0x10000"), Ok(0));
        assert_eq!(eval("-1/2"), Ok(u32::MAX / 2));
    }

    #[test]
    fn test_comparison_and_logic() {
        assert_eq!(eval("3==3"), Ok(1));
        assert_eq!(eval("3!=3"), Ok(0));
        assert_eq!(eval("2 && 3"), Ok(1));
        assert_eq!(eval("0 || 0"), Ok(0));
        assert_eq!(eval("$a0 == 5"), Ok(1));
    }

    #[test]
    fn test_logic_evaluates_both_sides() {
        assert_eq!(eval("0 && 1/0"), Err(EvalError::DivideByZero));
        assert_eq!(eval("1 || 1/0"), Err(EvalError::DivideByZero));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1/0"), Err(EvalError::DivideByZero));
        assert_eq!(eval("1/(2-2)"), Err(EvalError::DivideByZero));
    }

    #[test]
    fn test_malformed() {
        for input in ["", "+", "()", "2+", "*", "(1", "1)", "1 2", "(1)(2)", ")1(", "3-", "1+*"] {
            assert_eq!(eval(input), Err(EvalError::Malformed), "input {:?}", input);
        }
    }

    #[test]
    fn test_left_error_wins() {
        struct NoRegisters;
        impl Machine for NoRegisters {
            fn read_register(&self, name: &str) -> Result<u32, crate::machine::UnknownRegister> {
                Err(crate::machine::UnknownRegister::new(name))
            }
            fn read_memory(&self, _address: u32, _width: u32) -> u32 {
                0
            }
        }

        let eval = Evaluator::new(NoRegisters);
        assert_eq!(
            eval.evaluate("$a1 + 1/0"),
            Err(EvalError::UnknownRegister { name: "a1".into() })
        );
        assert_eq!(eval.evaluate("1/0 + $a1"), Err(EvalError::DivideByZero));
    }

    #[test]
    fn test_eval_range() {
        let m = machine();
        let eval = Evaluator::new(&m);
        let mut tokens = crate::expr::lexer::tokenize("1 + 2 * 3").unwrap();
        tokens.mark_unary();
        assert_eq!(eval.eval_range(tokens.as_slice(), 0..=4), Ok(7));
        assert_eq!(eval.eval_range(tokens.as_slice(), 2..=4), Ok(6));
        assert_eq!(eval.eval_range(tokens.as_slice(), 4..=4), Ok(3));
        assert_eq!(eval.eval_range(tokens.as_slice(), 3..=2), Err(EvalError::Malformed));
        assert_eq!(eval.eval_range(tokens.as_slice(), 0..=9), Err(EvalError::Malformed));
    }

    #[test]
    fn test_short_hex_token() {
        let eval = Evaluator::new(machine());
        let short = [Token::new(TokenKind::HexNumber, "0")];
        assert_eq!(eval.eval_tokens(&short), Err(EvalError::Malformed));
        let split_char = [Token::new(TokenKind::HexNumber, "0é")];
        assert_eq!(eval.eval_tokens(&split_char), Err(EvalError::Malformed));
    }

    #[test]
    fn test_wrapped_detection() {
        let toks = |s: &str| crate::expr::lexer::tokenize(s).unwrap();
        assert!(is_wrapped(toks("(1+2)").as_slice()));
        assert!(is_wrapped(toks("((1)+(2))").as_slice()));
        assert!(!is_wrapped(toks("(1)+(2)").as_slice()));
        assert!(!is_wrapped(toks("(1+2").as_slice()));
    }
}
