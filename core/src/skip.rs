//! Skip expressions: the validity predicate declared by configuration files.
//!
//! A static combo is skipped when any of its entry's expressions evaluates to
//! a non-zero value. Expressions use C operators over 64-bit signed integers
//! and reference static parameters as `$NAME`:
//!
//! ```text
//! $BUMPMAP && $DETAIL == 2
//! !$FLASHLIGHT && ($SHADOWS || $MODE > 1)
//! ```
//!
//! Division or modulo by zero yields 0.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::model::{ComboParam, decompose};
use crate::validity::ComboValidity;

/// Deepest expression tree accepted. Parsing and evaluation both recurse.
const MAX_DEPTH: usize = 256;

/// Malformed skip expression. `column` is 1-based within the expression text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("column {column}: {message}")]
pub struct SkipError {
    pub column: usize,
    pub message: String,
}

impl SkipError {
    fn new(column: usize, message: impl Into<String>) -> Self {
        Self {
            column,
            message: message.into(),
        }
    }

    fn too_deep(column: usize) -> Self {
        Self::new(column, "expression nested too deeply")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    /// Binding power, C precedence
    fn power(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne => 3,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Param(String),
    LParen,
    RParen,
    Not,
    Minus,
    Op(BinOp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Const(i64),
    /// Slot into the static parameter list
    Param(usize),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, values: &[i64]) -> i64 {
        match self {
            Expr::Const(value) => *value,
            Expr::Param(slot) => values[*slot],
            Expr::Not(inner) => i64::from(inner.eval(values) == 0),
            Expr::Neg(inner) => inner.eval(values).wrapping_neg(),
            Expr::Binary(BinOp::And, lhs, rhs) => {
                i64::from(lhs.eval(values) != 0 && rhs.eval(values) != 0)
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                i64::from(lhs.eval(values) != 0 || rhs.eval(values) != 0)
            }
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(values), rhs.eval(values));
                match op {
                    BinOp::Mul => a.wrapping_mul(b),
                    BinOp::Div if b == 0 => 0,
                    BinOp::Div => a.wrapping_div(b),
                    BinOp::Rem if b == 0 => 0,
                    BinOp::Rem => a.wrapping_rem(b),
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Lt => i64::from(a < b),
                    BinOp::Le => i64::from(a <= b),
                    BinOp::Gt => i64::from(a > b),
                    BinOp::Ge => i64::from(a >= b),
                    BinOp::Eq => i64::from(a == b),
                    BinOp::Ne => i64::from(a != b),
                    BinOp::And | BinOp::Or => unreachable!("short-circuit ops handled above"),
                }
            }
        }
    }
}

/// Split an expression into tokens, each paired with its 1-based column.
fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, SkipError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let column = offset + 1;
        chars.next();

        let token = match c {
            ' ' | '\t' | '\r' | '\n' => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '+' => Token::Op(BinOp::Add),
            '-' => Token::Minus,
            '*' => Token::Op(BinOp::Mul),
            '/' => Token::Op(BinOp::Div),
            '%' => Token::Op(BinOp::Rem),
            '!' | '<' | '>' | '=' => {
                let followed_by_eq = chars.next_if(|&(_, next)| next == '=').is_some();
                match (c, followed_by_eq) {
                    ('!', false) => Token::Not,
                    ('!', true) => Token::Op(BinOp::Ne),
                    ('<', false) => Token::Op(BinOp::Lt),
                    ('<', true) => Token::Op(BinOp::Le),
                    ('>', false) => Token::Op(BinOp::Gt),
                    ('>', true) => Token::Op(BinOp::Ge),
                    ('=', true) => Token::Op(BinOp::Eq),
                    _ => return Err(SkipError::new(column, "expected '==', found '='")),
                }
            }
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(SkipError::new(column, format!("expected '{c}{c}'")));
                }
                if c == '&' {
                    Token::Op(BinOp::And)
                } else {
                    Token::Op(BinOp::Or)
                }
            }
            '$' => {
                let mut name = String::new();
                while let Some((_, next)) =
                    chars.next_if(|&(_, next)| next.is_ascii_alphanumeric() || next == '_')
                {
                    name.push(next);
                }
                if name.is_empty() || name.starts_with(|ch: char| ch.is_ascii_digit()) {
                    return Err(SkipError::new(column, "expected parameter name after '$'"));
                }
                Token::Param(name)
            }
            '0'..='9' => {
                let mut digits = String::from(c);
                while let Some((_, next)) = chars.next_if(|&(_, next)| next.is_ascii_digit()) {
                    digits.push(next);
                }
                let value = digits
                    .parse()
                    .map_err(|_| SkipError::new(column, format!("integer '{digits}' is too large")))?;
                Token::Int(value)
            }
            other => {
                return Err(SkipError::new(column, format!("unexpected character '{other}'")));
            }
        };
        tokens.push((token, column));
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end_column: usize,
    slots: &'a HashMap<&'a str, usize>,
    dynamic_names: &'a HashSet<&'a str>,
    depth: usize,
}

impl Parser<'_> {
    fn column(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end_column, |(_, column)| *column)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        self.pos += 1;
        token
    }

    fn peek_binop(&self) -> Option<BinOp> {
        match self.tokens.get(self.pos) {
            Some((Token::Op(op), _)) => Some(*op),
            // Binary minus shares its token with negation
            Some((Token::Minus, _)) => Some(BinOp::Sub),
            _ => None,
        }
    }

    /// Parse a binary expression. Returns the tree with its height.
    fn parse_expr(&mut self, min_power: u8) -> Result<(Expr, usize), SkipError> {
        let (mut lhs, mut height) = self.parse_unary()?;
        while let Some(op) = self.peek_binop() {
            if op.power() < min_power {
                break;
            }
            let column = self.column();
            self.pos += 1;
            let (rhs, rhs_height) = self.parse_expr(op.power() + 1)?;
            height = height.max(rhs_height) + 1;
            if height > MAX_DEPTH {
                return Err(SkipError::too_deep(column));
            }
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, height))
    }

    fn parse_unary(&mut self) -> Result<(Expr, usize), SkipError> {
        let column = self.column();
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SkipError::too_deep(column));
        }
        let (expr, height) = self.parse_operand(column)?;
        if height > MAX_DEPTH {
            return Err(SkipError::too_deep(column));
        }
        self.depth -= 1;
        Ok((expr, height))
    }

    fn parse_operand(&mut self, column: usize) -> Result<(Expr, usize), SkipError> {
        match self.next() {
            Some(Token::Not) => {
                let (inner, height) = self.parse_unary()?;
                Ok((Expr::Not(Box::new(inner)), height + 1))
            }
            Some(Token::Minus) => {
                let (inner, height) = self.parse_unary()?;
                Ok((Expr::Neg(Box::new(inner)), height + 1))
            }
            Some(Token::Int(value)) => Ok((Expr::Const(value), 1)),
            Some(Token::Param(name)) => match self.slots.get(name.as_str()) {
                Some(&slot) => Ok((Expr::Param(slot), 1)),
                None if self.dynamic_names.contains(name.as_str()) => Err(SkipError::new(
                    column,
                    format!("'${name}' is a dynamic parameter; only static parameters can be skipped"),
                )),
                None => Err(SkipError::new(column, format!("unknown parameter '${name}'"))),
            },
            Some(Token::LParen) => {
                let inner = self.parse_expr(0)?;
                let close_column = self.column();
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(SkipError::new(close_column, "expected ')'")),
                }
            }
            Some(_) => Err(SkipError::new(column, "expected a value")),
            None => Err(SkipError::new(column, "unexpected end of expression")),
        }
    }
}

/// Compiled skip expressions of one entry.
#[derive(Debug, Clone)]
pub struct SkipRules {
    statics: Vec<ComboParam>,
    exprs: Vec<Expr>,
}

impl SkipRules {
    /// Compile `sources` against the entry's parameter lists.
    ///
    /// On failure, returns the index of the failing expression with the error.
    pub fn compile<S: AsRef<str>>(
        sources: &[S],
        statics: &[ComboParam],
        dynamics: &[ComboParam],
    ) -> Result<Self, (usize, SkipError)> {
        let slots: HashMap<&str, usize> = statics
            .iter()
            .enumerate()
            .map(|(slot, param)| (param.name.as_str(), slot))
            .collect();
        let dynamic_names: HashSet<&str> = dynamics.iter().map(|p| p.name.as_str()).collect();

        let exprs = sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                Self::compile_one(source.as_ref(), &slots, &dynamic_names).map_err(|e| (index, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            statics: statics.to_vec(),
            exprs,
        })
    }

    fn compile_one(
        source: &str,
        slots: &HashMap<&str, usize>,
        dynamic_names: &HashSet<&str>,
    ) -> Result<Expr, SkipError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            end_column: source.len() + 1,
            slots,
            dynamic_names,
            depth: 0,
        };
        let (expr, _) = parser.parse_expr(0)?;
        if parser.pos < parser.tokens.len() {
            return Err(SkipError::new(parser.column(), "unexpected trailing input"));
        }
        Ok(expr)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Whether any expression skips the static combo at `static_index`.
    pub fn skips(&self, static_index: u64) -> bool {
        if self.exprs.is_empty() {
            return false;
        }
        let values: SmallVec<[i64; 8]> = decompose(&self.statics, static_index)
            .map(i64::from)
            .collect();
        self.exprs.iter().any(|expr| expr.eval(&values) != 0)
    }
}

impl ComboValidity for SkipRules {
    fn is_valid(&self, static_index: u64) -> bool {
        !self.skips(static_index)
    }
}
