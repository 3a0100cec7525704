//! Compiled boolean predicates over a [`Row`].
//!
//! Predicates arrive as strings (e.g. `"value >= 100 and status != 'archived'"`) and
//! are compiled once into an AST, never evaluated via string `eval`. This is what
//! §9's "Expression compilation" design note calls for: `{evaluate, fields,
//! expression}` backed by an offline compiler.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::row::Row;

/// A compiled predicate: an AST, the set of fields it reads, and the original
/// expression string it was compiled from.
#[derive(Debug, Clone)]
pub struct Predicate {
    ast: Ast,
    fields: BTreeSet<String>,
    expression: String,
}

impl Predicate {
    /// Compile `expression` into a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError`] if `expression` is not a well-formed boolean
    /// expression.
    pub fn compile(expression: &str) -> Result<Self, PredicateError> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(PredicateError::TrailingInput);
        }
        let mut fields = BTreeSet::new();
        ast.collect_fields(&mut fields);
        Ok(Self {
            ast,
            fields,
            expression: expression.to_string(),
        })
    }

    /// A predicate that matches every row (used as the default `match` for an
    /// unfiltered view, and to synthesize `unmatch` when unset — see [`crate::Filter`]).
    #[must_use]
    pub fn always() -> Self {
        Self {
            ast: Ast::Literal(true),
            fields: BTreeSet::new(),
            expression: "true".to_string(),
        }
    }

    /// The fields this predicate reads.
    #[must_use]
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// The original expression this predicate was compiled from.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate the predicate against `row`.
    ///
    /// Per §4.5, a predicate is never allowed to abort a subscriber: callers treat
    /// a `None` (evaluation was structurally impossible, e.g. an unsupported
    /// comparison) as "did not match" and log at error level rather than
    /// propagating.
    #[must_use]
    pub fn evaluate(&self, row: &Row) -> bool {
        self.ast.evaluate(row).unwrap_or_else(|err| {
            tracing::error!(expression = %self.expression, error = %err, "predicate evaluation failed; treating row as non-matching");
            false
        })
    }

    /// Logical negation of this predicate, over the same field set.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            ast: Ast::Not(Box::new(self.ast.clone())),
            fields: self.fields.clone(),
            expression: format!("not ({})", self.expression),
        }
    }
}

#[derive(Debug, Clone)]
enum Ast {
    Literal(bool),
    Comparison {
        field: String,
        op: CompareOp,
        value: Value,
    },
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Not(Box<Ast>),
}

impl Ast {
    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Comparison { field, .. } => {
                out.insert(field.clone());
            }
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_fields(out);
                rhs.collect_fields(out);
            }
            Self::Not(inner) => inner.collect_fields(out),
        }
    }

    fn evaluate(&self, row: &Row) -> Result<bool, EvalError> {
        match self {
            Self::Literal(value) => Ok(*value),
            Self::Comparison { field, op, value } => {
                let actual = row.get(field).unwrap_or(&Value::Null);
                op.apply(actual, value)
            }
            Self::And(lhs, rhs) => Ok(lhs.evaluate(row)? && rhs.evaluate(row)?),
            Self::Or(lhs, rhs) => Ok(lhs.evaluate(row)? || rhs.evaluate(row)?),
            Self::Not(inner) => Ok(!inner.evaluate(row)?),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn apply(self, actual: &Value, expected: &Value) -> Result<bool, EvalError> {
        if self == Self::Eq {
            return Ok(actual == expected);
        }
        if self == Self::Ne {
            return Ok(actual != expected);
        }
        let (a, b) = match (as_f64(actual), as_f64(expected)) {
            (Some(a), Some(b)) => (a, b),
            _ => match (actual.as_str(), expected.as_str()) {
                (Some(a), Some(b)) => {
                    return Ok(match self {
                        Self::Gt => a > b,
                        Self::Gte => a >= b,
                        Self::Lt => a < b,
                        Self::Lte => a <= b,
                        Self::Eq | Self::Ne => unreachable!(),
                    });
                }
                _ => return Err(EvalError::Incomparable),
            },
        };
        Ok(match self {
            Self::Gt => a > b,
            Self::Gte => a >= b,
            Self::Lt => a < b,
            Self::Lte => a <= b,
            Self::Eq | Self::Ne => unreachable!(),
        })
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

#[derive(Debug)]
enum EvalError {
    Incomparable,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomparable => write!(f, "values are not ordered-comparable"),
        }
    }
}

/// Errors raised while compiling a predicate expression.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PredicateError {
    /// The tokenizer encountered a character it doesn't recognize.
    #[error("unexpected character '{0}' in predicate expression")]
    UnexpectedChar(char),
    /// A string literal was never closed.
    #[error("unterminated string literal in predicate expression")]
    UnterminatedString,
    /// The parser reached the end of input while expecting more tokens.
    #[error("unexpected end of predicate expression")]
    UnexpectedEnd,
    /// The parser expected a specific token that wasn't present.
    #[error("expected {0} in predicate expression")]
    Expected(&'static str),
    /// Tokens remained after a complete expression was parsed.
    #[error("trailing input after predicate expression")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Value),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, PredicateError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut j = i + 1;
                let mut value = String::new();
                loop {
                    if j >= chars.len() {
                        return Err(PredicateError::UnterminatedString);
                    }
                    if chars[j] == quote {
                        break;
                    }
                    value.push(chars[j]);
                    j += 1;
                }
                tokens.push(Token::Literal(Value::String(value)));
                i = j + 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(CompareOp::Eq));
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(CompareOp::Ne));
                i += 2;
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(CompareOp::Gte));
                i += 2;
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(CompareOp::Lte));
                i += 2;
            }
            '>' => {
                tokens.push(Token::Op(CompareOp::Gt));
                i += 1;
            }
            '<' => {
                tokens.push(Token::Op(CompareOp::Lt));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| PredicateError::UnexpectedChar(c))?;
                tokens.push(Token::Literal(serde_json::json!(number)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.to_ascii_lowercase().as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    "true" => tokens.push(Token::Literal(Value::Bool(true))),
                    "false" => tokens.push(Token::Literal(Value::Bool(false))),
                    "null" => tokens.push(Token::Literal(Value::Null)),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            other => return Err(PredicateError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Result<Ast, PredicateError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Ast::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Ast, PredicateError> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Ast::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Ast, PredicateError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Ast::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Ast, PredicateError> {
        match self.advance().cloned() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(PredicateError::Expected("')'")),
                }
            }
            Some(Token::Literal(Value::Bool(b))) => Ok(Ast::Literal(b)),
            Some(Token::Ident(field)) => {
                let op = match self.advance() {
                    Some(Token::Op(op)) => *op,
                    _ => return Err(PredicateError::Expected("a comparison operator")),
                };
                let value = match self.advance() {
                    Some(Token::Literal(value)) => value.clone(),
                    Some(Token::Ident(word)) => Value::String(word.clone()),
                    _ => return Err(PredicateError::Expected("a comparison value")),
                };
                Ok(Ast::Comparison { field, op, value })
            }
            Some(_) => Err(PredicateError::Expected("a field, '(' or 'not'")),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: i64) -> Row {
        [("value".into(), json!(value))].into()
    }

    #[test]
    fn compiles_and_evaluates_simple_comparison() {
        let predicate = Predicate::compile("value >= 100").unwrap();
        assert!(predicate.evaluate(&row(100)));
        assert!(!predicate.evaluate(&row(99)));
        assert_eq!(predicate.fields(), &["value".to_string()].into());
    }

    #[test]
    fn compiles_and_or_not_with_parens() {
        let predicate = Predicate::compile("not (value < 10 or value > 20)").unwrap();
        assert!(predicate.evaluate(&row(15)));
        assert!(!predicate.evaluate(&row(5)));
        assert!(!predicate.evaluate(&row(25)));
    }

    #[test]
    fn compiles_string_equality() {
        let predicate = Predicate::compile("status == 'active'").unwrap();
        let row: Row = [("status".into(), json!("active"))].into();
        assert!(predicate.evaluate(&row));
    }

    #[test]
    fn missing_field_does_not_equal_anything() {
        let predicate = Predicate::compile("status == 'active'").unwrap();
        let row: Row = [("other".into(), json!(1))].into();
        assert!(!predicate.evaluate(&row));
    }

    #[test]
    fn negate_flips_result_and_keeps_fields() {
        let predicate = Predicate::compile("value >= 100").unwrap();
        let negated = predicate.negate();
        assert_eq!(negated.fields(), predicate.fields());
        assert!(!negated.evaluate(&row(100)));
        assert!(negated.evaluate(&row(50)));
    }

    #[test]
    fn always_matches_every_row() {
        let predicate = Predicate::always();
        assert!(predicate.evaluate(&row(0)));
        assert!(predicate.fields().is_empty());
    }

    #[test]
    fn rejects_trailing_input() {
        assert!(matches!(
            Predicate::compile("value >= 100 100"),
            Err(PredicateError::TrailingInput)
        ));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(
            Predicate::compile("status == 'active"),
            Err(PredicateError::UnterminatedString)
        ));
    }
}
