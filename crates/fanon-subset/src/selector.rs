//! Row predicates built from a flat token list.
//!
//! A selector is assembled with a fluent builder (`field`, comparisons,
//! `and`/`or`, `begin_group`/`end_group`) and compiled into an expression
//! tree the first time it is evaluated. Binary operators have no
//! precedence and associate to the right: `a and b or c` is
//! `a and (b or c)`. Groups override that.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use fanon_error::{AnonError, Result};
use fanon_handle::DataHandle;
use fanon_types::{DataType, TypedValue};

/// Comparison operator of a unary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl CompareOp {
    const fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Equals => matches!(ord, Ordering::Equal),
            Self::Less => matches!(ord, Ordering::Less),
            Self::LessOrEqual => !matches!(ord, Ordering::Greater),
            Self::Greater => matches!(ord, Ordering::Greater),
            Self::GreaterOrEqual => !matches!(ord, Ordering::Less),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equals => "==",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        })
    }
}

/// Right-hand operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorValue {
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl From<f64> for SelectorValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for SelectorValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for SelectorValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SelectorValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for SelectorValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

#[derive(Debug, Clone)]
enum Token {
    Unary {
        field: Option<String>,
        op: CompareOp,
        value: SelectorValue,
    },
    And,
    Or,
    BeginGroup,
    EndGroup,
}

#[derive(Debug, Clone)]
enum Expr {
    Compare {
        column: usize,
        op: CompareOp,
        value: TypedValue,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval<H: DataHandle + ?Sized>(&self, handle: &H, row: usize) -> Result<bool> {
        match self {
            Self::Compare { column, op, value } => {
                let cell = handle.typed_value(row, *column)?;
                if cell.is_null() || cell.is_any() {
                    return Ok(false);
                }
                Ok(op.accepts(cell.cmp(value)))
            }
            Self::And(left, right) => Ok(left.eval(handle, row)? && right.eval(handle, row)?),
            Self::Or(left, right) => Ok(left.eval(handle, row)? || right.eval(handle, row)?),
        }
    }
}

/// Predicate over the rows of one handle.
#[derive(Debug)]
pub struct DataSelector<'a, H: ?Sized> {
    handle: &'a H,
    field: Option<String>,
    tokens: Vec<Token>,
    compiled: Option<Expr>,
}

impl<'a, H: DataHandle + ?Sized> DataSelector<'a, H> {
    pub fn new(handle: &'a H) -> Self {
        Self {
            handle,
            field: None,
            tokens: Vec::new(),
            compiled: None,
        }
    }

    pub const fn handle(&self) -> &'a H {
        self.handle
    }

    /// Attribute compared by the following terms.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.field = Some(name.into());
        self
    }

    #[must_use]
    pub fn equals(self, value: impl Into<SelectorValue>) -> Self {
        self.unary(CompareOp::Equals, value.into())
    }

    #[must_use]
    pub fn less(self, value: impl Into<SelectorValue>) -> Self {
        self.unary(CompareOp::Less, value.into())
    }

    #[must_use]
    pub fn leq(self, value: impl Into<SelectorValue>) -> Self {
        self.unary(CompareOp::LessOrEqual, value.into())
    }

    #[must_use]
    pub fn greater(self, value: impl Into<SelectorValue>) -> Self {
        self.unary(CompareOp::Greater, value.into())
    }

    #[must_use]
    pub fn geq(self, value: impl Into<SelectorValue>) -> Self {
        self.unary(CompareOp::GreaterOrEqual, value.into())
    }

    #[must_use]
    pub fn and(self) -> Self {
        self.push(Token::And)
    }

    #[must_use]
    pub fn or(self) -> Self {
        self.push(Token::Or)
    }

    #[must_use]
    pub fn begin_group(self) -> Self {
        self.push(Token::BeginGroup)
    }

    #[must_use]
    pub fn end_group(self) -> Self {
        self.push(Token::EndGroup)
    }

    fn unary(self, op: CompareOp, value: SelectorValue) -> Self {
        let field = self.field.clone();
        self.push(Token::Unary { field, op, value })
    }

    fn push(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self.compiled = None;
        self
    }

    /// Compile the token list. Idempotent until the selector changes.
    pub fn compile(&mut self) -> Result<()> {
        if self.compiled.is_none() {
            self.compiled = Some(self.parse(&self.tokens, 0)?);
        }
        Ok(())
    }

    /// Whether `row` satisfies the predicate. Compiles on first use.
    pub fn selected(&mut self, row: usize) -> Result<bool> {
        self.compile()?;
        match &self.compiled {
            Some(expr) => expr.eval(self.handle, row),
            None => Err(AnonError::internal("selector not compiled")),
        }
    }

    /// `EXPR`, `(EXPR)` or `EXPR op EXPR`; `offset` is the position of
    /// `tokens[0]` in the full list.
    fn parse(&self, tokens: &[Token], offset: usize) -> Result<Expr> {
        if tokens.is_empty() {
            return Err(AnonError::parse(offset, "empty expression"));
        }
        let first = leading_expression_len(tokens, offset)?;
        if first == tokens.len() {
            return match &tokens[0] {
                Token::Unary { field, op, value } => {
                    self.compare(field.as_deref(), *op, value, offset)
                }
                _ => self.parse(&tokens[1..first - 1], offset + 1),
            };
        }

        let combine: fn(Box<Expr>, Box<Expr>) -> Expr = match tokens[first] {
            Token::And => Expr::And,
            Token::Or => Expr::Or,
            _ => {
                return Err(AnonError::parse(
                    offset + first,
                    "expected 'and' or 'or' between expressions",
                ));
            }
        };
        let left = self.parse(&tokens[..first], offset)?;
        let right = self.parse(&tokens[first + 1..], offset + first + 1)?;
        Ok(combine(Box::new(left), Box::new(right)))
    }

    fn compare(
        &self,
        field: Option<&str>,
        op: CompareOp,
        value: &SelectorValue,
        position: usize,
    ) -> Result<Expr> {
        let field =
            field.ok_or_else(|| AnonError::parse(position, format!("'{op}' without a field")))?;
        let column = self.handle.column_index_of(field)?;
        let data_type = self.handle.data_type(column)?;
        let value = match (value, data_type) {
            (SelectorValue::Number(n), DataType::Integer | DataType::Decimal) => {
                TypedValue::Decimal(*n)
            }
            (SelectorValue::Date(d), DataType::Date { .. }) => TypedValue::Date(*d),
            (SelectorValue::Text(s), _) => self.handle.parse(column, s)?,
            (other, _) => {
                return Err(AnonError::type_mismatch(
                    format!("{other:?}"),
                    data_type.to_string(),
                ));
            }
        };
        Ok(Expr::Compare { column, op, value })
    }
}

/// Length of the unary term or bracket-matched group starting the list.
fn leading_expression_len(tokens: &[Token], offset: usize) -> Result<usize> {
    match tokens[0] {
        Token::Unary { .. } => Ok(1),
        Token::BeginGroup => {
            let mut depth = 0usize;
            for (i, token) in tokens.iter().enumerate() {
                match token {
                    Token::BeginGroup => depth += 1,
                    Token::EndGroup => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(i + 1);
                        }
                    }
                    _ => {}
                }
            }
            Err(AnonError::parse(offset, "unmatched '('"))
        }
        Token::EndGroup => Err(AnonError::parse(offset, "unmatched ')'")),
        Token::And | Token::Or => Err(AnonError::parse(
            offset,
            "expression starts with a binary operator",
        )),
    }
}
