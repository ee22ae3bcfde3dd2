//! Expression evaluation over named integer variables.
//!
//! Conditions and variable changes in a quest document are small text
//! expressions like `<gold> >= 10` or `<hp> - 1`. Evaluation is a pure
//! two-step pipeline:
//!
//! 1. **Substitution** -- every `<name>` placeholder is replaced by the
//!    decimal form of the variable's value.
//! 2. **Restricted grammar** -- the substituted text is parsed and evaluated
//!    by a hand-written precedence-climbing parser that accepts only integer
//!    and boolean literals, arithmetic, comparisons, and logical operators.
//!    There are no identifiers, calls, or member access, so a quest document
//!    can never execute anything beyond integer math.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and ( ("or" | "||") and )*
//! and     := not ( ("and" | "&&") not )*
//! not     := ("not" | "!") not | cmp
//! cmp     := add ( ("==" | "!=" | "<" | "<=" | ">" | ">=") add )?
//! add     := mul ( ("+" | "-") mul )*
//! mul     := neg ( ("*" | "/" | "%") neg )*
//! neg     := "-" neg | primary
//! primary := INT | "true" | "false" | "(" or ")"
//! ```
//!
//! Arithmetic is checked 64-bit signed integer math; overflow and division
//! by zero are evaluation errors, never panics or silent wrapping.

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Errors and values
// ---------------------------------------------------------------------------

/// Errors produced by expression evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// The (substituted) expression text does not parse.
    #[error("expression syntax error: {0}")]
    Syntax(String),

    /// The expression parses but cannot be evaluated: division by zero,
    /// integer overflow, or an operator applied to the wrong type.
    #[error("expression cannot be evaluated: {0}")]
    Evaluation(String),
}

/// The result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Boolean coercion used at condition sites: `false` and `0` are false,
    /// everything else is true.
    pub fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
        }
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// How `<name>` placeholders are replaced before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Literal text replacement of each `<name>` token, one variable at a
    /// time. This is the compatible default. It is not parsing-aware: in
    /// `1<x>2` the `<x>` is treated as a placeholder even if the author
    /// meant two comparisons, and an unknown placeholder is left in place
    /// to fail later as a syntax error.
    #[default]
    Literal,

    /// Single-pass placeholder scan that rejects unknown variable names up
    /// front with a syntax error naming the variable. Opt-in.
    Strict,
}

/// Replace every `<name>` occurrence with the variable's decimal value.
///
/// Plain text replacement in variable-name order. Values are integers, so a
/// replacement can never introduce a new placeholder, but the pass does not
/// understand the expression grammar: see [`SubstitutionMode::Literal`] for
/// the known quirk.
pub fn substitute(expression: &str, variables: &BTreeMap<String, i64>) -> String {
    let mut text = expression.to_string();
    for (name, value) in variables {
        text = text.replace(&format!("<{name}>"), &value.to_string());
    }
    text
}

/// Strict substitution: scan for `<ident>` placeholders and replace each
/// from `variables`, erroring on names that are not defined.
///
/// A `<` that is not followed by an identifier and a closing `>` is left
/// alone (it is the less-than operator).
pub fn substitute_strict(
    expression: &str,
    variables: &BTreeMap<String, i64>,
) -> Result<String, ExprError> {
    let mut out = String::with_capacity(expression.len());
    let mut rest = expression;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let ident_len = after
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .count();
        let starts_like_ident = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

        if starts_like_ident && after[ident_len..].starts_with('>') {
            let name = &after[..ident_len];
            match variables.get(name) {
                Some(value) => {
                    out.push_str(&value.to_string());
                    rest = &after[ident_len + 1..];
                }
                None => {
                    return Err(ExprError::Syntax(format!(
                        "unknown variable '{name}' in placeholder"
                    )));
                }
            }
        } else {
            // A bare '<' comparison operator.
            out.push('<');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Int(i64),
    Bool(bool),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_ascii_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let digits = &text[start..end];
                let value: i64 = digits.parse().map_err(|_| {
                    ExprError::Syntax(format!("integer literal out of range: {digits}"))
                })?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &text[start..end];
                match word {
                    "true" => tokens.push(Token::Bool(true)),
                    "false" => tokens.push(Token::Bool(false)),
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    _ => {
                        return Err(ExprError::Syntax(format!("unknown identifier '{word}'")));
                    }
                }
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '=') {
                    chars.next();
                    tokens.push(Token::EqEq);
                } else {
                    return Err(ExprError::Syntax(
                        "'=' is not an operator (did you mean '=='?)".to_string(),
                    ));
                }
            }
            '!' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '=') {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '<' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '&' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '&') {
                    chars.next();
                    tokens.push(Token::And);
                } else {
                    return Err(ExprError::Syntax(
                        "'&' is not an operator (did you mean '&&'?)".to_string(),
                    ));
                }
            }
            '|' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, d)| d == '|') {
                    chars.next();
                    tokens.push(Token::Or);
                } else {
                    return Err(ExprError::Syntax(
                        "'|' is not an operator (did you mean '||'?)".to_string(),
                    ));
                }
            }
            other => {
                return Err(ExprError::Syntax(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug)]
enum Ast {
    Literal(Value),
    Unary(UnaryOp, Box<Ast>),
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Consume the next token if it equals `tok`.
    fn eat(&mut self, tok: Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<Ast, ExprError> {
        if self.tokens.is_empty() {
            return Err(ExprError::Syntax("empty expression".to_string()));
        }
        let ast = self.parse_or()?;
        match self.peek() {
            None => Ok(ast),
            Some(tok) => Err(ExprError::Syntax(format!(
                "unexpected trailing token {tok:?}"
            ))),
        }
    }

    fn parse_or(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.eat(Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Ast::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_not()?;
        while self.eat(Token::And) {
            let rhs = self.parse_not()?;
            lhs = Ast::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Ast, ExprError> {
        if self.eat(Token::Not) {
            let inner = self.parse_not()?;
            Ok(Ast::Unary(UnaryOp::Not, Box::new(inner)))
        } else {
            self.parse_cmp()
        }
    }

    /// Comparisons do not chain: `1 < 2 < 3` is a syntax error (the second
    /// `<` becomes a trailing token).
    fn parse_cmp(&mut self) -> Result<Ast, ExprError> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.parse_add()?;
        Ok(Ast::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_add(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_mul()?;
            lhs = Ast::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_mul(&mut self) -> Result<Ast, ExprError> {
        let mut lhs = self.parse_neg()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_neg()?;
            lhs = Ast::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_neg(&mut self) -> Result<Ast, ExprError> {
        if self.eat(Token::Minus) {
            let inner = self.parse_neg()?;
            Ok(Ast::Unary(UnaryOp::Neg, Box::new(inner)))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Ast, ExprError> {
        match self.bump() {
            Some(Token::Int(i)) => Ok(Ast::Literal(Value::Int(i))),
            Some(Token::Bool(b)) => Ok(Ast::Literal(Value::Bool(b))),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if self.eat(Token::RParen) {
                    Ok(inner)
                } else {
                    Err(ExprError::Syntax("missing closing parenthesis".to_string()))
                }
            }
            Some(tok) => Err(ExprError::Syntax(format!("unexpected token {tok:?}"))),
            None => Err(ExprError::Syntax(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn expect_int(v: Value, op: &str) -> Result<i64, ExprError> {
    match v {
        Value::Int(i) => Ok(i),
        Value::Bool(_) => Err(ExprError::Evaluation(format!(
            "'{op}' requires integer operands, got a boolean"
        ))),
    }
}

fn eval(ast: &Ast) -> Result<Value, ExprError> {
    match ast {
        Ast::Literal(v) => Ok(*v),

        Ast::Unary(UnaryOp::Neg, inner) => {
            let i = expect_int(eval(inner)?, "-")?;
            i.checked_neg()
                .map(Value::Int)
                .ok_or_else(|| ExprError::Evaluation("integer overflow in negation".to_string()))
        }
        Ast::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!eval(inner)?.truthy())),

        // Logical operators short-circuit on truthiness.
        Ast::Binary(BinaryOp::And, lhs, rhs) => {
            if !eval(lhs)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(rhs)?.truthy()))
        }
        Ast::Binary(BinaryOp::Or, lhs, rhs) => {
            if eval(lhs)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(rhs)?.truthy()))
        }

        Ast::Binary(op, lhs, rhs) => {
            let lv = eval(lhs)?;
            let rv = eval(rhs)?;
            match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                    eval_arithmetic(*op, lv, rv)
                }
                BinaryOp::Eq | BinaryOp::Ne => eval_equality(*op, lv, rv),
                BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                    eval_ordering(*op, lv, rv)
                }
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            }
        }
    }
}

fn eval_arithmetic(op: BinaryOp, lv: Value, rv: Value) -> Result<Value, ExprError> {
    let (symbol, l, r) = match op {
        BinaryOp::Add => ("+", expect_int(lv, "+")?, expect_int(rv, "+")?),
        BinaryOp::Sub => ("-", expect_int(lv, "-")?, expect_int(rv, "-")?),
        BinaryOp::Mul => ("*", expect_int(lv, "*")?, expect_int(rv, "*")?),
        BinaryOp::Div => ("/", expect_int(lv, "/")?, expect_int(rv, "/")?),
        BinaryOp::Rem => ("%", expect_int(lv, "%")?, expect_int(rv, "%")?),
        _ => unreachable!("not an arithmetic operator"),
    };

    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && r == 0 {
        return Err(ExprError::Evaluation("division by zero".to_string()));
    }

    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Rem => l.checked_rem(r),
        _ => unreachable!("not an arithmetic operator"),
    };

    result
        .map(Value::Int)
        .ok_or_else(|| ExprError::Evaluation(format!("integer overflow in '{l} {symbol} {r}'")))
}

fn eval_equality(op: BinaryOp, lv: Value, rv: Value) -> Result<Value, ExprError> {
    let equal = match (lv, rv) {
        (Value::Int(l), Value::Int(r)) => l == r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        _ => {
            return Err(ExprError::Evaluation(format!(
                "cannot compare {} with {}",
                lv.type_name(),
                rv.type_name()
            )));
        }
    };
    Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
}

fn eval_ordering(op: BinaryOp, lv: Value, rv: Value) -> Result<Value, ExprError> {
    let (l, r) = match (lv, rv) {
        (Value::Int(l), Value::Int(r)) => (l, r),
        _ => {
            return Err(ExprError::Evaluation(format!(
                "ordering comparison requires integers, got {} and {}",
                lv.type_name(),
                rv.type_name()
            )));
        }
    };
    let result = match op {
        BinaryOp::Lt => l < r,
        BinaryOp::Le => l <= r,
        BinaryOp::Gt => l > r,
        BinaryOp::Ge => l >= r,
        _ => unreachable!("not an ordering operator"),
    };
    Ok(Value::Bool(result))
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Substitute `variables` into `expression` and evaluate it.
///
/// Pure function of its inputs; no side effects.
pub fn evaluate(expression: &str, variables: &BTreeMap<String, i64>) -> Result<Value, ExprError> {
    evaluate_with(expression, variables, SubstitutionMode::Literal)
}

/// Like [`evaluate`], with an explicit [`SubstitutionMode`].
pub fn evaluate_with(
    expression: &str,
    variables: &BTreeMap<String, i64>,
    mode: SubstitutionMode,
) -> Result<Value, ExprError> {
    let text = match mode {
        SubstitutionMode::Literal => substitute(expression, variables),
        SubstitutionMode::Strict => substitute_strict(expression, variables)?,
    };
    let tokens = tokenize(&text)?;
    let ast = Parser::new(tokens).parse()?;
    eval(&ast)
}

/// Evaluate a jump condition: any result is coerced to a boolean
/// (`0` is false, any nonzero integer is true).
pub fn evaluate_condition(
    expression: &str,
    variables: &BTreeMap<String, i64>,
) -> Result<bool, ExprError> {
    Ok(evaluate(expression, variables)?.truthy())
}

/// Evaluate a variable-change expression, which must yield an integer.
pub fn evaluate_value(
    expression: &str,
    variables: &BTreeMap<String, i64>,
) -> Result<i64, ExprError> {
    match evaluate(expression, variables)? {
        Value::Int(i) => Ok(i),
        Value::Bool(_) => Err(ExprError::Evaluation(
            "variable change must yield an integer, got a boolean".to_string(),
        )),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
