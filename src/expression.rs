// src/expression.rs
//! Formula Evaluation
//!
//! Payoffs and integrands are plain-text formulas such as
//!
//! ```text
//! exp(-r*T) * max(0, c0*x0 + c1*x1 - K)
//! ```
//!
//! A formula is compiled once against an ordered list of variable names; each
//! name becomes a slot, and evaluation takes the slot values as a slice.
//!
//! # Grammar
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | name | name '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! Functions: `max`, `min` (variadic), `exp`, `ln`, `log10`, `log2`, `sqrt`, `abs`.
//! Constants `pi` and `e` are available unless shadowed by a variable.
//!
//! Nesting (parentheses, signs, exponents, call arguments) is limited to
//! [`MAX_NESTING`] levels. Runs of `+`/`-` or `*`/`/` compile to a flat chain,
//! so long sums do not count towards that limit.

use crate::error::{McError, McResult};
use std::f64::consts::{E, PI};

/// Deepest nesting accepted by the parser
pub const MAX_NESTING: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func {
    Max,
    Min,
    Exp,
    Ln,
    Log10,
    Log2,
    Sqrt,
    Abs,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "max" => Func::Max,
            "min" => Func::Min,
            "exp" => Func::Exp,
            "ln" | "log" => Func::Ln,
            "log10" => Func::Log10,
            "log2" => Func::Log2,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            _ => return None,
        })
    }

    fn is_variadic(self) -> bool {
        matches!(self, Func::Max | Func::Min)
    }

    fn apply(self, args: &[Node], values: &[f64]) -> f64 {
        let mut each = args.iter().map(|a| a.eval(values));
        match self {
            Func::Max => each.fold(f64::NEG_INFINITY, f64::max),
            Func::Min => each.fold(f64::INFINITY, f64::min),
            unary => {
                let x = each.next().unwrap_or(f64::NAN);
                match unary {
                    Func::Exp => x.exp(),
                    Func::Ln => x.ln(),
                    Func::Log10 => x.log10(),
                    Func::Log2 => x.log2(),
                    Func::Sqrt => x.sqrt(),
                    _ => x.abs(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Slot(usize),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    /// Left-to-right fold of same-precedence operators
    Chain(Box<Node>, Vec<(BinOp, Node)>),
    Call(Func, Vec<Node>),
}

impl Node {
    fn chain(first: Node, rest: Vec<(BinOp, Node)>) -> Node {
        if rest.is_empty() {
            first
        } else {
            Node::Chain(Box::new(first), rest)
        }
    }

    fn eval(&self, values: &[f64]) -> f64 {
        match self {
            Node::Number(v) => *v,
            Node::Slot(i) => values[*i],
            Node::Neg(inner) => -inner.eval(values),
            Node::Binary(op, lhs, rhs) => op.apply(lhs.eval(values), rhs.eval(values)),
            Node::Chain(first, rest) => rest
                .iter()
                .fold(first.eval(values), |acc, (op, node)| op.apply(acc, node.eval(values))),
            Node::Call(func, args) => func.apply(args, values),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn tokenize(formula: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent part: e / E, optional sign, digits
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("malformed number '{}'", text))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}' at {}", other, i)),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    variables: &'a [&'a str],
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, wanted: Token) -> Result<(), String> {
        match self.next() {
            Some(ref t) if *t == wanted => Ok(()),
            Some(t) => Err(format!("expected {:?}, found {:?}", wanted, t)),
            None => Err(format!("expected {:?}, found end of formula", wanted)),
        }
    }

    fn expr(&mut self) -> Result<Node, String> {
        let first = self.term()?;
        let mut rest = Vec::new();
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let op = if op == '+' { BinOp::Add } else { BinOp::Sub };
            rest.push((op, self.term()?));
        }
        Ok(Node::chain(first, rest))
    }

    fn term(&mut self) -> Result<Node, String> {
        let first = self.unary()?;
        let mut rest = Vec::new();
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let op = if op == '*' { BinOp::Mul } else { BinOp::Div };
            rest.push((op, self.unary()?));
        }
        Ok(Node::chain(first, rest))
    }

    // every nested construct passes through here
    fn unary(&mut self) -> Result<Node, String> {
        if self.depth >= MAX_NESTING {
            return Err(format!("formula nests deeper than {} levels", MAX_NESTING));
        }
        self.depth += 1;
        let node = self.signed();
        self.depth -= 1;
        node
    }

    fn signed(&mut self) -> Result<Node, String> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Node, String> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Node::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, String> {
        match self.next() {
            Some(Token::Number(v)) => Ok(Node::Number(v)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    return self.call(&name);
                }
                if let Some(slot) = self.variables.iter().position(|v| *v == name) {
                    return Ok(Node::Slot(slot));
                }
                match name.as_str() {
                    "pi" => Ok(Node::Number(PI)),
                    "e" => Ok(Node::Number(E)),
                    _ => Err(format!("unknown variable '{}'", name)),
                }
            }
            Some(t) => Err(format!("unexpected token {:?}", t)),
            None => Err("unexpected end of formula".to_string()),
        }
    }

    fn call(&mut self, name: &str) -> Result<Node, String> {
        let func = Func::lookup(name).ok_or_else(|| format!("unknown function '{}'", name))?;
        let mut args = vec![self.expr()?];
        while let Some(Token::Comma) = self.peek() {
            self.pos += 1;
            args.push(self.expr()?);
        }
        self.expect(Token::RParen)?;

        if !func.is_variadic() && args.len() != 1 {
            return Err(format!("'{}' takes 1 argument, got {}", name, args.len()));
        }
        Ok(Node::Call(func, args))
    }
}

/// A formula compiled against a fixed list of variable names
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    formula: String,
    variables: Vec<String>,
    root: Node,
}

impl Expression {
    pub fn compile(formula: &str, variables: &[&str]) -> McResult<Self> {
        let fail = |reason: String| McError::Evaluation {
            formula: formula.to_string(),
            reason,
        };

        let tokens = tokenize(formula).map_err(fail)?;
        if tokens.is_empty() {
            return Err(fail("empty formula".to_string()));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            variables,
        };
        let root = parser.expr().map_err(fail)?;
        if let Some(extra) = parser.peek() {
            return Err(fail(format!("unexpected trailing token {:?}", extra)));
        }

        Ok(Self {
            formula: formula.to_string(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            root,
        })
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluate with `values[i]` bound to the i-th compiled variable
    pub fn evaluate(&self, values: &[f64]) -> McResult<f64> {
        if values.len() != self.variables.len() {
            return Err(McError::Evaluation {
                formula: self.formula.clone(),
                reason: format!(
                    "expected {} variable values, got {}",
                    self.variables.len(),
                    values.len()
                ),
            });
        }
        Ok(self.root.eval(values))
    }
}

/// One-shot evaluation of `formula` under name/value bindings
pub fn evaluate(formula: &str, bindings: &[(&str, f64)]) -> McResult<f64> {
    let names: Vec<&str> = bindings.iter().map(|(name, _)| *name).collect();
    let values: Vec<f64> = bindings.iter().map(|(_, value)| *value).collect();
    Expression::compile(formula, &names)?.evaluate(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(evaluate("1 + 2 * 3", &[]).unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3", &[]).unwrap(), 9.0);
        assert_eq!(evaluate("8 / 4 / 2", &[]).unwrap(), 1.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2", &[]).unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2", &[]).unwrap(), -4.0);
        assert_eq!(evaluate("2 * -3", &[]).unwrap(), -6.0);
    }

    #[test]
    fn test_numbers() {
        assert_relative_eq!(evaluate("1.5e-3 * 2", &[]).unwrap(), 3e-3, epsilon = 1e-18);
        assert_eq!(evaluate(".5 + 2E2", &[]).unwrap(), 200.5);
    }

    #[test]
    fn test_variables_and_functions() {
        let value = evaluate(
            "exp(-r*T) * max(0, c0*x0 + c1*x1 - K)",
            &[("r", 0.0), ("T", 1.0), ("c0", 50.0), ("x0", 1.2), ("c1", 50.0), ("x1", 1.0), ("K", 100.0)],
        )
        .unwrap();
        assert_relative_eq!(value, 10.0, epsilon = 1e-12);

        assert_eq!(evaluate("min(3, x, 7)", &[("x", -1.0)]).unwrap(), -1.0);
        assert_eq!(evaluate("sqrt(abs(-16))", &[]).unwrap(), 4.0);
        assert_relative_eq!(evaluate("ln(e) + log10(100) + log2(8)", &[]).unwrap(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(evaluate("pi", &[]).unwrap(), PI, epsilon = 0.0);
        // variables shadow constants
        assert_eq!(evaluate("e * 2", &[("e", 3.0)]).unwrap(), 6.0);
    }

    #[test]
    fn test_compiled_expression_reuse() {
        let expr = Expression::compile("x0^2 + x1^2", &["x0", "x1"]).unwrap();
        assert_eq!(expr.evaluate(&[3.0, 4.0]).unwrap(), 25.0);
        assert_eq!(expr.evaluate(&[1.0, 0.0]).unwrap(), 1.0);
        assert!(expr.evaluate(&[1.0]).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| format!("{}x{}", "(".repeat(levels), ")".repeat(levels));
        assert_eq!(evaluate(&nested(90), &[("x", 2.5)]).unwrap(), 2.5);

        // fails cleanly instead of exhausting the stack
        let deep = [
            nested(300_000),
            format!("{}1", "-".repeat(300_000)),
            "2^".repeat(10_000) + "1",
        ];
        for formula in deep {
            match evaluate(&formula, &[("x", 1.0)]) {
                Err(McError::Evaluation { reason, .. }) => assert!(reason.contains("nests deeper")),
                other => panic!("expected a nesting error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_long_sums_are_not_nesting() {
        let names: Vec<String> = (0..5_000).map(|i| format!("x{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let expr = Expression::compile(&names.join(" + "), &refs).unwrap();
        assert_eq!(expr.evaluate(&vec![1.0; 5_000]).unwrap(), 5_000.0);

        assert_eq!(evaluate("10 - 1 - 2 - 3", &[]).unwrap(), 4.0);
        assert_eq!(evaluate(&vec!["2"; 20].join(" * "), &[]).unwrap(), 1_048_576.0);
    }

    #[test]
    fn test_malformed_formulas() {
        for formula in ["", "1 +", "max(1, 2", "foo(1)", "y + 1", "2 $ 3", "(1))", "exp(1, 2)"] {
            assert!(
                matches!(evaluate(formula, &[]), Err(McError::Evaluation { .. })),
                "'{}' should fail",
                formula
            );
        }
    }
}
