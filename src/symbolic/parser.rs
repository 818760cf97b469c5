//! Recursive-descent parser for the expression grammar.
//!
//! The grammar covers what the analyzer consumes: numeric literals,
//! variables, `+ - * / ^`, parentheses, and applications of the functions in
//! [`Func`]. `^` is right-associative and binds tighter than unary minus, so
//! `-x^2` parses as `-(x^2)`. Subtraction and division are desugared into
//! multiplication by −1 and powers with exponent −1 at parse time.

use crate::error::{Error, Result};
use crate::symbolic::expr::{Expr, Func};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

/// Parses one scalar expression.
///
/// # Errors
///
/// [`Error::Parse`] on unknown characters, malformed literals, unknown
/// function names, unbalanced parentheses, or trailing input.
///
/// # Examples
///
/// ```
/// use geoctrl_rs::symbolic::parse;
///
/// let e = parse("-x1^2 + 3*sin(x2)").unwrap();
/// assert_eq!(e.diff("x2").simplify().to_string(), "3*cos(x2)");
/// ```
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(Error::Parse(format!(
            "unexpected trailing input in {:?}",
            input
        )));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(at, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
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
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut text = String::new();
                let mut seen_exp = false;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        text.push(c);
                        chars.next();
                    } else if (c == 'e' || c == 'E') && !seen_exp {
                        seen_exp = true;
                        text.push(c);
                        chars.next();
                        if let Some(&(_, sign)) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                text.push(sign);
                                chars.next();
                            }
                        }
                    } else {
                        break;
                    }
                }
                let value: f64 = text.parse().map_err(|_| {
                    Error::Parse(format!("invalid numeric literal {:?} at byte {}", text, at))
                })?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(text));
            }
            other => {
                return Err(Error::Parse(format!(
                    "unexpected character {:?} at byte {}",
                    other, at
                )));
            }
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

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err(Error::Parse("expected closing parenthesis".to_string())),
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr> {
        let mut terms = vec![self.term()?];
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    terms.push(self.term()?);
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    terms.push(Expr::Product(vec![Expr::Num(-1.0), rhs]));
                }
                _ => break,
            }
        }
        Ok(if terms.len() == 1 {
            terms.pop().unwrap_or(Expr::Num(0.0))
        } else {
            Expr::Sum(terms)
        })
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<Expr> {
        let mut factors = vec![self.unary()?];
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    factors.push(self.unary()?);
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    factors.push(Expr::Power(Box::new(rhs), Box::new(Expr::Num(-1.0))));
                }
                _ => break,
            }
        }
        Ok(if factors.len() == 1 {
            factors.pop().unwrap_or(Expr::Num(1.0))
        } else {
            Expr::Product(factors)
        })
    }

    // unary := '-' unary | power
    fn unary(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            let inner = self.unary()?;
            return Ok(Expr::Product(vec![Expr::Num(-1.0), inner]));
        }
        self.power()
    }

    // power := atom ('^' unary)?    (right-associative)
    fn power(&mut self) -> Result<Expr> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.pos += 1;
            let exp = self.unary()?;
            return Ok(Expr::Power(Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    let func = Func::from_name(&name).ok_or_else(|| {
                        Error::Parse(format!("unknown function {:?}", name))
                    })?;
                    self.pos += 1;
                    let arg = self.expression()?;
                    self.expect_rparen()?;
                    Ok(Expr::Call(func, Box::new(arg)))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(other) => Err(Error::Parse(format!("unexpected token {:?}", other))),
            None => Err(Error::Parse("unexpected end of expression".to_string())),
        }
    }
}
