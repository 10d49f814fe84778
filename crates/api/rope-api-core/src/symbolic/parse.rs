//! Recursive-descent parser for learner-typed expressions.

use std::collections::BTreeSet;

use super::expr::{Constant, Expr, Function};
use crate::config::Transformation;
use crate::rational;

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lamda", "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon",
    "phi", "chi", "psi", "omega",
];

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(Expr),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleStar,
    Caret,
    Bang,
    LParen,
    RParen,
    Comma,
}

fn scan_digits(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    i
}

fn number(chars: &[char], start: usize, tf: &[Transformation]) -> Result<(Token, usize), String> {
    let mut i = scan_digits(chars, start);
    let int_part: String = chars[start..i].iter().collect();
    let mut frac_part = None;
    let mut repeat = None;
    if chars.get(i) == Some(&'.') {
        let frac_start = i + 1;
        i = scan_digits(chars, frac_start);
        frac_part = Some(chars[frac_start..i].iter().collect::<String>());
        if tf.contains(&Transformation::RepeatedDecimals) && chars.get(i) == Some(&'[') {
            let rep_start = i + 1;
            let rep_end = scan_digits(chars, rep_start);
            if chars.get(rep_end) != Some(&']') || rep_end == rep_start {
                return Err("invalid repeated decimal".to_string());
            }
            repeat = Some(chars[rep_start..rep_end].iter().collect::<String>());
            i = rep_end + 1;
        }
    }
    let mut exponent = None;
    if matches!(chars.get(i), Some('e') | Some('E')) && repeat.is_none() {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            let end = scan_digits(chars, j);
            exponent = Some(chars[i + 1..end].iter().collect::<String>());
            i = end;
        }
    }
    let literal: String = chars[start..i].iter().collect();

    if let Some(rep) = repeat {
        let frac = frac_part.unwrap_or_default();
        let q = rational::repeating_decimal(&int_part, &frac, &rep)
            .ok_or_else(|| format!("number '{literal}' is too large"))?;
        return Ok((Token::Num(Expr::Number(q)), i));
    }
    if frac_part.is_none() && exponent.is_none() {
        let n = literal
            .parse::<i64>()
            .map_err(|_| format!("number '{literal}' is too large"))?;
        return Ok((Token::Num(Expr::int(n)), i));
    }
    let exact = tf.contains(&Transformation::AutoNumber) && tf.contains(&Transformation::Rationalize);
    if exact {
        if let Some(q) = rational::parse_decimal(&literal) {
            return Ok((Token::Num(Expr::Number(q)), i));
        }
    }
    let x = literal
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{literal}'"))?;
    Ok((Token::Num(Expr::Float(x)), i))
}

fn tokenize(text: &str, tf: &[Transformation]) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let (token, next) = number(&chars, i, tf)?;
            tokens.push(token);
            i = next;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::DoubleStar
            }
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '!' => Token::Bang,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            other => return Err(format!("invalid character '{other}'")),
        };
        tokens.push(token);
        i += 1;
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    tf: &'a [Transformation],
    known: &'a BTreeSet<String>,
}

impl Parser<'_> {
    fn has(&self, t: Transformation) -> bool {
        self.tf.contains(&t)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn starts_atom(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Num(_)) | Some(Token::Ident(_)) | Some(Token::LParen)
        )
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut terms = vec![self.term()?];
        loop {
            if self.eat(&Token::Plus) {
                terms.push(self.term()?);
            } else if self.eat(&Token::Minus) {
                terms.push(Expr::neg(self.term()?));
            } else {
                break;
            }
        }
        Ok(Expr::add(terms))
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut acc = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                let rhs = self.unary()?;
                acc = Expr::mul(vec![acc, rhs]);
            } else if self.eat(&Token::Slash) {
                let rhs = self.unary()?;
                acc = Expr::div(acc, rhs);
            } else if self.has(Transformation::ImplicitMultiplication) && self.starts_atom() {
                let rhs = self.power()?;
                acc = Expr::mul(vec![acc, rhs]);
            } else {
                break;
            }
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::neg(self.unary()?));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn eat_power(&mut self) -> Result<bool, String> {
        match self.peek() {
            Some(Token::DoubleStar) => {
                self.pos += 1;
                Ok(true)
            }
            Some(Token::Caret) if self.has(Transformation::ConvertXor) => {
                self.pos += 1;
                Ok(true)
            }
            Some(Token::Caret) => Err("unsupported operator '^'".to_string()),
            _ => Ok(false),
        }
    }

    fn power(&mut self) -> Result<Expr, String> {
        let base = self.postfix()?;
        if self.eat_power()? {
            let exponent = self.unary()?;
            return Ok(Expr::pow(base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.atom()?;
        while self.peek() == Some(&Token::Bang) {
            if !self.has(Transformation::FactorialNotation) {
                return Err("invalid syntax '!'".to_string());
            }
            self.pos += 1;
            expr = Expr::call(Function::Factorial, expr);
        }
        Ok(expr)
    }

    fn atom(&mut self) -> Result<Expr, String> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| "unexpected end of input".to_string())?;
        self.pos += 1;
        match token {
            Token::Num(expr) => Ok(expr),
            Token::LParen => {
                let inner = self.expr()?;
                if !self.eat(&Token::RParen) {
                    return Err("missing ')'".to_string());
                }
                Ok(inner)
            }
            Token::Ident(name) => self.identifier(&name),
            _ => Err("invalid syntax".to_string()),
        }
    }

    fn identifier(&mut self, name: &str) -> Result<Expr, String> {
        if self.known.contains(name) {
            return Ok(Expr::symbol(name));
        }
        if let Some(function) = Function::lookup(name) {
            return self.application(function, name);
        }
        match name {
            "pi" => return Ok(Expr::Constant(Constant::Pi)),
            "E" => return Ok(Expr::Constant(Constant::E)),
            "I" => return Ok(Expr::Constant(Constant::I)),
            _ => {}
        }
        let splittable = name.chars().count() > 1
            && name.chars().all(|c| c.is_ascii_alphabetic())
            && !GREEK.contains(&name);
        if self.has(Transformation::SplitSymbols) && splittable {
            let factors = name
                .chars()
                .map(|c| self.symbol(&c.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Expr::mul(factors));
        }
        self.symbol(name)
    }

    fn symbol(&self, name: &str) -> Result<Expr, String> {
        if self.known.contains(name) || self.has(Transformation::AutoSymbol) {
            Ok(Expr::symbol(name))
        } else {
            Err(format!("name '{name}' is not defined"))
        }
    }

    fn application(&mut self, function: Function, name: &str) -> Result<Expr, String> {
        let mut exponent = None;
        if self.has(Transformation::FunctionExponentiation)
            && matches!(self.peek(), Some(Token::DoubleStar) | Some(Token::Caret))
        {
            self.pos += 1;
            exponent = Some(self.postfix()?);
        }
        let arg = if self.eat(&Token::LParen) {
            let arg = self.expr()?;
            if self.eat(&Token::Comma) {
                return Err(format!("{name}() takes exactly one argument"));
            }
            if !self.eat(&Token::RParen) {
                return Err("missing ')'".to_string());
            }
            arg
        } else if self.has(Transformation::ImplicitApplication) && self.starts_atom() {
            self.power()?
        } else {
            return Err(format!("missing argument for '{name}'"));
        };
        let call = Expr::call(function, arg);
        Ok(match exponent {
            Some(e) => Expr::pow(call, e),
            None => call,
        })
    }
}

/// Parse `text` under `transformations`. Names in `known` are always symbols.
pub fn parse_expr(
    text: &str,
    transformations: &[Transformation],
    known: &BTreeSet<String>,
) -> Result<Expr, String> {
    let tokens = tokenize(text, transformations)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        tf: transformations,
        known,
    };
    let expr = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err("invalid syntax".to_string());
    }
    Ok(expr)
}
