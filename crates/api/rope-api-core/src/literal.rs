//! Literal notation for learner input.
//!
//! Accepts numbers (including imaginary `2j` and `1+2j`), quoted strings,
//! `True`/`False`, tuples, lists, sets and dicts. Nothing is evaluated, so
//! arbitrary input is safe to hand to this parser.

use num_complex::Complex64;

use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Int(i64),
    Real(f64),
    Imag(f64),
    Str(String),
    Name(String),
    Punct(char),
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            let mut is_real = false;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                i += 1;
            }
            if chars.get(i) == Some(&'.') {
                is_real = true;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                    i += 1;
                }
            }
            if matches!(chars.get(i), Some('e') | Some('E')) {
                let mut j = i + 1;
                if matches!(chars.get(j), Some('+') | Some('-')) {
                    j += 1;
                }
                if chars.get(j).is_some_and(|d| d.is_ascii_digit()) {
                    is_real = true;
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            if matches!(chars.get(i), Some('j') | Some('J')) {
                i += 1;
                let imag = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{literal}'"))?;
                tokens.push(Token::Imag(imag));
            } else if is_real {
                let real = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{literal}'"))?;
                tokens.push(Token::Real(real));
            } else {
                let int = literal
                    .parse::<i64>()
                    .map_err(|_| format!("integer '{literal}' is too large"))?;
                tokens.push(Token::Int(int));
            }
        } else if c == '\'' || c == '"' {
            let quote = c;
            let mut out = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err("unterminated string".to_string()),
                    Some(&ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = chars
                            .get(i + 1)
                            .ok_or_else(|| "unterminated string".to_string())?;
                        out.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => *other,
                        });
                        i += 2;
                    }
                    Some(&ch) => {
                        out.push(ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Str(out));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Name(chars[start..i].iter().collect()));
        } else if "()[]{},:+-".contains(c) {
            tokens.push(Token::Punct(c));
            i += 1;
        } else {
            return Err(format!("invalid character '{c}'"));
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

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: char) -> Result<(), String> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(format!("expected '{punct}'"))
        }
    }

    fn top(&mut self) -> Result<Value, String> {
        let first = self.value()?;
        if self.peek() != Some(&Token::Punct(',')) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(',') {
            if self.peek().is_none() {
                break;
            }
            items.push(self.value()?);
        }
        Ok(Value::Tuple(items))
    }

    /// A value, allowing the `real ± imaginary` complex form.
    fn value(&mut self) -> Result<Value, String> {
        let left = self.signed()?;
        let sign = match self.peek() {
            Some(Token::Punct('+')) => 1.0,
            Some(Token::Punct('-')) => -1.0,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.signed()?;
        let re = match left {
            Value::Int(i) => i as f64,
            Value::Real(r) => r,
            _ => return Err("malformed input".to_string()),
        };
        match right {
            Value::Complex(c) if c.re == 0.0 => Ok(Value::Complex(Complex64::new(re, sign * c.im))),
            _ => Err("malformed input".to_string()),
        }
    }

    fn signed(&mut self) -> Result<Value, String> {
        if self.eat('-') {
            return match self.signed()? {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| "integer is too large".to_string()),
                Value::Real(r) => Ok(Value::Real(-r)),
                Value::Complex(c) => Ok(Value::Complex(-c)),
                _ => Err("bad operand for unary -".to_string()),
            };
        }
        if self.eat('+') {
            return match self.signed()? {
                v @ (Value::Int(_) | Value::Real(_) | Value::Complex(_)) => Ok(v),
                _ => Err("bad operand for unary +".to_string()),
            };
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Value, String> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| "unexpected end of input".to_string())?;
        self.pos += 1;
        match token {
            Token::Int(i) => Ok(Value::Int(i)),
            Token::Real(r) => Ok(Value::Real(r)),
            Token::Imag(im) => Ok(Value::Complex(Complex64::new(0.0, im))),
            Token::Str(mut s) => {
                while let Some(Token::Str(next)) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Value::Text(s))
            }
            Token::Name(name) => match name.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "set" if self.eat('(') => {
                    self.expect(')')?;
                    Ok(Value::Set(Vec::new()))
                }
                "None" => Err("'None' is not an answer".to_string()),
                _ => Err(format!("malformed input: unknown name '{name}'")),
            },
            Token::Punct('(') => {
                if self.eat(')') {
                    return Ok(Value::Tuple(Vec::new()));
                }
                let first = self.value()?;
                if self.eat(')') {
                    return Ok(first);
                }
                Ok(Value::Tuple(self.items(')', vec![first])?))
            }
            Token::Punct('[') => Ok(Value::List(self.items(']', Vec::new())?)),
            Token::Punct('{') => self.braces(),
            Token::Punct(c) => Err(format!("unexpected '{c}'")),
        }
    }

    /// Remaining items of a bracketed sequence up to `close`.
    fn items(&mut self, close: char, mut items: Vec<Value>) -> Result<Vec<Value>, String> {
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            if !items.is_empty() {
                self.expect(',')?;
                if self.eat(close) {
                    return Ok(items);
                }
            }
            items.push(self.value()?);
        }
    }

    fn braces(&mut self) -> Result<Value, String> {
        if self.eat('}') {
            return Ok(Value::Dict(Vec::new()));
        }
        let first = self.value()?;
        if !self.eat(':') {
            let items = self.items('}', vec![first])?;
            for item in &items {
                ensure_hashable(item)?;
            }
            return Ok(Value::set(items));
        }
        let mut pairs: Vec<(Value, Value)> = Vec::new();
        let mut key = first;
        loop {
            ensure_hashable(&key)?;
            let value = self.value()?;
            pairs.retain(|(k, _)| k != &key);
            pairs.push((key, value));
            if self.eat('}') {
                return Ok(Value::Dict(pairs));
            }
            self.expect(',')?;
            if self.eat('}') {
                return Ok(Value::Dict(pairs));
            }
            key = self.value()?;
            self.expect(':')?;
        }
    }
}

fn ensure_hashable(value: &Value) -> Result<(), String> {
    match value {
        Value::List(_) | Value::Set(_) | Value::Dict(_) => {
            Err(format!("unhashable type: '{}'", value.kind().name()))
        }
        Value::Tuple(items) => items.iter().try_for_each(ensure_hashable),
        _ => Ok(()),
    }
}

/// Parse a literal. Errors carry a short learner-facing reason.
pub fn parse_literal(text: &str) -> Result<Value, String> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err("empty input".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.top()?;
    if parser.pos < parser.tokens.len() {
        return Err("malformed input".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_literal("42"), Ok(Value::Int(42)));
        assert_eq!(parse_literal(" -1.5 "), Ok(Value::Real(-1.5)));
        assert_eq!(parse_literal("1e3"), Ok(Value::Real(1000.0)));
        assert_eq!(
            parse_literal("1-2j"),
            Ok(Value::Complex(Complex64::new(1.0, -2.0)))
        );
        assert_eq!(parse_literal("2j"), Ok(Value::Complex(Complex64::new(0.0, 2.0))));
        assert!(parse_literal("1+2").is_err());
        assert!(parse_literal("99999999999999999999").is_err());
    }

    #[test]
    fn parses_containers() {
        assert_eq!(
            parse_literal("1, 2"),
            Ok(Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(parse_literal("(1,)"), Ok(Value::Tuple(vec![Value::Int(1)])));
        assert_eq!(parse_literal("(7)"), Ok(Value::Int(7)));
        assert_eq!(
            parse_literal("[[1, 2], [3, 4]]"),
            Ok(Value::List(vec![
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::List(vec![Value::Int(3), Value::Int(4)]),
            ]))
        );
        assert_eq!(
            parse_literal("{3, 1, 3}"),
            Ok(Value::set([Value::Int(1), Value::Int(3)]))
        );
        assert_eq!(
            parse_literal("{'a': True}"),
            Ok(Value::Dict(vec![(Value::text("a"), Value::Bool(true))]))
        );
        assert_eq!(parse_literal("{}"), Ok(Value::Dict(Vec::new())));
        assert_eq!(parse_literal("set()"), Ok(Value::Set(Vec::new())));
    }

    #[test]
    fn rejects_code() {
        assert!(parse_literal("__import__('os')").is_err());
        assert!(parse_literal("[1, 2").is_err());
        assert!(parse_literal("{[1]}").is_err());
        assert!(parse_literal("None").is_err());
    }
}
