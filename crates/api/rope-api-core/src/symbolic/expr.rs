use std::collections::BTreeSet;
use std::fmt;

use num_rational::Rational64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Transformation;
use crate::rational;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    /// Imaginary unit.
    I,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Sqrt,
    Abs,
    Factorial,
}

impl Function {
    pub fn lookup(name: &str) -> Option<Function> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "exp" => Function::Exp,
            "log" | "ln" => Function::Log,
            "sqrt" => Function::Sqrt,
            "Abs" | "abs" => Function::Abs,
            "factorial" => Function::Factorial,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Sqrt => "sqrt",
            Function::Abs => "Abs",
            Function::Factorial => "factorial",
        }
    }
}

/// Expression tree. Subtraction, negation and division are expressed through
/// `Add`, `Mul` by -1 and `Pow` by -1.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(Rational64),
    Float(f64),
    Symbol(String),
    Constant(Constant),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Number(Rational64::from_integer(n))
    }

    pub fn zero() -> Expr {
        Expr::int(0)
    }

    pub fn one() -> Expr {
        Expr::int(1)
    }

    pub fn symbol(name: impl Into<String>) -> Expr {
        Expr::Symbol(name.into())
    }

    /// Parse with the default transformations.
    pub fn parse(text: &str) -> Result<Expr, String> {
        super::parse_expr(text, &Transformation::defaults(), &BTreeSet::new())
    }

    pub fn as_number(&self) -> Option<&Rational64> {
        match self {
            Expr::Number(q) => Some(q),
            _ => None,
        }
    }

    pub fn add(terms: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(terms.len());
        let mut constant = Rational64::from_integer(0);
        for term in terms {
            match term {
                Expr::Add(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let mut rest = Vec::with_capacity(flat.len());
        for term in flat {
            match term {
                Expr::Number(q) => match rational::add(&constant, &q) {
                    Some(sum) => constant = sum,
                    None => rest.push(Expr::Number(q)),
                },
                other => rest.push(other),
            }
        }
        if !rational::is_zero(&constant) || rest.is_empty() {
            rest.push(Expr::Number(constant));
        }
        if rest.len() == 1 {
            rest.pop().unwrap_or_else(Expr::zero)
        } else {
            Expr::Add(rest)
        }
    }

    pub fn mul(factors: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Expr::Mul(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let mut coefficient = Rational64::from_integer(1);
        let mut rest = Vec::with_capacity(flat.len());
        for factor in flat {
            match factor {
                Expr::Number(q) => match rational::mul(&coefficient, &q) {
                    Some(product) => coefficient = product,
                    None => rest.push(Expr::Number(q)),
                },
                other => rest.push(other),
            }
        }
        if rational::is_zero(&coefficient) {
            return Expr::zero();
        }
        if coefficient != Rational64::from_integer(1) || rest.is_empty() {
            rest.insert(0, Expr::Number(coefficient));
        }
        if rest.len() == 1 {
            rest.pop().unwrap_or_else(Expr::one)
        } else {
            Expr::Mul(rest)
        }
    }

    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        if let Some(e) = exponent.as_number() {
            if *e == Rational64::from_integer(1) {
                return base;
            }
            if rational::is_zero(e) {
                return Expr::one();
            }
            if let (Expr::Number(b), true) = (&base, e.is_integer()) {
                if let Some(folded) = rational::pow(b, *e.numer()) {
                    return Expr::Number(folded);
                }
            }
        }
        Expr::Pow(Box::new(base), Box::new(exponent))
    }

    pub fn neg(expr: Expr) -> Expr {
        Expr::mul(vec![Expr::int(-1), expr])
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::add(vec![lhs, Expr::neg(rhs)])
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Expr {
        Expr::mul(vec![lhs, Expr::pow(rhs, Expr::int(-1))])
    }

    pub fn call(function: Function, arg: Expr) -> Expr {
        Expr::Call(function, Box::new(arg))
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Add(items) | Expr::Mul(items) => {
                items.iter().for_each(|e| e.collect_symbols(out));
            }
            Expr::Pow(base, exp) => {
                base.collect_symbols(out);
                exp.collect_symbols(out);
            }
            Expr::Call(_, arg) => arg.collect_symbols(out),
            Expr::Number(_) | Expr::Float(_) | Expr::Constant(_) => {}
        }
    }

    fn mentions(&self, symbols: &BTreeSet<String>) -> bool {
        self.free_symbols().iter().any(|s| symbols.contains(s))
    }

    /// Total degree in `symbols`, or `None` if this is not a polynomial in them.
    pub fn polynomial_degree(&self, symbols: &BTreeSet<String>) -> Option<u32> {
        match self {
            Expr::Symbol(name) if symbols.contains(name) => Some(1),
            Expr::Symbol(_) | Expr::Number(_) | Expr::Float(_) | Expr::Constant(_) => Some(0),
            Expr::Add(terms) => terms.iter().try_fold(0u32, |acc, t| {
                Some(acc.max(t.polynomial_degree(symbols)?))
            }),
            Expr::Mul(factors) => factors.iter().try_fold(0u32, |acc, f| {
                acc.checked_add(f.polynomial_degree(symbols)?)
            }),
            Expr::Pow(base, exp) => {
                if !base.mentions(symbols) && !exp.mentions(symbols) {
                    return Some(0);
                }
                let e = exp.as_number()?;
                if !e.is_integer() || *e.numer() < 0 {
                    return None;
                }
                let power = u32::try_from(*e.numer()).ok()?;
                base.polynomial_degree(symbols)?.checked_mul(power)
            }
            Expr::Call(_, arg) => (!arg.mentions(symbols)).then_some(0),
        }
    }

    /// Exact coefficients `[c0, c1, ...]` of a univariate polynomial with
    /// rational coefficients.
    pub fn coefficients(&self, symbol: &str) -> Option<Vec<Rational64>> {
        let mut coeffs = match self {
            Expr::Number(q) => vec![*q],
            Expr::Symbol(name) if name == symbol => {
                vec![Rational64::from_integer(0), Rational64::from_integer(1)]
            }
            Expr::Add(terms) => {
                let mut acc = vec![Rational64::from_integer(0)];
                for term in terms {
                    acc = poly_add(&acc, &term.coefficients(symbol)?)?;
                }
                acc
            }
            Expr::Mul(factors) => {
                let mut acc = vec![Rational64::from_integer(1)];
                for factor in factors {
                    acc = poly_mul(&acc, &factor.coefficients(symbol)?)?;
                }
                acc
            }
            Expr::Pow(base, exp) => {
                let e = exp.as_number()?;
                if !e.is_integer() || *e.numer() < 0 || *e.numer() > 64 {
                    return None;
                }
                let base = base.coefficients(symbol)?;
                let mut acc = vec![Rational64::from_integer(1)];
                for _ in 0..*e.numer() {
                    acc = poly_mul(&acc, &base)?;
                }
                acc
            }
            _ => return None,
        };
        while coeffs.len() > 1 && coeffs.last().is_some_and(rational::is_zero) {
            coeffs.pop();
        }
        Some(coeffs)
    }

    /// Polynomial in `symbol` from coefficients `[c0, c1, ...]`.
    pub fn from_coefficients(symbol: &str, coeffs: &[Rational64]) -> Expr {
        let terms = coeffs
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| !rational::is_zero(c))
            .map(|(degree, c)| {
                let power = Expr::pow(Expr::symbol(symbol), Expr::int(degree as i64));
                Expr::mul(vec![Expr::Number(*c), power])
            })
            .collect::<Vec<_>>();
        Expr::add(terms)
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(q) if *q.numer() < 0 => PREC_ADD,
            Expr::Number(q) if *q.denom() != 1 => PREC_MUL,
            Expr::Float(f) if *f < 0.0 => PREC_ADD,
            Expr::Add(_) => PREC_ADD,
            Expr::Mul(_) if self.split_sign().0 => PREC_ADD,
            Expr::Mul(_) => PREC_MUL,
            Expr::Pow(..) => PREC_POW,
            _ => PREC_ATOM,
        }
    }

    /// `(true, -self)` when the printed form starts with a minus sign.
    fn split_sign(&self) -> (bool, Expr) {
        match self {
            Expr::Number(q) if *q.numer() < 0 => match rational::neg(q) {
                Some(pos) => (true, Expr::Number(pos)),
                None => (false, self.clone()),
            },
            Expr::Float(f) if *f < 0.0 => (true, Expr::Float(-f)),
            Expr::Mul(factors) => match factors.first() {
                Some(Expr::Number(q)) if *q.numer() < 0 => match rational::neg(q) {
                    Some(pos) => {
                        let mut rest = factors.clone();
                        rest[0] = Expr::Number(pos);
                        (true, Expr::mul(rest))
                    }
                    None => (false, self.clone()),
                },
                _ => (false, self.clone()),
            },
            _ => (false, self.clone()),
        }
    }
}

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_POW: u8 = 3;
const PREC_ATOM: u8 = 4;

fn poly_add(a: &[Rational64], b: &[Rational64]) -> Option<Vec<Rational64>> {
    let zero = Rational64::from_integer(0);
    (0..a.len().max(b.len()))
        .map(|i| rational::add(a.get(i).unwrap_or(&zero), b.get(i).unwrap_or(&zero)))
        .collect()
}

fn poly_mul(a: &[Rational64], b: &[Rational64]) -> Option<Vec<Rational64>> {
    let mut out = vec![Rational64::from_integer(0); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] = rational::add(&out[i + j], &rational::mul(x, y)?)?;
        }
    }
    Some(out)
}

fn wrapped(expr: &Expr, min_prec: u8) -> String {
    if expr.precedence() < min_prec {
        format!("({expr})")
    } else {
        expr.to_string()
    }
}

fn fmt_mul(factors: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<Expr> = Vec::new();
    for factor in factors {
        match factor {
            Expr::Number(q) if *q.denom() != 1 => {
                if q.numer().abs() != 1 || factors.len() == 1 {
                    numer.push(q.numer().abs().to_string());
                }
                denom.push(Expr::int(*q.denom()));
            }
            Expr::Number(q) => {
                if q.numer().abs() != 1 {
                    numer.push(q.numer().abs().to_string());
                }
            }
            Expr::Pow(base, exp) if exp.as_number().is_some_and(|e| *e.numer() < 0) => {
                let positive = exp.as_number().and_then(rational::neg);
                match positive {
                    Some(p) => denom.push(Expr::pow((**base).clone(), Expr::Number(p))),
                    None => numer.push(wrapped(factor, PREC_MUL)),
                }
            }
            other => numer.push(wrapped(other, PREC_MUL + 1)),
        }
    }
    if numer.is_empty() {
        numer.push("1".to_string());
    }
    write!(f, "{}", numer.join("*"))?;
    match denom.len() {
        0 => Ok(()),
        1 => write!(f, "/{}", wrapped(&denom[0], PREC_POW)),
        _ => {
            let parts: Vec<String> = denom.iter().map(|d| wrapped(d, PREC_MUL + 1)).collect();
            write!(f, "/({})", parts.join("*"))
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, magnitude) = self.split_sign();
        if negative {
            return write!(f, "-{}", wrapped(&magnitude, PREC_MUL));
        }
        match self {
            Expr::Number(q) if *q.denom() == 1 => write!(f, "{}", q.numer()),
            Expr::Number(q) => write!(f, "{}/{}", q.numer(), q.denom()),
            Expr::Float(x) => write!(f, "{}", crate::value::format_real(*x)),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Constant(Constant::Pi) => write!(f, "pi"),
            Expr::Constant(Constant::E) => write!(f, "E"),
            Expr::Constant(Constant::I) => write!(f, "I"),
            Expr::Add(terms) => {
                for (idx, term) in terms.iter().enumerate() {
                    let (neg, mag) = term.split_sign();
                    match (idx, neg) {
                        (0, _) => write!(f, "{}", term)?,
                        (_, true) => write!(f, " - {}", wrapped(&mag, PREC_MUL))?,
                        (_, false) => write!(f, " + {}", wrapped(term, PREC_MUL))?,
                    }
                }
                Ok(())
            }
            Expr::Mul(factors) => fmt_mul(factors, f),
            Expr::Pow(base, exp) => write!(
                f,
                "{}**{}",
                wrapped(base, PREC_ATOM),
                wrapped(exp, PREC_ATOM)
            ),
            Expr::Call(function, arg) => write!(f, "{}({})", function.name(), arg),
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Expr::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// `lhs = rhs`, kept unevaluated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Equation { lhs, rhs }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = self.lhs.free_symbols();
        out.extend(self.rhs.free_symbols());
        out
    }

    /// Sides agree pairwise, either as written or swapped.
    pub fn equals(&self, other: &Equation) -> bool {
        (self.lhs.equals(&other.lhs) && self.rhs.equals(&other.rhs))
            || (self.lhs.equals(&other.rhs) && self.rhs.equals(&other.lhs))
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
