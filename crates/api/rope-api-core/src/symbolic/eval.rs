use std::f64::consts::{E, PI};

use hashbrown::HashMap;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::expr::{Constant, Expr, Function};
use crate::rational;

/// Points sampled when deciding equivalence.
pub const SAMPLE_POINTS: usize = 16;
/// Samples must be reproducible so repeated scoring gives identical results.
const SAMPLE_SEED: u64 = 0x0070_7972_6f70_65;
const MIN_AGREEMENT: usize = 4;
const TOLERANCE: f64 = 1e-9;

fn zero() -> Complex64 {
    Complex64::new(0.0, 0.0)
}

fn factorial(z: Complex64) -> Option<Complex64> {
    if z.im != 0.0 || z.re < 0.0 || z.re != z.re.trunc() || z.re > 170.0 {
        return None;
    }
    let n = z.re as u32;
    Some(Complex64::new((1..=n).map(f64::from).product(), 0.0))
}

fn apply(function: Function, z: Complex64) -> Option<Complex64> {
    Some(match function {
        Function::Sin => z.sin(),
        Function::Cos => z.cos(),
        Function::Tan => z.tan(),
        Function::Asin => z.asin(),
        Function::Acos => z.acos(),
        Function::Atan => z.atan(),
        Function::Sinh => z.sinh(),
        Function::Cosh => z.cosh(),
        Function::Tanh => z.tanh(),
        Function::Exp => z.exp(),
        Function::Log => {
            if z == zero() {
                return None;
            }
            z.ln()
        }
        Function::Sqrt => z.sqrt(),
        Function::Abs => Complex64::new(z.norm(), 0.0),
        Function::Factorial => factorial(z)?,
    })
}

impl Expr {
    /// Numeric value under `env`; `None` for unbound symbols and poles.
    pub fn evaluate(&self, env: &HashMap<String, Complex64>) -> Option<Complex64> {
        let value = match self {
            Expr::Number(q) => Complex64::new(rational::to_f64(q), 0.0),
            Expr::Float(x) => Complex64::new(*x, 0.0),
            Expr::Symbol(name) => *env.get(name)?,
            Expr::Constant(Constant::Pi) => Complex64::new(PI, 0.0),
            Expr::Constant(Constant::E) => Complex64::new(E, 0.0),
            Expr::Constant(Constant::I) => Complex64::new(0.0, 1.0),
            Expr::Add(terms) => terms
                .iter()
                .try_fold(zero(), |acc, t| Some(acc + t.evaluate(env)?))?,
            Expr::Mul(factors) => factors
                .iter()
                .try_fold(Complex64::new(1.0, 0.0), |acc, f| Some(acc * f.evaluate(env)?))?,
            Expr::Pow(base, exp) => {
                let base = base.evaluate(env)?;
                match exp.as_number() {
                    Some(q) if q.is_integer() && q.numer().abs() <= i32::MAX as i64 => {
                        if base == zero() && *q.numer() < 0 {
                            return None;
                        }
                        base.powi(*q.numer() as i32)
                    }
                    _ => {
                        let exp = exp.evaluate(env)?;
                        if base == zero() {
                            return (exp.re > 0.0).then(zero);
                        }
                        base.powc(exp)
                    }
                }
            }
            Expr::Call(function, arg) => apply(*function, arg.evaluate(env)?)?,
        };
        (value.re.is_finite() && value.im.is_finite()).then_some(value)
    }

    /// Equivalence test. Structurally equal trees are equal; otherwise both
    /// sides are sampled at seeded complex points. A point where both sides
    /// evaluate and differ proves inequality. Too few comparable points is
    /// treated as unequal.
    pub fn equals(&self, other: &Expr) -> bool {
        if self == other {
            return true;
        }
        let mut symbols = self.free_symbols();
        symbols.extend(other.free_symbols());
        let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
        let mut agreed = 0;
        for _ in 0..SAMPLE_POINTS {
            let env: HashMap<String, Complex64> = symbols
                .iter()
                .map(|s| {
                    let point = Complex64::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
                    (s.clone(), point)
                })
                .collect();
            let (Some(a), Some(b)) = (self.evaluate(&env), other.evaluate(&env)) else {
                continue;
            };
            let scale = 1.0 + a.norm().max(b.norm());
            if (a - b).norm() > TOLERANCE * scale {
                return false;
            }
            agreed += 1;
        }
        agreed >= MIN_AGREEMENT
    }
}
