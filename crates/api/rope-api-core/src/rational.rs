//! Exact rational helpers on top of `Rational64`.
//!
//! Arithmetic goes through `i128` and reports overflow as `None` instead of
//! panicking, which keeps learner input from crashing the engine.

use num_rational::Rational64;

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Reduce `n/d` and narrow it back to 64 bits.
pub fn from_i128(numer: i128, denom: i128) -> Option<Rational64> {
    if denom == 0 {
        return None;
    }
    let g = gcd(numer, denom).max(1);
    let (mut n, mut d) = (numer / g, denom / g);
    if d < 0 {
        n = -n;
        d = -d;
    }
    let n = i64::try_from(n).ok()?;
    let d = i64::try_from(d).ok()?;
    Some(Rational64::new_raw(n, d))
}

#[inline]
fn parts(r: &Rational64) -> (i128, i128) {
    (*r.numer() as i128, *r.denom() as i128)
}

pub fn add(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    let (an, ad) = parts(a);
    let (bn, bd) = parts(b);
    from_i128(an.checked_mul(bd)?.checked_add(bn.checked_mul(ad)?)?, ad.checked_mul(bd)?)
}

pub fn mul(a: &Rational64, b: &Rational64) -> Option<Rational64> {
    let (an, ad) = parts(a);
    let (bn, bd) = parts(b);
    from_i128(an.checked_mul(bn)?, ad.checked_mul(bd)?)
}

pub fn neg(a: &Rational64) -> Option<Rational64> {
    let (an, ad) = parts(a);
    from_i128(-an, ad)
}

/// Integer power; exponents beyond 64 in magnitude are refused.
pub fn pow(base: &Rational64, exponent: i64) -> Option<Rational64> {
    if exponent.unsigned_abs() > 64 {
        return None;
    }
    let mut acc = Rational64::from_integer(1);
    for _ in 0..exponent.unsigned_abs() {
        acc = mul(&acc, base)?;
    }
    if exponent < 0 {
        let (n, d) = parts(&acc);
        return from_i128(d, n);
    }
    Some(acc)
}

#[inline]
pub fn to_f64(r: &Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

#[inline]
pub fn is_zero(r: &Rational64) -> bool {
    *r.numer() == 0
}

fn digits(text: &str) -> Option<i128> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'_') {
        return None;
    }
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    cleaned.parse::<i128>().ok()
}

fn ten_pow(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// Decimal literal such as `-1.25`, `.5`, `3.` or `1e-3`.
pub fn parse_decimal(text: &str) -> Option<Rational64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], body[idx + 1..].parse::<i32>().ok()?),
        None => (body, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int_value = if int_part.is_empty() { 0 } else { digits(int_part)? };
    let frac_value = if frac_part.is_empty() { 0 } else { digits(frac_part)? };
    let scale = ten_pow(frac_part.len() as u32)?;
    let mut numer = int_value.checked_mul(scale)?.checked_add(frac_value)?;
    let mut denom = scale;
    if exponent >= 0 {
        numer = numer.checked_mul(ten_pow(exponent as u32)?)?;
    } else {
        denom = denom.checked_mul(ten_pow(exponent.unsigned_abs())?)?;
    }
    if negative {
        numer = -numer;
    }
    from_i128(numer, denom)
}

/// `int.nonrep[rep]` as an exact fraction, e.g. `0.1[6]` is 1/6.
pub fn repeating_decimal(int_part: &str, non_repeating: &str, repeating: &str) -> Option<Rational64> {
    let whole = format!("{int_part}{non_repeating}{repeating}");
    let head = format!("{int_part}{non_repeating}");
    let all = digits(&whole)?;
    let prefix = if head.is_empty() { 0 } else { digits(&head)? };
    let denom = ten_pow(non_repeating.len() as u32)?
        .checked_mul(ten_pow(repeating.len() as u32)?.checked_sub(1)?)?;
    from_i128(all.checked_sub(prefix)?, denom)
}

/// Fraction notation as accepted by learners: `3/2`, `-7`, `0.125`, `1e3`.
pub fn parse_fraction(text: &str) -> Result<Rational64, String> {
    let trimmed = text.trim();
    let invalid = || format!("Invalid literal for a fraction: '{trimmed}'.");
    if let Some((numer, denom)) = trimmed.split_once('/') {
        let (negative, numer) = match numer.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, numer.strip_prefix('+').unwrap_or(numer)),
        };
        let n = digits(numer).ok_or_else(invalid)?;
        let d = digits(denom).ok_or_else(invalid)?;
        if d == 0 {
            return Err(format!("Fraction({}{n}, 0): division by zero.", if negative { "-" } else { "" }));
        }
        return from_i128(if negative { -n } else { n }, d).ok_or_else(invalid);
    }
    parse_decimal(trimmed).ok_or_else(invalid)
}

/// Exact rational of a float through its shortest decimal representation.
pub fn from_f64(value: f64) -> Option<Rational64> {
    if !value.is_finite() {
        return None;
    }
    parse_decimal(&format!("{value}"))
}
