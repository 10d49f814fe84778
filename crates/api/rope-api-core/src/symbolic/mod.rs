//! Symbolic expressions for expression, equation and polynomial answers.
//!
//! This is deliberately small: parsing under the configured transformations,
//! light constant folding, free symbols, polynomial structure and an
//! equivalence test that samples both sides at seeded random points.

mod eval;
mod expr;
mod parse;

pub use eval::SAMPLE_POINTS;
pub use expr::{Constant, Equation, Expr, Function};
pub use parse::parse_expr;

use std::collections::BTreeSet;

/// Split a symbol declaration such as `"m, c"` or `"x y"`.
pub fn symbols(declaration: &str) -> BTreeSet<String> {
    declaration
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests;
