use std::collections::BTreeSet;

use num_rational::Rational64;

use super::*;
use crate::config::Transformation;

fn parse(text: &str) -> Expr {
    Expr::parse(text).expect("expression parses")
}

fn parse_with(text: &str, extra: &[Transformation]) -> Result<Expr, String> {
    let mut tf = Transformation::defaults();
    tf.extend_from_slice(extra);
    parse_expr(text, &tf, &BTreeSet::new())
}

#[test]
fn it_should_fold_exact_constants() {
    assert_eq!(parse("6/4"), Expr::Number(Rational64::new(3, 2)));
    assert_eq!(parse("2**-1"), Expr::Number(Rational64::new(1, 2)));
    assert_eq!(parse("0.25"), Expr::Number(Rational64::new(1, 4)));
    assert_eq!(parse("0.1[6]"), Expr::Number(Rational64::new(1, 6)));
}

#[test]
fn it_should_collect_free_symbols() {
    let e = parse("m*c^2 + sin(x)");
    let expected: BTreeSet<String> = ["c", "m", "x"].iter().map(|s| s.to_string()).collect();
    assert_eq!(e.free_symbols(), expected);
    assert_eq!(symbols("m, c"), ["c", "m"].iter().map(|s| s.to_string()).collect());
}

#[test]
fn it_should_decide_equivalence_by_sampling() {
    assert!(parse("(x+1)^2").equals(&parse("x^2 + 2*x + 1")));
    assert!(parse("sin(x)^2 + cos(x)^2").equals(&parse("1")));
    assert!(!parse("x^2").equals(&parse("x^3")));
    assert!(!parse("sqrt(x^2)").equals(&parse("x")));
    assert!(parse("0.5").equals(&parse("1/2")));
}

#[test]
fn it_should_treat_indeterminate_as_unequal() {
    assert!(!parse("factorial(x)").equals(&parse("factorial(y)")));
    assert!(!parse("log(0*x)").equals(&parse("log(0*x) + 1")));
}

#[test]
fn it_should_respect_transformations() {
    assert!(parse_with("2x", &[]).is_err());
    assert_eq!(
        parse_with("2x", &[Transformation::ImplicitMultiplication]),
        Ok(parse("2*x"))
    );
    assert_eq!(
        parse_with("xy", &[Transformation::SplitSymbols]),
        Ok(parse("x*y"))
    );
    assert_eq!(
        parse_with("sin x", &[Transformation::ImplicitApplication]),
        Ok(parse("sin(x)"))
    );
    assert_eq!(
        parse_with("sin^2(x)", &[Transformation::FunctionExponentiation]),
        Ok(parse("sin(x)^2"))
    );
    assert!(parse_expr("x^2", &[Transformation::AutoSymbol], &BTreeSet::new()).is_err());
    assert!(parse_expr("x", &[], &BTreeSet::new()).is_err());
    assert_eq!(parse("3!"), Expr::call(Function::Factorial, Expr::int(3)));
}

#[test]
fn it_should_print_parseable_text() {
    for text in [
        "x**2 - 2*x + 1",
        "-x/2",
        "3*a/(b*c)",
        "sqrt(x**(1/2)) + pi",
        "(x + 1)**(-2)",
        "E**(I*pi) + 1",
    ] {
        let e = parse(text);
        let printed = e.to_string();
        assert!(parse(&printed).equals(&e), "{text} printed as {printed}");
    }
    assert_eq!(parse("x^2 - 2*x + 1").to_string(), "x**2 - 2*x + 1");
    assert_eq!(parse("-x/2").to_string(), "-x/2");
}

#[test]
fn it_should_extract_polynomial_structure() {
    let vars: BTreeSet<String> = ["x".to_string()].into_iter().collect();
    assert_eq!(parse("(x+1)^2").polynomial_degree(&vars), Some(2));
    assert_eq!(parse("a*x + b").polynomial_degree(&vars), Some(1));
    assert_eq!(parse("1/x").polynomial_degree(&vars), None);
    assert_eq!(parse("sin(x)").polynomial_degree(&vars), None);

    let coeffs = parse("(x+1)^2").coefficients("x").expect("rational polynomial");
    assert_eq!(
        coeffs,
        vec![Rational64::from_integer(1), Rational64::from_integer(2), Rational64::from_integer(1)]
    );
    let rebuilt = Expr::from_coefficients("x", &coeffs);
    assert!(rebuilt.equals(&parse("x^2 + 2*x + 1")));
}

#[test]
fn it_should_compare_equations_by_sides() {
    let a = Equation::new(parse("a^2 + b^2"), parse("c^2"));
    let swapped = Equation::new(parse("c^2"), parse("b^2 + a^2"));
    let moved = Equation::new(parse("a^2 + b^2 - c^2"), Expr::zero());
    assert!(a.equals(&swapped));
    assert!(!a.equals(&moved));
    assert_eq!(a.to_string(), "a**2 + b**2 = c**2");
}
