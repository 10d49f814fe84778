use approx::assert_relative_eq;
use num_rational::Rational64;

use super::*;
use crate::value::Matrix;

fn cfg() -> Config {
    Config::default()
}

fn int() -> DType {
    DType::Int(IntType::default())
}

#[test]
fn it_should_parse_an_integer_answer() {
    let parsed = int().parse("42", &cfg()).expect("parse");
    assert_eq!(parsed, Some(Value::Int(42)));
    let checked = int().coerce(Value::Int(42), &cfg()).expect("coerce");
    assert_eq!(int().compare(&checked, &Value::Int(42)), 1.0);
}

#[test]
fn it_should_treat_blank_input_as_no_answer() {
    for dtype in [int(), DType::String(StringType::default())] {
        assert_eq!(dtype.parse("", &cfg()).expect("parse"), None);
        assert_eq!(dtype.parse("   ", &cfg()).expect("parse"), None);
    }
}

#[test]
fn it_should_refuse_oversized_input_before_parsing() {
    let config = cfg();
    let raw = "(".repeat(config.maximum_input_length + 1);
    let err = int().parse(&raw, &config).expect_err("too long");
    assert!(err.message.starts_with("Input too long"));

    let exact = "1".repeat(config.maximum_input_length);
    assert!(DType::String(StringType::default())
        .parse(&exact, &config)
        .is_ok());
}

#[test]
fn it_should_report_bad_types() {
    let err = int().coerce(Value::text("x"), &cfg()).expect_err("bad type");
    assert_eq!(err.message, "Bad type: 'int' expected, got 'string'.");
}

#[test]
fn it_should_cast_integral_reals_to_int() {
    assert_eq!(
        int().coerce(Value::Real(3.0), &cfg()).expect("cast"),
        Value::Int(3)
    );
    assert!(int().coerce(Value::Real(3.5), &cfg()).is_err());
}

#[test]
fn it_should_enforce_integer_bounds() {
    let bounded = DType::Int(IntType::new(Some(1), Some(10)));
    assert!(bounded.check_type(&Value::Int(0)).is_err());
    assert!(bounded.check_type(&Value::Int(11)).is_err());
    assert!(bounded.check_type(&Value::Int(10)).is_ok());
    assert_eq!(bounded.info(), "an integer between 1 and 10");
    assert_eq!(bounded.dummy_value(), Some(Value::Int(1)));
    assert_eq!(bounded.trivial_value(), None);

    let broken = DType::Int(IntType::new(Some(3), Some(3)));
    assert!(broken.validate().is_err());
}

#[test]
fn it_should_score_sets_by_intersection_over_union() {
    let dtype = DType::Set(SetType {
        count: None,
        comparison: SetComparison::IoU,
    });
    let answer = dtype.parse("{1, 2, 3}", &cfg()).expect("parse").expect("value");
    let answer = dtype.coerce(answer, &cfg()).expect("coerce");
    let solution = Value::set([2, 3, 4].map(Value::Int));
    assert_relative_eq!(dtype.compare(&answer, &solution), 0.5);
    assert_eq!(dtype.compare(&Value::Set(vec![]), &Value::Set(vec![])), 1.0);
}

#[test]
fn it_should_check_container_counts() {
    let dtype = DType::Set(SetType {
        count: Some(2),
        comparison: SetComparison::Equality,
    });
    let err = dtype
        .check_type(&Value::set([Value::Int(1)]))
        .expect_err("count");
    assert_eq!(err.message, "Expected set with 2 elements, not 1.");
    assert_eq!(
        dtype.dummy_value(),
        Some(Value::set([Value::Int(0), Value::Int(1)]))
    );

    let tuple = DType::Tuple(TupleType { count: Some(3) });
    assert_eq!(
        tuple.dummy_value(),
        Some(Value::Tuple(vec![Value::Int(0); 3]))
    );
    assert_eq!(tuple.trivial_value(), None);
}

#[test]
fn it_should_parse_fractions_and_decimals_as_rationals() {
    let dtype = DType::Rational(RationalType::default());
    let v = dtype.parse("3/2", &cfg()).expect("parse").expect("value");
    assert_eq!(v, Value::Rational(Rational64::new(3, 2)));
    let v = dtype.parse("0.25", &cfg()).expect("parse").expect("value");
    assert_eq!(v, Value::Rational(Rational64::new(1, 4)));
    assert!(dtype.parse("1/0", &cfg()).is_err());
}

#[test]
fn it_should_compare_reals_with_tolerance() {
    let exact = DType::Real(RealType::default());
    assert_eq!(exact.compare(&Value::Real(1.0), &Value::Real(1.0 + 1e-9)), 0.0);
    let loose = DType::Real(RealType {
        rtol: 0.0,
        atol: 1e-6,
    });
    assert_eq!(loose.compare(&Value::Real(1.0), &Value::Real(1.0 + 1e-9)), 1.0);
}

#[test]
fn it_should_accept_boolean_representations() {
    let dtype = DType::Bool(BoolType::default());
    assert_eq!(dtype.parse("yes", &cfg()).expect("parse"), Some(Value::Bool(true)));
    assert_eq!(dtype.parse("0", &cfg()).expect("parse"), Some(Value::Bool(false)));
    assert!(dtype.parse("maybe", &cfg()).is_err());
}

#[test]
fn it_should_validate_one_of_options() {
    let dtype = DType::OneOf(OneOfType::new(["red", "green"].map(Value::text)));
    assert!(dtype.validate().is_ok());
    assert_eq!(
        dtype.parse("green", &cfg()).expect("parse"),
        Some(Value::text("green"))
    );
    let err = dtype.check_type(&Value::text("blue")).expect_err("not an option");
    assert_eq!(err.message, "'blue' is not in ('red', 'green').");

    let single = DType::OneOf(OneOfType::new([Value::Int(1)]));
    assert!(single.validate().is_err());
    let mixed = DType::OneOf(OneOfType::new([Value::Int(1), Value::text("a")]));
    assert!(mixed.validate().is_err());
}

#[test]
fn it_should_check_matrix_shapes_and_entries() {
    let dtype = DType::Matrix(MatrixType::default().with_shape(Some(2), Some(2)));
    assert_eq!(dtype.info(), "a 2x2 matrix");
    let m = dtype
        .parse("[[1, 2], [3, 4]]", &cfg())
        .expect("parse")
        .expect("value");
    let m = dtype.coerce(m, &cfg()).expect("coerce");
    assert_eq!(m.to_string(), "[[1, 2], [3, 4]]");

    let err = dtype
        .coerce(Value::List(vec![Value::Int(1), Value::Int(2)]), &cfg())
        .expect_err("flat");
    assert_eq!(err.message, "Expected two dimensions, not 1.");

    let err = dtype
        .check_type(&Value::Matrix(Matrix::zeros(3, 2)))
        .expect_err("rows");
    assert_eq!(err.message, "Expected 2 rows, not 3.");

    let integral = DType::Matrix(MatrixType::default().with_sub_dtype(ElementType::Integral));
    let real = Matrix::from_reals(1, 1, &[0.5]).expect("matrix");
    let err = integral.check_type(&Value::Matrix(real)).expect_err("entries");
    assert_eq!(err.message, "Entries must be integral.");
}

#[test]
fn it_should_score_matrices_elementwise() {
    let dtype = DType::Matrix(MatrixType::default());
    let a = Matrix::from_reals(2, 2, &[1.0, 2.0, 3.0, 4.0]).expect("matrix");
    let b = Matrix::from_reals(2, 2, &[1.0, 2.0, 3.0, 5.0]).expect("matrix");
    assert_relative_eq!(
        dtype.compare(&Value::Matrix(a.clone()), &Value::Matrix(b.clone())),
        0.75
    );
    let strict = DType::Matrix(MatrixType {
        compare_elementwise: false,
        ..MatrixType::default()
    });
    assert_eq!(strict.compare(&Value::Matrix(a), &Value::Matrix(b)), 0.0);
}

#[test]
fn it_should_read_flat_lists_as_vectors() {
    let dtype = DType::Vector(VectorType::default().with_dim(3));
    assert_eq!(dtype.info(), "a 3-dimensional column vector");
    let v = dtype.parse("[1, 2, 3]", &cfg()).expect("parse").expect("value");
    let v = dtype.coerce(v, &cfg()).expect("coerce");
    match v {
        Value::Matrix(m) => assert_eq!(m.shape(), (3, 1)),
        other => panic!("expected matrix, got {other:?}"),
    }
    assert_eq!(dtype.trivial_value(), None);
    assert!(DType::Vector(VectorType::default().with_dim(0))
        .validate()
        .is_err());
}

#[test]
fn it_should_compare_expressions_symbolically() {
    let dtype = DType::Expression(ExpressionType::new("x"));
    let a = dtype.parse("(x+1)^2", &cfg()).expect("parse").expect("value");
    let b = dtype
        .parse("x^2 + 2*x + 1", &cfg())
        .expect("parse")
        .expect("value");
    assert_eq!(dtype.compare(&a, &b), 1.0);
    let c = dtype.parse("x^2 + 1", &cfg()).expect("parse").expect("value");
    assert_eq!(dtype.compare(&a, &c), 0.0);
    assert!(dtype.check_type(&dtype.parse("y", &cfg()).expect("parse").expect("value")).is_err());
}

#[test]
fn it_should_require_a_single_equal_sign() {
    let dtype = DType::Equation(EquationType::new("x"));
    let err = dtype.parse("x + 1", &cfg()).expect_err("no sign");
    assert_eq!(err.message, "An equation needs an equal sign.");
    let err = dtype.parse("x = 1 = 2", &cfg()).expect_err("two signs");
    assert_eq!(err.message, "Equation contains multiple equal signs.");
    let a = dtype.parse("2*x = 4", &cfg()).expect("parse").expect("value");
    let b = dtype.parse("4 = x + x", &cfg()).expect("parse").expect("value");
    assert_eq!(dtype.compare(&a, &b), 1.0);
}

#[test]
fn it_should_bound_polynomial_degree() {
    let dtype = DType::Polynomial(PolynomialType::new("x", Some(2)));
    let ok = dtype.parse("3*x^2 - 1", &cfg()).expect("parse").expect("value");
    assert!(dtype.check_type(&ok).is_ok());
    let high = dtype.parse("x^3", &cfg()).expect("parse").expect("value");
    assert!(dtype.check_type(&high).is_err());
    let not_poly = dtype.parse("sin(x)", &cfg()).expect("parse").expect("value");
    assert!(dtype.check_type(&not_poly).is_err());
}

#[test]
fn it_should_round_trip_through_serde() {
    let dtype = DType::Vector(VectorType::default().with_dim(2));
    let json = serde_json::to_string(&dtype).expect("serialize");
    let back: DType = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, dtype);
}
