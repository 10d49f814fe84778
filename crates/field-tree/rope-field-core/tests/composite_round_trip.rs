use std::sync::Arc;

use num_complex::Complex64;
use num_rational::Rational64;

use rope_api_core::config::Config;
use rope_api_core::dtype::VectorType;
use rope_api_core::symbolic::Expr;
use rope_api_core::Value;
use rope_field_core::{fields, FieldBlueprint, FieldTree, Problem, Slot};

fn single(field: FieldBlueprint) -> FieldTree {
    let blueprint = Problem::new("<<x>>").field("x", field).build();
    FieldTree::instantiate(&blueprint, Arc::new(Config::default())).expect("tree")
}

fn round_trip(field: FieldBlueprint, value: Value) -> Value {
    let mut tree = single(field);
    tree.set("x", Slot::Value, Some(value)).expect("set");
    tree.get("x", Slot::Value).expect("get").expect("value")
}

#[test]
fn it_should_round_trip_elementwise_complex_numbers() {
    let z = Value::Complex(Complex64::new(-1.5, 0.25));
    assert_eq!(round_trip(fields::complex(), z.clone()), z);
}

#[test]
fn it_should_round_trip_elementwise_fractions() {
    let q = Value::Rational(Rational64::new(3, 2));
    assert_eq!(round_trip(fields::rational(), q.clone()), q);
}

#[test]
fn it_should_round_trip_elementwise_equations() {
    let eq = rope_api_core::Equation::new(
        Expr::parse("2*x").expect("lhs"),
        Expr::parse("4").expect("rhs"),
    );
    match round_trip(fields::equation_elementwise("x"), Value::Equation(eq.clone())) {
        Value::Equation(back) => assert!(back.equals(&eq)),
        other => panic!("expected equation, got {other:?}"),
    }
}

#[test]
fn it_should_round_trip_elementwise_vectors() {
    let v = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let back = round_trip(fields::vector_elementwise(VectorType::default(), 3), v);
    match back {
        Value::Matrix(m) => assert_eq!(m.shape(), (3, 1)),
        other => panic!("expected matrix, got {other:?}"),
    }
}

#[test]
fn it_should_read_elementwise_vectors_from_widgets() {
    let mut tree = single(fields::vector_elementwise(VectorType::default(), 2));
    let widgets = tree.widgets();
    tree.set_widget_text(widgets[0], Some("1.5".to_string())).expect("x1");
    tree.set_widget_text(widgets[1], Some("-2".to_string())).expect("x2");
    match tree.get("x", Slot::Value).expect("get") {
        Some(Value::Matrix(m)) => assert_eq!(m.shape(), (2, 1)),
        other => panic!("expected matrix, got {other:?}"),
    }
}
