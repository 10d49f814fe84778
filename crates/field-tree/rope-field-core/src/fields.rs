//! Constructors for the typed input fields an exercise places in its problem.
//!
//! Each returns a [`FieldBlueprint`] whose leaves carry the default widget for
//! its data type; use [`FieldBlueprint::with_widget`] to pick another control.

use rope_api_core::dtype::{
    BoolType, ComplexType, DType, DictType, ElementType, EquationType, ExpressionType, IntType,
    ListType, MatrixType, OneOfType, PolynomialType, RationalType, RealType, SetComparison,
    SetType, StringType, TupleType, VectorType,
};
use rope_api_core::Value;

use crate::blueprint::{FieldBlueprint, FieldKind};
use crate::widget::Widget;

fn text_field(dtype: DType) -> FieldBlueprint {
    FieldBlueprint::single(dtype, FieldBlueprint::widget(Widget::text()))
}

pub fn boolean() -> FieldBlueprint {
    FieldBlueprint::single(
        DType::Bool(BoolType::default()),
        FieldBlueprint::widget(Widget::checkbox()),
    )
}

pub fn int() -> FieldBlueprint {
    int_range(None, None)
}

/// Integers within optional inclusive bounds. Bounded on both sides, the
/// field gets a slider.
pub fn int_range(minimum: Option<i64>, maximum: Option<i64>) -> FieldBlueprint {
    let widget = match (minimum, maximum) {
        (Some(min), Some(max)) => Widget::slider(min as f64, max as f64),
        _ => Widget::text(),
    };
    FieldBlueprint::single(
        DType::Int(IntType::new(minimum, maximum)),
        FieldBlueprint::widget(widget),
    )
}

pub fn natural(with_zero: bool) -> FieldBlueprint {
    int_range(Some(if with_zero { 0 } else { 1 }), None)
}

pub fn real() -> FieldBlueprint {
    text_field(DType::Real(RealType::default()))
}

pub fn real_close(rtol: f64, atol: f64) -> FieldBlueprint {
    text_field(DType::Real(RealType { rtol, atol }))
}

/// Which side of the imaginary part the `i` goes on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ImaginaryUnit {
    Left,
    #[default]
    Right,
}

/// Complex number entered as real and imaginary part.
pub fn complex() -> FieldBlueprint {
    complex_elementwise(ImaginaryUnit::Right, ComplexType::default())
}

/// Complex number entered in a single text box.
pub fn complex_plain(dtype: ComplexType) -> FieldBlueprint {
    text_field(DType::Complex(dtype))
}

pub fn complex_elementwise(i_on_the: ImaginaryUnit, dtype: ComplexType) -> FieldBlueprint {
    let template = match i_on_the {
        ImaginaryUnit::Right => "<<a>> + <<b>> i",
        ImaginaryUnit::Left => "<<a>> + i <<b>>",
    };
    let part = || {
        text_field(DType::Real(RealType {
            rtol: dtype.rtol,
            atol: dtype.atol,
        }))
    };
    let parts = FieldBlueprint::composite(
        FieldKind::ElementwiseComplex,
        DType::Complex(dtype.clone()),
        template,
        [("a", part()), ("b", part())],
    );
    FieldBlueprint::single(DType::Complex(dtype), parts)
}

/// Fraction entered as numerator and denominator.
pub fn rational() -> FieldBlueprint {
    let parts = FieldBlueprint::composite(
        FieldKind::ElementwiseRational,
        DType::Rational(RationalType::default()),
        "<<a>> / <<b>>",
        [("a", int()), ("b", int())],
    );
    FieldBlueprint::single(DType::Rational(RationalType::default()), parts)
}

/// Fraction or decimal entered in a single text box.
pub fn rational_plain() -> FieldBlueprint {
    text_field(DType::Rational(RationalType::default()))
}

pub fn string() -> FieldBlueprint {
    text_field(DType::String(StringType::default()))
}

pub fn string_stripped() -> FieldBlueprint {
    text_field(DType::String(StringType { strip: true }))
}

pub fn set(count: Option<usize>, comparison: SetComparison) -> FieldBlueprint {
    text_field(DType::Set(SetType { count, comparison }))
}

pub fn tuple(count: Option<usize>) -> FieldBlueprint {
    text_field(DType::Tuple(TupleType { count }))
}

pub fn list(count: Option<usize>) -> FieldBlueprint {
    text_field(DType::List(ListType { count }))
}

pub fn dict(count: Option<usize>) -> FieldBlueprint {
    text_field(DType::Dict(DictType { count }))
}

pub fn matrix(dtype: MatrixType) -> FieldBlueprint {
    text_field(DType::Matrix(dtype))
}

pub fn vector(dtype: VectorType) -> FieldBlueprint {
    text_field(DType::Vector(dtype))
}

/// Vector entered one component per text box.
pub fn vector_elementwise(dtype: VectorType, dim: usize) -> FieldBlueprint {
    let dtype = VectorType {
        dim: Some(dim),
        allow_flat_list: true,
        ..dtype
    };
    let component = || match dtype.sub_dtype {
        ElementType::Integral => int(),
        ElementType::Complex => complex_plain(ComplexType {
            rtol: dtype.rtol,
            atol: dtype.atol,
        }),
        _ => real_close(dtype.rtol, dtype.atol),
    };
    let names: Vec<String> = (1..=dim).map(|i| format!("x{i}")).collect();
    let template = format!(
        "({})",
        names
            .iter()
            .map(|n| format!("<<{n}>>"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let parts = FieldBlueprint::composite(
        FieldKind::ElementwiseVector,
        DType::Vector(dtype.clone()),
        &template,
        names.iter().map(|n| (n.as_str(), component())),
    );
    FieldBlueprint::single(DType::Vector(dtype), parts)
}

pub fn expression(symbols: &str) -> FieldBlueprint {
    text_field(DType::Expression(ExpressionType::new(symbols)))
}

pub fn equation(symbols: &str) -> FieldBlueprint {
    text_field(DType::Equation(EquationType::new(symbols)))
}

/// Equation entered as left and right hand side.
pub fn equation_elementwise(symbols: &str) -> FieldBlueprint {
    let parts = FieldBlueprint::composite(
        FieldKind::ElementwiseEquation,
        DType::Equation(EquationType::new(symbols)),
        "<<lhs>> = <<rhs>>",
        [("lhs", expression(symbols)), ("rhs", expression(symbols))],
    );
    FieldBlueprint::single(DType::Equation(EquationType::new(symbols)), parts)
}

pub fn polynomial(symbols: &str, degree: Option<u32>) -> FieldBlueprint {
    text_field(DType::Polynomial(PolynomialType::new(symbols, degree)))
}

pub fn linear_expression(symbols: &str) -> FieldBlueprint {
    polynomial(symbols, Some(1))
}

/// Univariate polynomial entered one rational coefficient per power,
/// highest power first.
pub fn polynomial_elementwise(symbol: &str, degree: u32) -> FieldBlueprint {
    let dtype = DType::Polynomial(PolynomialType::new(symbol, Some(degree)));
    let term = |k: u32| match k {
        0 => "<<c0>>".to_string(),
        1 => format!("<<c1>> {symbol}"),
        k => format!("<<c{k}>> {symbol}^{k}"),
    };
    let template = (0..=degree).rev().map(term).collect::<Vec<_>>().join(" + ");
    let names: Vec<String> = (0..=degree).rev().map(|k| format!("c{k}")).collect();
    let parts = FieldBlueprint::composite(
        FieldKind::ElementwisePolynomial {
            symbol: symbol.to_string(),
        },
        dtype.clone(),
        &template,
        names.iter().map(|n| (n.as_str(), rational_plain())),
    );
    FieldBlueprint::single(dtype, parts)
}

pub fn linear_expression_elementwise(symbol: &str) -> FieldBlueprint {
    polynomial_elementwise(symbol, 1)
}

/// One of a fixed set of options. The control is settled per attempt from
/// `one_of_maximum_radio_buttons`: radio buttons for short lists, a dropdown
/// otherwise.
pub fn one_of<I, V>(options: I) -> FieldBlueprint
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let dtype = OneOfType::new(options);
    let widget = Widget::choice(dtype.options.clone());
    FieldBlueprint::single(DType::OneOf(dtype), FieldBlueprint::widget(widget))
}

/// A typed field over any data type with a text box.
pub fn typed(dtype: DType) -> FieldBlueprint {
    text_field(dtype)
}
