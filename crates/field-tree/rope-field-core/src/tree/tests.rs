use std::sync::Arc;

use approx::assert_relative_eq;
use num_complex::Complex64;
use num_rational::Rational64;

use rope_api_core::config::Config;
use rope_api_core::{RopeError, Value};

use super::*;
use crate::blueprint::Problem;
use crate::fields;

fn tree(problem: Problem) -> FieldTree {
    FieldTree::instantiate(&problem.build(), Arc::new(Config::default())).expect("instantiate")
}

fn division() -> FieldTree {
    tree(
        Problem::new("<<dividend>> / <<divisor>> = <<q>> r <<r>>")
            .field("q", fields::int())
            .field("r", fields::int()),
    )
}

#[test]
fn it_should_order_input_fields_by_template() {
    let t = tree(
        Problem::new("<<b>> then <<a>> with <<c>>")
            .field("a", fields::int())
            .field("b", fields::int()),
    );
    assert_eq!(t.field_names(), ["b", "a"]);
    assert_eq!(t.ofields().iter().collect::<Vec<_>>(), ["c"]);
}

#[test]
fn it_should_reject_fields_missing_from_the_template() {
    let bp = Problem::new("<<a>>")
        .field("a", fields::int())
        .field("b", fields::int())
        .build();
    let err = FieldTree::instantiate(&bp, Config::shared_default()).err().expect("ill posed");
    assert_eq!(err.to_string(), "Missing input field 'b' in template.");
}

#[test]
fn it_should_reject_repeated_input_placeholders() {
    let bp = Problem::new("<<a>> <<a>>").field("a", fields::int()).build();
    assert!(FieldTree::instantiate(&bp, Config::shared_default()).is_err());
}

#[test]
fn it_should_parse_widget_text_through_the_field_type() {
    let mut t = division();
    let widget = t.field_widgets("q")[0];
    t.set_widget_text(widget, Some("3".to_string())).expect("widget");
    assert_eq!(t.get("q", Slot::Value).expect("get"), Some(Value::Int(3)));
    assert_eq!(t.widget_valid(widget), Some(true));

    t.set_widget_text(widget, Some("three".to_string())).expect("widget");
    assert_eq!(t.widget_valid(widget), Some(false));
    assert!(matches!(
        t.get("q", Slot::Value),
        Err(RopeError::Validation(_))
    ));
    assert_eq!(t.answers()["q"], None);
}

#[test]
fn it_should_report_validation_failures_as_events() {
    let mut t = division();
    t.set_notifications(true);
    let widget = t.field_widgets("q")[0];
    t.set_widget_text(widget, Some("1.5".to_string())).expect("widget");
    let events = t.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        FieldEvent::ValidationFailed { widget: w, .. } if *w == widget
    )));
    assert!(t.drain_events().is_empty());
}

#[test]
fn it_should_round_trip_elementwise_fractions() {
    let mut t = tree(Problem::new("<<q>>").field("q", fields::rational()));
    let widgets = t.field_widgets("q");
    assert_eq!(widgets.len(), 2);
    t.set_widget_text(widgets[0], Some("3".to_string())).expect("a");
    t.set_widget_text(widgets[1], Some("2".to_string())).expect("b");
    assert_eq!(
        t.get("q", Slot::Value).expect("get"),
        Some(Value::Rational(Rational64::new(3, 2)))
    );

    t.set("q", Slot::Value, Some(Value::Rational(Rational64::new(3, 2))))
        .expect("set");
    assert_eq!(
        t.widget_value(widgets[0]),
        Some(&Answer::Parsed(Value::Int(3)))
    );
    assert_eq!(
        t.widget_value(widgets[1]),
        Some(&Answer::Parsed(Value::Int(2)))
    );
}

#[test]
fn it_should_flag_zero_denominators() {
    let mut t = tree(Problem::new("<<q>>").field("q", fields::rational()));
    let widgets = t.field_widgets("q");
    t.set_widget_text(widgets[0], Some("1".to_string())).expect("a");
    t.set_widget_text(widgets[1], Some("0".to_string())).expect("b");
    assert!(t.validation_error("q").is_some());
}

#[test]
fn it_should_score_composites_as_one_unit() {
    let mut t = tree(Problem::new("<<z>>").field("z", fields::complex()));
    let z = Value::Complex(Complex64::new(1.0, 2.0));
    t.set("z", Slot::TheSolution, Some(z.clone())).expect("solution");
    assert_eq!(t.auto_max_score("z").expect("max"), 1.0);

    t.set("z", Slot::Value, Some(z)).expect("answer");
    assert_eq!(t.auto_score("z").expect("score"), 1.0);
    assert_eq!(t.correct("z"), Some(true));

    let widgets = t.field_widgets("z");
    t.set_widget_text(widgets[1], Some("3".to_string())).expect("imag");
    assert_eq!(t.auto_score("z").expect("score"), 0.0);
    assert_eq!(t.correct("z"), Some(false));
}

#[test]
fn it_should_refuse_contradicting_solutions() {
    let mut t = division();
    t.set("q", Slot::TheSolution, Some(Value::Int(3))).expect("the");
    let err = t
        .set("q", Slot::ASolution, Some(Value::Int(4)))
        .expect_err("contradiction");
    assert!(err.is_ill_posed());
    assert_eq!(err.to_string(), "Contradicting solutions for input field q.");
}

#[test]
fn it_should_need_solutions_for_automatic_scores() {
    let mut t = division();
    let err = t.auto_max_score("q").expect_err("no solution");
    assert_eq!(
        err.to_string(),
        "Automatic setting of maximal score for q needs a sample solution."
    );
    t.set("q", Slot::ASolution, Some(Value::Int(3))).expect("a");
    assert!(t.auto_max_score("q").is_ok());
    let err = t.auto_score("q").expect_err("not unique");
    assert_eq!(
        err.to_string(),
        "Automatic scoring for q needs a unique sample solution."
    );
}

#[test]
fn it_should_show_composite_scores_on_the_last_widget() {
    let mut t = tree(Problem::new("<<z>>").field("z", fields::complex()));
    t.set_displayed_score("z", Some(0.75)).expect("score");
    let widgets = t.field_widgets("z");
    assert_eq!(t.displayed_score(widgets[0]), None);
    assert_relative_eq!(t.displayed_score(widgets[1]).expect("shown"), 0.8);
}

#[test]
fn it_should_render_widgets_as_identifiers() {
    let t = division();
    let rendered = t.render_template().expect("render");
    let q = t.field_widgets("q")[0];
    assert!(rendered.contains(&format!("<<#{q}>>")));
    assert!(rendered.starts_with("<<dividend>> / <<divisor>> = "));
}

#[test]
fn it_should_describe_widgets_by_their_field() {
    let t = tree(Problem::new("<<n>>").field("n", fields::int_range(Some(1), Some(6))));
    let widget = t.widgets()[0];
    assert_eq!(
        t.widget_info(widget).as_deref(),
        Some("an integer between 1 and 6")
    );
    assert_eq!(t.widget_field(widget), Some("n"));
    assert_eq!(t.widget(widget).map(|w| w.name()), Some("Slider"));
}

#[test]
fn it_should_average_field_comparisons_for_the_problem() {
    let t = division();
    let dict = |q: i64, r: i64| {
        Value::Dict(vec![
            (Value::text("q"), Value::Int(q)),
            (Value::text("r"), Value::Int(r)),
        ])
    };
    assert_eq!(t.compare_problem(&dict(3, 1), &dict(3, 1)), 1.0);
    assert_relative_eq!(t.compare_problem(&dict(3, 0), &dict(3, 1)), 0.5);
}

#[test]
fn it_should_start_checkboxes_with_a_value() {
    let t = tree(Problem::new("<<b>>").field("b", fields::boolean()));
    assert_eq!(t.get("b", Slot::Value).expect("get"), Some(Value::Bool(false)));
}

#[test]
fn it_should_settle_choice_widgets_with_the_tree_config() {
    let problem = || Problem::new("<<n>>").field("n", fields::one_of([1, 2, 3].map(Value::Int)));
    let config = Arc::new(Config {
        one_of_maximum_radio_buttons: 2,
        ..Config::default()
    });
    let narrow = FieldTree::instantiate(&problem().build(), config).expect("instantiate");
    let widget = narrow.field_widgets("n")[0];
    assert_eq!(narrow.widget(widget).map(|w| w.name()), Some("Dropdown"));

    let wide = tree(problem());
    let widget = wide.field_widgets("n")[0];
    assert_eq!(wide.widget(widget).map(|w| w.name()), Some("RadioButtons"));
}
