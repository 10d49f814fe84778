use std::sync::Arc;

use approx::assert_relative_eq;
use indexmap::IndexMap;

use rope_api_core::error::RopeError;
use rope_api_core::Value;
use rope_field_core::{fields, Problem};

use super::*;
use crate::callback::Signature;
use crate::exercise::Weights;
use crate::outputs::{ScoreOutput, SolutionOutput};
use crate::samples;

fn attempt(exercise: Exercise) -> ParametrizedExercise {
    ParametrizedExercise::new(Arc::new(exercise)).with_seed(11)
}

fn answers<const N: usize>(pairs: [(&str, Option<Value>); N]) -> Answers {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn ill_posed(err: RopeError) -> String {
    match err {
        RopeError::IllPosed(err) => err.0,
        other => panic!("expected an authoring error, got {other:?}"),
    }
}

/// 7 divided by 2, with fixed parameters.
fn seven_by_two() -> Exercise {
    Exercise::new("SevenByTwo", Signature::default(), |_| {
        Ok(Problem::new("<<dividend>> / <<divisor>> = <<quotient>> r <<remainder>>")
            .field("quotient", fields::int())
            .field("remainder", fields::int()))
    })
    .with_parameters(Signature::default(), |_, _| {
        Ok(IndexMap::from([
            ("dividend".to_string(), Value::Int(7)),
            ("divisor".to_string(), Value::Int(2)),
        ]))
    })
    .with_the_solution(["dividend", "divisor"], |args| {
        let (a, b) = (args.int("dividend")?, args.int("divisor")?);
        Ok(SolutionOutput::fields([
            ("quotient", Value::Int(a / b)),
            ("remainder", Value::Int(a % b)),
        ]))
    })
}

fn single_int(name: &'static str) -> Exercise {
    Exercise::new(name, Signature::default(), |_| {
        Ok(Problem::new("<<x>>").field("x", fields::int()))
    })
}

#[test]
fn it_should_score_the_division_scenario() {
    let mut pe = attempt(seven_by_two());
    assert!(pe.template().expect("template").contains("<<dividend>>"));
    let max = pe.max_scores().expect("max scores");
    assert_eq!(max["quotient"], Some(1.0));
    assert_eq!(max["remainder"], Some(1.0));
    assert_relative_eq!(pe.max_total_score().expect("max"), 2.0);

    pe.set_answers(&answers([
        ("quotient", Some(Value::Int(3))),
        ("remainder", Some(Value::Int(1))),
    ]))
    .expect("answers");
    let scores = pe.scores().expect("scores");
    assert_eq!(scores["quotient"], Some(1.0));
    assert_eq!(scores["remainder"], Some(1.0));
    assert_relative_eq!(pe.total_score().expect("total"), 2.0);

    pe.set_answers(&answers([("quotient", None), ("remainder", None)]))
        .expect("answers");
    assert_eq!(pe.scores().expect("scores")["quotient"], Some(0.0));
    assert_relative_eq!(pe.total_score().expect("total"), 0.0);
}

#[test]
fn it_should_memoize_every_stage() {
    let mut pe = attempt(samples::integer_division());
    let params = pe.parameters().expect("parameters");
    let solution = pe.solution().expect("solution");
    let max = pe.max_total_score().expect("max");
    let scores = pe.scores().expect("scores");
    for _ in 0..3 {
        assert_eq!(pe.parameters().expect("parameters"), params);
        assert_eq!(pe.solution().expect("solution"), solution);
        assert_eq!(pe.max_total_score().expect("max"), max);
        assert_eq!(pe.scores().expect("scores"), scores);
    }
}

#[test]
fn it_should_keep_the_maximal_total_score_across_runs() {
    let exercise = Arc::new(samples::integer_division());
    let expected = ParametrizedExercise::new(Arc::clone(&exercise))
        .max_total_score()
        .expect("max");
    for seed in 0..32 {
        let mut pe = ParametrizedExercise::new(Arc::clone(&exercise)).with_seed(seed);
        assert_eq!(pe.max_total_score().expect("max"), expected);
    }
}

#[test]
fn it_should_derive_implicit_solutions() {
    let mut pe = attempt(samples::square_root());
    let root = pe.parameters().expect("parameters")["root"].clone();
    assert_eq!(pe.the_solution().expect("solution")["root_"], Some(root));
}

#[test]
fn it_should_prefer_explicit_solutions() {
    let exercise = Exercise::new("Explicit", Signature::default(), |_| {
        Ok(Problem::new("<<x_>>").field("x_", fields::int()))
    })
    .with_parameters(Signature::default(), |_, _| {
        Ok(IndexMap::from([("x".to_string(), Value::Int(5))]))
    })
    .with_the_solution(Signature::default(), |_| Ok(6i64));
    let mut pe = attempt(exercise);
    assert_eq!(pe.solution().expect("solution")["x_"], Some(Value::Int(6)));
}

#[test]
fn it_should_reject_a_bare_solution_for_several_fields() {
    let exercise = Exercise::new("Two", Signature::default(), |_| {
        Ok(Problem::new("<<a>> <<b>>")
            .field("a", fields::int())
            .field("b", fields::int()))
    })
    .with_the_solution(Signature::default(), |_| Ok(1i64));
    let err = attempt(exercise).the_solution().expect_err("ill posed");
    assert_eq!(
        ill_posed(err),
        "Unless there is only a single input field, the solution must be a dictionary."
    );
}

#[test]
fn it_should_reject_solutions_for_unknown_fields() {
    let exercise = single_int("Unknown").with_the_solution(Signature::default(), |_| {
        Ok(SolutionOutput::fields([("y", Value::Int(1))]))
    });
    let err = attempt(exercise).solution().expect_err("ill posed");
    assert_eq!(ill_posed(err), "Unknown input field 'y'.");
}

#[test]
fn it_should_report_invalid_sample_solutions_as_authoring_errors() {
    let exercise = Exercise::new("Bounded", Signature::default(), |_| {
        Ok(Problem::new("<<x>>").field("x", fields::natural(false)))
    })
    .with_the_solution(Signature::default(), |_| Ok(-4i64));
    let err = attempt(exercise).solution().expect_err("ill posed");
    assert!(ill_posed(err).starts_with("Invalid sample solution for input field 'x'"));
}

#[test]
fn it_should_require_parameters_for_output_fields() {
    let exercise = Exercise::new("Unresolved", Signature::default(), |_| {
        Ok(Problem::new("<<n>> + 1 = <<x>>").field("x", fields::int()))
    });
    let err = attempt(exercise).field_names().expect_err("ill posed");
    assert_eq!(ill_posed(err), "No parameter for output field 'n'.");
}

#[test]
fn it_should_require_declared_callback_parameters() {
    let exercise = Exercise::new("Undeclared", ["n"], |_| {
        Ok(Problem::new("<<x>>").field("x", fields::int()))
    });
    let err = attempt(exercise).tree().err().expect("ill posed");
    assert_eq!(ill_posed(err), "Missing parameter: n.");
}

#[test]
fn it_should_propagate_callback_failures() {
    let exercise = single_int("Failing")
        .with_the_solution(Signature::default(), |_| Ok(1i64))
        .with_scores(Signature::default(), |_| -> anyhow::Result<f64> {
            Err(anyhow::anyhow!("division by zero"))
        });
    let err = attempt(exercise).max_total_score().expect_err("callback error");
    assert!(matches!(err, RopeError::Callback(_)));
}

#[test]
fn it_should_weight_per_field_scores() {
    let mut pe = attempt(samples::multiplication_table());
    assert_eq!(pe.max_scores().expect("max")["c"], Some(2.0));
    let solution = pe.solution().expect("solution");
    pe.set_answers(&solution).expect("answers");
    assert_eq!(pe.total_score().expect("total"), 2.0);
    pe.set_answers(&answers([("c", Some(Value::Int(0)))]))
        .expect("answers");
    assert_eq!(pe.total_score().expect("total"), 0.0);
}

#[test]
fn it_should_weight_automatic_scores_uniformly() {
    let mut pe = attempt(seven_by_two().with_weights(Weights::Uniform(3.0)));
    assert_relative_eq!(pe.max_total_score().expect("max"), 6.0);
}

#[test]
fn it_should_reject_weights_for_unknown_fields() {
    let exercise = seven_by_two().with_weights(Weights::PerField(IndexMap::from([(
        "quotent".to_string(),
        2.0,
    )])));
    let err = attempt(exercise).max_total_score().expect_err("ill posed");
    assert_eq!(
        ill_posed(err),
        "All keys of 'weights' have to match an input field. There is no input field 'quotent'."
    );
}

#[test]
fn it_should_take_a_score_pair_as_it_is() {
    let exercise = single_int("Pair")
        .with_weights(Weights::Uniform(10.0))
        .with_scores(["x"], |args| {
            Ok(ScoreOutput::Pair(if args.int("x")? == 1 { 2.0 } else { 0.0 }, 4.0))
        });
    let mut pe = attempt(exercise);
    assert_eq!(pe.max_total_score().expect("max"), 4.0);
    pe.set_answers(&answers([("x", Some(Value::Int(1)))]))
        .expect("answers");
    assert_eq!(pe.total_score().expect("total"), 2.0);
    assert_eq!(pe.scores().expect("scores")["x"], Some(2.0));
}

#[test]
fn it_should_need_a_solution_for_a_total_score() {
    let exercise = single_int("Unsolved").with_scores(["x"], |args| Ok(args.int("x")? == 2));
    let err = attempt(exercise).max_total_score().expect_err("ill posed");
    assert_eq!(
        ill_posed(err),
        "Unable to determine maximal score for input field 'x'."
    );
}

#[test]
fn it_should_reject_a_changing_score_shape() {
    let exercise = single_int("Shifty")
        .with_the_solution(Signature::default(), |_| Ok(5i64))
        .with_scores(["x"], |args| {
            Ok(if args.int("x")? == 5 {
                ScoreOutput::fields([("x", 1.0)])
            } else {
                ScoreOutput::Total(0.0)
            })
        });
    let err = attempt(exercise).max_total_score().expect_err("ill posed");
    assert!(ill_posed(err).starts_with("If implemented, the score method must return"));
}

#[test]
fn it_should_reject_a_score_shape_that_changes_with_the_answers() {
    let exercise = single_int("Moody")
        .with_the_solution(Signature::default(), |_| Ok(5i64))
        .with_scores(["x"], |args| {
            Ok(if args.int("x")? == 4 {
                ScoreOutput::Total(0.0)
            } else {
                ScoreOutput::fields([("x", 1.0)])
            })
        });
    let mut pe = attempt(exercise);
    assert_eq!(pe.max_total_score().expect("max"), 1.0);
    pe.set_answers(&answers([("x", Some(Value::Int(4)))]))
        .expect("answers");
    let err = pe.total_score().expect_err("ill posed");
    assert!(ill_posed(err).starts_with("If implemented, the score method must return"));
}

#[test]
fn it_should_never_reward_empty_answers() {
    let mut pe = attempt(samples::factor());
    assert_eq!(pe.max_total_score().expect("max"), 1.0);
    pe.set_answers(&answers([("answer", None)])).expect("answers");
    assert_eq!(pe.scores().expect("scores")["answer"], Some(0.0));
    assert_eq!(pe.total_score().expect("total"), 0.0);
    pe.set_answers(&answers([("answer", Some(Value::Int(6)))]))
        .expect("answers");
    assert_eq!(pe.total_score().expect("total"), 1.0);
}

#[test]
fn it_should_score_expected_empty_answers() {
    let exercise = Exercise::new("Empty", Signature::default(), |_| {
        Ok(Problem::new("<<x>>").field("x", fields::int().treat_none_manually(true)))
    })
    .with_the_solution(Signature::default(), |_| {
        Ok(SolutionOutput::fields([("x", None::<Value>)]))
    });
    let mut pe = attempt(exercise);
    assert_eq!(pe.none_solution_fields().expect("none"), ["x"]);
    assert_eq!(pe.max_total_score().expect("max"), 1.0);
    pe.set_answers(&answers([("x", None)])).expect("answers");
    assert_eq!(pe.total_score().expect("total"), 1.0);
    pe.set_answers(&answers([("x", Some(Value::Int(3)))]))
        .expect("answers");
    assert_eq!(pe.total_score().expect("total"), 0.0);
}

#[test]
fn it_should_count_every_widget_of_an_expected_empty_field() {
    let exercise = Exercise::new("MaybeAFraction", Signature::default(), |_| {
        Ok(Problem::new("<<q>>").field("q", fields::rational().treat_none_manually(true)))
    })
    .with_weights(Weights::Uniform(2.0))
    .with_the_solution(Signature::default(), |_| {
        Ok(SolutionOutput::fields([("q", None::<Value>)]))
    });
    let mut pe = attempt(exercise);
    assert_eq!(pe.widgets().expect("widgets").len(), 2);
    assert_eq!(pe.max_scores().expect("max")["q"], Some(4.0));
    pe.set_answers(&answers([("q", None)])).expect("answers");
    assert_eq!(pe.total_score().expect("total"), 4.0);
}

#[test]
fn it_should_leave_empty_text_solutions_unset() {
    let exercise = Exercise::new("Blank", Signature::default(), |_| {
        Ok(Problem::new("<<s>>").field("s", fields::string()))
    })
    .with_the_solution(Signature::default(), |_| Ok(Value::text("")));
    let mut pe = attempt(exercise);
    assert_eq!(pe.solution().expect("solution")["s"], None);
    assert!(pe.none_solution_fields().expect("none").is_empty());
}

#[test]
fn it_should_pick_choice_widgets_from_the_attempt_config() {
    let exercise = Arc::new(Exercise::new("Pick", Signature::default(), |_| {
        Ok(Problem::new("<<n>>").field("n", fields::one_of([1, 2, 3].map(Value::Int))))
    }));
    let narrow = Arc::new(Config {
        one_of_maximum_radio_buttons: 2,
        ..Config::default()
    });
    let mut pe = ParametrizedExercise::new(exercise.clone()).with_config(narrow);
    let widget = pe.widgets().expect("widgets")[0];
    let tree = pe.tree().expect("tree");
    assert_eq!(tree.widget(widget).map(|w| w.name()), Some("Dropdown"));

    let mut pe = ParametrizedExercise::new(exercise);
    let widget = pe.widgets().expect("widgets")[0];
    let tree = pe.tree().expect("tree");
    assert_eq!(tree.widget(widget).map(|w| w.name()), Some("RadioButtons"));
}

#[test]
fn it_should_mark_correct_fields() {
    let mut pe = attempt(seven_by_two());
    pe.set_answers(&answers([
        ("quotient", Some(Value::Int(3))),
        ("remainder", Some(Value::Int(0))),
    ]))
    .expect("answers");
    let correct = pe.correct().expect("correct");
    assert_eq!(correct["quotient"], Some(true));
    assert_eq!(correct["remainder"], Some(false));
}

#[test]
fn it_should_isolate_attempts_of_one_exercise() {
    let exercise = Arc::new(seven_by_two());
    let mut first = ParametrizedExercise::new(Arc::clone(&exercise));
    let mut second = ParametrizedExercise::new(Arc::clone(&exercise));
    first
        .set_answers(&answers([("quotient", Some(Value::Int(3)))]))
        .expect("answers");
    assert_eq!(second.answers().expect("answers")["quotient"], None);
    assert_ne!(
        first.widgets().expect("widgets"),
        second.widgets().expect("widgets")
    );
}

#[test]
fn it_should_validate_the_difficulty() {
    let err = attempt(seven_by_two())
        .with_difficulty(1.5)
        .parameters()
        .expect_err("ill posed");
    assert_eq!(ill_posed(err), "'difficulty' has to be a number in [0, 1], got 1.5.");

    let err = attempt(seven_by_two().with_difficulty_range(Some(0.8), Some(0.2)))
        .parameters()
        .expect_err("ill posed");
    assert!(ill_posed(err).contains("must not exceed"));
}

#[test]
fn it_should_hand_the_difficulty_to_the_parameters() {
    let exercise = single_int("Graded").with_parameters(
        Signature::default().with_default("difficulty", Value::Real(0.0)),
        |args, _| Ok(IndexMap::from([("level".to_string(), args.value("difficulty")?)])),
    );
    let mut pe = attempt(exercise).with_difficulty(0.25);
    assert_eq!(pe.parameters().expect("parameters")["level"], Value::Real(0.25));
}

#[test]
fn it_should_collect_hints() {
    let exercise = single_int("Hinted").with_hints(Signature::default(), |_| Ok("Count."));
    assert_eq!(attempt(exercise).hints().expect("hints"), ["Count."]);
}

#[test]
fn it_should_generate_candidate_inputs() {
    let mut pe = attempt(seven_by_two());
    // empty, trivial 0, dummy 1 and the solution per field
    let generator = pe.input_generator().expect("inputs");
    assert_eq!(generator.combinations(), 4 * 3);
    for input in generator {
        pe.set_answers(&input).expect("answers");
        let total = pe.total_score().expect("total");
        assert!((0.0..=2.0).contains(&total));
    }
}

#[test]
fn it_should_summarize_the_attempt() {
    let mut pe = attempt(samples::apples());
    pe.set_answers(&answers([("number", Some(Value::Int(3)))]))
        .expect("answers");
    let summary = pe.summary().expect("summary");
    assert_eq!(summary.name, "Apples");
    assert!(summary.id.is_some());
    assert_eq!(summary.total_score, 1.0);
    assert_eq!(summary.correct["number"], Some(true));
    let json = serde_json::to_value(&summary).expect("json");
    assert_eq!(json["max_total_score"], 1.0);
}
