use std::sync::{Arc, Mutex};

use serde_json::json;

use rope_api_core::FieldId;

use super::*;
use crate::record::MemoryStore;
use crate::samples;

fn observed(runner: &mut ExerciseRunner) -> Arc<Mutex<Vec<Message>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    runner.register_observer(move |msg| sink.lock().expect("observer lock").push(msg.clone()));
    seen
}

fn widget_of(messages: &[Message]) -> FieldId {
    messages
        .iter()
        .find_map(|m| match m {
            Message::CreateWidget { widget_id, .. } => Some(*widget_id),
            _ => None,
        })
        .expect("a widget")
}

#[test]
fn it_should_announce_the_exercise_in_order() {
    let mut runner = ExerciseRunner::new(Arc::new(samples::sum_equals_product()));
    let seen = observed(&mut runner);
    runner.run().expect("run");

    let messages = seen.lock().expect("lock").clone();
    let preamble = messages
        .iter()
        .position(|m| matches!(m, Message::RenderTemplate { template_type: TemplateKind::Preamble, .. }))
        .expect("preamble");
    let created = messages
        .iter()
        .position(|m| matches!(m, Message::CreateWidget { .. }))
        .expect("widget");
    let problem = messages
        .iter()
        .position(|m| matches!(m, Message::RenderTemplate { template_type: TemplateKind::Problem, .. }))
        .expect("problem");
    assert!(preamble < created && created < problem);
    assert!(matches!(messages.last(), Some(Message::WaitingForSubmission { .. })));
    assert_eq!(runner.state(), RunnerState::WaitingForSubmission);
    assert!(runner.started_at().is_some());
}

#[test]
fn it_should_reject_steps_out_of_order() {
    let mut runner = ExerciseRunner::new(Arc::new(samples::apples()));
    let err = runner.finish().expect_err("not running yet");
    assert!(matches!(
        err,
        RunnerError::OutOfOrder {
            state: RunnerState::Created,
            ..
        }
    ));
    runner.run().expect("run");
    assert!(runner.run().is_err());
}

#[test]
fn it_should_score_a_submission_and_store_the_attempt() {
    let store = MemoryStore::new();
    let mut runner = ExerciseRunner::new(Arc::new(samples::apples()))
        .with_user("Ada")
        .with_store(Box::new(store.clone()));
    let seen = observed(&mut runner);
    runner.run().expect("run");
    let widget = widget_of(&seen.lock().expect("lock"));

    runner
        .handle(&Message::ChangeWidgetAttribute {
            sender: "frontend".into(),
            widget_id: widget,
            attribute: "value".into(),
            value: json!("3"),
        })
        .expect("answer");
    runner
        .handle(&Message::Submit {
            sender: "frontend".into(),
        })
        .expect("submit");
    assert_eq!(runner.state(), RunnerState::Finished);

    let messages = seen.lock().expect("lock").clone();
    assert!(messages.iter().any(|m| matches!(
        m,
        Message::ExerciseAttribute { name, value, .. } if name == "total_score" && *value == json!(1.0)
    )));
    assert!(messages.iter().any(|m| matches!(
        m,
        Message::RenderTemplate { template_type: TemplateKind::Feedback, template, .. }
            if template.starts_with("Be honest")
    )));

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user, "Ada");
    assert_eq!(records[0].total_score, 1.0);
    assert_eq!(records[0].answers["number"].as_deref(), Some("3"));
}

#[test]
fn it_should_report_invalid_widget_text() {
    let mut runner = ExerciseRunner::new(Arc::new(samples::fourty_two()));
    let seen = observed(&mut runner);
    runner.run().expect("run");
    let widget = widget_of(&seen.lock().expect("lock"));
    seen.lock().expect("lock").clear();

    runner
        .handle(&Message::ChangeWidgetAttribute {
            sender: "frontend".into(),
            widget_id: widget,
            attribute: "value".into(),
            value: json!("forty-two"),
        })
        .expect("learner errors stay inside the session");
    let messages = seen.lock().expect("lock").clone();
    assert!(messages
        .iter()
        .any(|m| matches!(m, Message::WidgetValidationError { widget_id, .. } if *widget_id == widget)));
}

#[test]
fn it_should_publish_solutions_up_front_in_debug_mode() {
    let mut runner = ExerciseRunner::new(Arc::new(samples::fourty_two())).with_debug(true);
    let seen = observed(&mut runner);
    runner.run().expect("run");
    let messages = seen.lock().expect("lock").clone();
    assert!(messages.iter().any(|m| matches!(
        m,
        Message::ChangeWidgetAttribute { attribute, value, .. }
            if attribute == "solution" && *value == json!("42")
    )));
}
