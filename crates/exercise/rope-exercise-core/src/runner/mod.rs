//! Session wiring between one attempt and a frontend.
//!
//! The runner announces the exercise to its observers as an ordered
//! sequence of [`Message`]s, feeds widget values coming back through
//! [`ExerciseRunner::handle`] into the attempt and, on submission, reports
//! scores and hands an [`AttemptRecord`] to the result store.

mod messages;

#[cfg(test)]
mod tests;

pub use messages::{Message, TemplateKind};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::json;
use thiserror::Error;

use rope_api_core::error::RopeError;
use rope_api_core::Value;
use rope_field_core::{FieldEvent, ShowFlag};

use crate::engine::{Answers, ParametrizedExercise};
use crate::exercise::Exercise;
use crate::record::{AttemptRecord, ResultStore};

pub type Observer = Box<dyn FnMut(&Message) + Send>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunnerState {
    Created,
    WaitingForSubmission,
    Finished,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot {step} while the runner is {state:?}")]
    OutOfOrder {
        step: &'static str,
        state: RunnerState,
    },
    #[error(transparent)]
    Rope(#[from] RopeError),
}

fn rendered(values: &Answers) -> serde_json::Value {
    serde_json::Value::Object(
        values
            .iter()
            .map(|(k, v)| (k.clone(), json!(v.as_ref().map(Value::to_string))))
            .collect(),
    )
}

pub struct ExerciseRunner {
    pexercise: ParametrizedExercise,
    debug: bool,
    user: String,
    observers: Vec<Observer>,
    store: Option<Box<dyn ResultStore>>,
    started_at: Option<DateTime<Utc>>,
    state: RunnerState,
}

impl ExerciseRunner {
    pub fn new(exercise: Arc<Exercise>) -> Self {
        Self::from_parametrized(ParametrizedExercise::new(exercise))
    }

    pub fn from_parametrized(mut pexercise: ParametrizedExercise) -> Self {
        pexercise.set_notifications(true);
        ExerciseRunner {
            pexercise,
            debug: false,
            user: "John Doe".to_string(),
            observers: Vec::new(),
            store: None,
            started_at: None,
            state: RunnerState::Created,
        }
    }

    /// Debug mode shows the solutions from the start.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn with_store(mut self, store: Box<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn register_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&Message) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn pexercise(&mut self) -> &mut ParametrizedExercise {
        &mut self.pexercise
    }

    fn sender(&self) -> String {
        self.pexercise.exercise().name().to_string()
    }

    fn notify(&mut self, msg: Message) {
        debug!("{msg}");
        for observer in &mut self.observers {
            observer(&msg);
        }
    }

    fn attribute(&mut self, name: &str, value: serde_json::Value) {
        let sender = self.sender();
        self.notify(Message::ExerciseAttribute {
            sender,
            name: name.to_string(),
            value,
        });
    }

    fn render(&mut self, template_type: TemplateKind, template: String) {
        let sender = self.sender();
        self.notify(Message::RenderTemplate {
            sender,
            template_type,
            template,
        });
    }

    /// Forward staged widget events.
    fn flush(&mut self) {
        let sender = self.sender();
        for event in self.pexercise.drain_events() {
            let msg = match event {
                FieldEvent::AttributeChanged {
                    widget,
                    attribute,
                    value,
                } => Message::ChangeWidgetAttribute {
                    sender: sender.clone(),
                    widget_id: widget,
                    attribute: attribute.to_string(),
                    value,
                },
                FieldEvent::ValidationFailed {
                    widget, message, ..
                } => Message::WidgetValidationError {
                    sender: sender.clone(),
                    widget_id: widget,
                    error: message,
                },
            };
            self.notify(msg);
        }
    }

    fn expect_state(&self, step: &'static str, state: RunnerState) -> Result<(), RunnerError> {
        if self.state == state {
            Ok(())
        } else {
            Err(RunnerError::OutOfOrder {
                step,
                state: self.state,
            })
        }
    }

    /// Announce the exercise and wait for the submission.
    pub fn run(&mut self) -> Result<(), RunnerError> {
        self.expect_state("run", RunnerState::Created)?;
        info!("{}: run", self.sender());
        let debug = self.debug;
        self.attribute("debug", json!(debug));
        let parameters: Answers = self
            .pexercise
            .parameters()?
            .into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect();
        self.attribute("parameters", rendered(&parameters));
        let hints = self.pexercise.hints()?;
        self.attribute("hints", json!(hints));
        let preamble = self.pexercise.preamble()?;
        self.render(TemplateKind::Preamble, preamble);

        let sender = self.sender();
        for widget in self.pexercise.widgets()? {
            let tree = self.pexercise.tree()?;
            let widget_type = tree
                .widget(widget)
                .map(|w| w.name().to_string())
                .unwrap_or_default();
            let attributes = tree.widget_attributes(widget);
            self.notify(Message::CreateWidget {
                sender: sender.clone(),
                widget_id: widget,
                widget_type,
            });
            for (attribute, value) in attributes {
                self.notify(Message::ChangeWidgetAttribute {
                    sender: sender.clone(),
                    widget_id: widget,
                    attribute: attribute.to_string(),
                    value,
                });
            }
        }
        // creation attributes already carry the initial state
        self.pexercise.drain_events();

        let template = self.pexercise.template()?;
        self.render(TemplateKind::Problem, template);
        if self.debug {
            self.publish_solutions()?;
        }
        self.notify(Message::WaitingForSubmission { sender });
        self.started_at = Some(Utc::now());
        self.state = RunnerState::WaitingForSubmission;
        Ok(())
    }

    fn publish_solutions(&mut self) -> Result<(), RunnerError> {
        self.pexercise.solution()?;
        self.pexercise.tree()?.set_show(ShowFlag::Solution, true);
        self.flush();
        Ok(())
    }

    /// Inbound messages: widget values and the submission.
    pub fn handle(&mut self, msg: &Message) -> Result<(), RunnerError> {
        match msg {
            Message::ChangeWidgetAttribute {
                widget_id,
                attribute,
                value,
                ..
            } if attribute == "value" => {
                self.expect_state("change an answer", RunnerState::WaitingForSubmission)?;
                let raw = match value {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(text) => Some(text.clone()),
                    other => Some(other.to_string()),
                };
                self.pexercise.set_widget_value(*widget_id, raw)?;
                self.flush();
                Ok(())
            }
            Message::Submit { .. } => self.finish(),
            _ => Ok(()),
        }
    }

    /// Report scores and feedback and persist the attempt.
    pub fn finish(&mut self) -> Result<(), RunnerError> {
        self.expect_state("submit", RunnerState::WaitingForSubmission)?;
        info!("{}: submitted", self.sender());
        if !self.debug {
            self.publish_solutions()?;
        }
        let processing = self.pexercise.config().total_score_processing;
        let answers = self.pexercise.answers()?;
        self.attribute("answers", rendered(&answers));
        let max_total = processing.apply(self.pexercise.max_total_score()?);
        self.attribute("max_total_score", json!(max_total));
        let total = processing.apply(self.pexercise.total_score()?);
        self.attribute("total_score", json!(total));
        self.pexercise.correct()?;
        let tree = self.pexercise.tree()?;
        for flag in [ShowFlag::MaxScore, ShowFlag::Score, ShowFlag::Correct] {
            tree.set_show(flag, true);
        }
        self.flush();
        let feedback = self.pexercise.feedback()?;
        self.render(TemplateKind::Feedback, feedback);
        self.state = RunnerState::Finished;
        self.persist()?;
        Ok(())
    }

    fn persist(&mut self) -> Result<(), RunnerError> {
        let Some(id) = self.pexercise.id() else {
            return Ok(());
        };
        let summary = self.pexercise.summary()?;
        let record = AttemptRecord::new(
            id,
            self.pexercise.exercise().label(),
            &self.user,
            self.started_at,
            &summary,
        );
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&record) {
                warn!("{}: attempt not stored: {err:#}", summary.name);
            }
        }
        match serde_json::to_string(&summary) {
            Ok(line) => info!(target: "rope::history", "{line}"),
            Err(err) => warn!("{}: history entry not written: {err}", summary.name),
        }
        Ok(())
    }
}
