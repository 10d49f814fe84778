use std::fmt;

use serde::{Deserialize, Serialize};

use rope_api_core::FieldId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Preamble,
    Problem,
    Feedback,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TemplateKind::Preamble => "preamble",
            TemplateKind::Problem => "problem",
            TemplateKind::Feedback => "feedback",
        })
    }
}

/// Notifications exchanged between a runner and its frontend. `sender`
/// names the exercise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    ExerciseAttribute {
        sender: String,
        name: String,
        value: serde_json::Value,
    },
    RenderTemplate {
        sender: String,
        template_type: TemplateKind,
        template: String,
    },
    CreateWidget {
        sender: String,
        widget_id: FieldId,
        widget_type: String,
    },
    ChangeWidgetAttribute {
        sender: String,
        widget_id: FieldId,
        attribute: String,
        value: serde_json::Value,
    },
    WidgetValidationError {
        sender: String,
        widget_id: FieldId,
        error: String,
    },
    WaitingForSubmission {
        sender: String,
    },
    Submit {
        sender: String,
    },
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::ExerciseAttribute {
                sender,
                name,
                value,
            } => write!(f, "{sender}: {name} set to {value}."),
            Message::RenderTemplate {
                sender,
                template_type,
                ..
            } => write!(f, "{sender}: Render {template_type}."),
            Message::CreateWidget {
                sender,
                widget_id,
                widget_type,
            } => write!(f, "{sender}: Create {widget_type} widget with ID {widget_id}."),
            Message::ChangeWidgetAttribute {
                sender,
                attribute,
                value,
                ..
            } => write!(f, "{sender}: '{attribute}' set to {value}."),
            Message::WidgetValidationError { sender, error, .. } => {
                write!(f, "{sender}: {error}")
            }
            Message::WaitingForSubmission { sender } => {
                write!(f, "{sender}: Wait for submission.")
            }
            Message::Submit { sender } => write!(f, "{sender}: Exercise submitted."),
        }
    }
}
