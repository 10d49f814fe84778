//! Field trees of rope exercises.
//!
//! A problem is declared as an immutable [`FieldBlueprint`]: a template with
//! `<<name>>` placeholders plus one typed sub-field per input placeholder.
//! [`FieldTree::instantiate`] builds fresh mutable state from it for every
//! attempt, so two attempts never share answers.

pub mod blueprint;
mod compose;
pub mod fields;
pub mod template;
pub mod tree;
pub mod widget;

pub use blueprint::{FieldBlueprint, FieldKind, Problem};
pub use template::{format_template, placeholders, Placeholder};
pub use tree::{Answer, FieldEvent, FieldTree, ShowFlag, Slot};
pub use widget::{LabelPosition, Widget, WidgetKind};
