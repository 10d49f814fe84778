//! Immutable field descriptions.
//!
//! A blueprint is plain data and can be reused freely: every
//! [`FieldTree::instantiate`](crate::FieldTree::instantiate) call builds fresh
//! state with fresh identifiers from it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rope_api_core::dtype::{DType, DictType};

use crate::widget::Widget;

/// How a node combines its sub-field values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Whole exercise body; answers assemble into a dictionary.
    Problem,
    /// Input control at a leaf.
    Widget(Widget),
    /// Exactly one sub-field holding the value unchanged.
    Single,
    /// `<<a>> + <<b>> i`
    ElementwiseComplex,
    /// `<<a>> / <<b>>`
    ElementwiseRational,
    /// `<<lhs>> = <<rhs>>`
    ElementwiseEquation,
    /// One sub-field per component, `x1` .. `xn`.
    ElementwiseVector,
    /// One coefficient sub-field per power of `symbol`, `c0` .. `cn`.
    ElementwisePolynomial { symbol: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldBlueprint {
    pub kind: FieldKind,
    pub dtype: Option<DType>,
    pub template: String,
    pub children: IndexMap<String, FieldBlueprint>,
    #[serde(default)]
    pub treat_none_manually: bool,
}

impl FieldBlueprint {
    pub fn widget(widget: Widget) -> Self {
        FieldBlueprint {
            kind: FieldKind::Widget(widget),
            dtype: None,
            template: String::new(),
            children: IndexMap::new(),
            treat_none_manually: false,
        }
    }

    /// A typed field wrapping a single sub-field.
    pub fn single(dtype: DType, child: FieldBlueprint) -> Self {
        FieldBlueprint::composite(FieldKind::Single, dtype, "<<_>>", [("_", child)])
    }

    pub fn composite<'a, I>(kind: FieldKind, dtype: DType, template: &str, children: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, FieldBlueprint)>,
    {
        FieldBlueprint {
            kind,
            dtype: Some(dtype),
            template: template.to_string(),
            children: children
                .into_iter()
                .map(|(name, child)| (name.to_string(), child))
                .collect(),
            treat_none_manually: false,
        }
    }

    /// The learner is expected to leave this field empty in some cases; the
    /// scoring callback receives `None` instead of a dummy value.
    pub fn treat_none_manually(mut self, flag: bool) -> Self {
        self.treat_none_manually = flag;
        self
    }

    /// Replace every leaf widget below this field.
    pub fn with_widget(self, widget: Widget) -> Self {
        if self.is_widget() {
            return FieldBlueprint::widget(widget);
        }
        let children = self
            .children
            .into_iter()
            .map(|(name, child)| (name, child.with_widget(widget.clone())))
            .collect();
        FieldBlueprint { children, ..self }
    }

    pub fn is_widget(&self) -> bool {
        matches!(self.kind, FieldKind::Widget(_))
    }
}

/// Builder for the top-level problem blueprint.
pub struct Problem {
    template: String,
    fields: IndexMap<String, FieldBlueprint>,
}

impl Problem {
    pub fn new(template: impl Into<String>) -> Self {
        Problem {
            template: template.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldBlueprint) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn build(self) -> FieldBlueprint {
        FieldBlueprint {
            kind: FieldKind::Problem,
            dtype: Some(DType::Dict(DictType::default())),
            template: self.template,
            children: self.fields,
            treat_none_manually: false,
        }
    }
}

impl From<Problem> for FieldBlueprint {
    fn from(problem: Problem) -> Self {
        problem.build()
    }
}
