//! `<<name>>` / `<<name:spec>>` templates.
//!
//! Lines are left-trimmed before formatting so templates can be indented in
//! source. `\<\<` and `\>\>` render as literal `<<` and `>>`.

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use rope_api_core::error::IllPosedError;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<[^>]*>>").expect("placeholder regex init failed"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub format_spec: Option<String>,
}

enum Piece<'a> {
    Literal(&'a str),
    Field(Placeholder),
}

fn pieces(template: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in PLACEHOLDER.find_iter(template) {
        if m.start() > start {
            out.push(Piece::Literal(&template[start..m.start()]));
        }
        let inner = &template[m.start() + 2..m.end() - 2];
        let (name, format_spec) = match inner.split_once(':') {
            Some((name, spec)) => (name, Some(spec.to_string())),
            None => (inner, None),
        };
        out.push(Piece::Field(Placeholder {
            name: name.to_string(),
            format_spec,
        }));
        start = m.end();
    }
    if start < template.len() {
        out.push(Piece::Literal(&template[start..]));
    }
    out
}

/// Placeholders in order of appearance.
pub fn placeholders(template: &str) -> Vec<Placeholder> {
    pieces(template)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Field(p) => Some(p),
            Piece::Literal(_) => None,
        })
        .collect()
}

fn format_field(text: &str, format_spec: Option<&str>) -> Result<String, IllPosedError> {
    match format_spec {
        None => Ok(text.to_string()),
        Some("latex") => Ok(text.trim_matches(|c| c == ' ' || c == '$').to_string()),
        Some(other) => Err(IllPosedError::new(format!(
            "Unknown format specifier \"{other}\"."
        ))),
    }
}

/// Substitute `values` into `template`. Placeholders without a value are
/// kept verbatim so a later pass can resolve them.
pub fn format_template(
    template: &str,
    values: &HashMap<String, String>,
) -> Result<String, IllPosedError> {
    let template = template
        .split('\n')
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");
    let mut out = String::with_capacity(template.len());
    for piece in pieces(&template) {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Field(p) => match values.get(&p.name) {
                Some(text) => out.push_str(&format_field(text, p.format_spec.as_deref())?),
                None => match &p.format_spec {
                    Some(spec) => out.push_str(&format!("<<{}:{spec}>>", p.name)),
                    None => out.push_str(&format!("<<{}>>", p.name)),
                },
            },
        }
    }
    Ok(out.replace(r"\<\<", "<<").replace(r"\>\>", ">>"))
}
