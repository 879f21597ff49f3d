//! Operations on introspected field parameters: `.env` template rendering
//! and JSON export.

use crate::tags::FieldParams;

/// Render a `.env`-style template, one block per field.
///
/// Each entry is `KEY=<default>`, preceded by a comment listing the field's
/// options when it has any:
///
/// ```text
/// # required, notEmpty
/// APP_NAME=
///
/// PORT=8080
/// ```
pub fn env_template(params: &[FieldParams]) -> String {
    let mut out = String::new();
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let flags = flags(p);
        if !flags.is_empty() {
            out.push_str("# ");
            out.push_str(&flags.join(", "));
            out.push('\n');
        }
        out.push_str(&p.key);
        out.push('=');
        out.push_str(p.default_value.as_deref().unwrap_or(""));
        out.push('\n');
    }
    out
}

/// Field parameters as pretty-printed JSON.
pub fn params_json(params: &[FieldParams]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(params)
}

fn flags(p: &FieldParams) -> Vec<&'static str> {
    [
        (p.required, "required"),
        (p.not_empty, "notEmpty"),
        (p.load_file, "file"),
        (p.expand, "expand"),
        (p.unset, "unset"),
        (p.init, "init"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}
