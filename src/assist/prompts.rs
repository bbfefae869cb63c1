//! Prompt Templates
//!
//! Prompts for single-field suggestions and multi-field autofill.

use crate::providers::FormContext;

/// Instructions appended to every suggestion prompt
pub const SUGGESTION_RULES: &str = r#"Reply with ONLY the suggested value for this field.
- No explanation, no labels, no surrounding quotes
- Keep the user's intent; complete or correct what they typed
- If the current value is already good, repeat it unchanged"#;

/// Instructions appended to every autofill prompt
pub const AUTOFILL_RULES: &str = r#"Reply with ONLY a JSON object.
- Use exactly the field names listed above as keys
- Every value is a realistic, plausible string for its field
- No markdown, no code fences, no commentary"#;

fn render_context(form_context: &FormContext) -> String {
    serde_json::to_string_pretty(form_context).unwrap_or_else(|_| "{}".to_string())
}

pub fn suggestion_prompt(field_name: &str, current_value: &str, form_context: &FormContext) -> String {
    format!(
        "You are helping a user fill in a form.\n\n\
         Field: {field_name}\n\
         Current value: {current_value}\n\n\
         Other form values:\n{context}\n\n\
         {rules}",
        context = render_context(form_context),
        rules = SUGGESTION_RULES,
    )
}

pub fn autofill_prompt(fields: &[String], form_context: &FormContext) -> String {
    let example = fields
        .iter()
        .map(|f| format!("  \"{}\": \"...\"", f))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "Generate realistic values for these form fields: {fields}\n\n\
         Values already entered:\n{context}\n\n\
         Expected shape:\n{{\n{example}\n}}\n\n\
         {rules}",
        fields = fields.join(", "),
        context = render_context(form_context),
        rules = AUTOFILL_RULES,
    )
}
