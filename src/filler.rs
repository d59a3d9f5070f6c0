use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fields::{ControlType, FieldOption, FormField};
use crate::page::Page;
use crate::resolver::ResolvedValues;

/// Per-field outcome tally for one run. Warnings carry every skip and
/// recovered failure so the operator can see what was left untouched.
#[derive(Debug, Default)]
pub struct FillReport {
    pub attempted: usize,
    pub filled: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl FillReport {
    fn skip(&mut self, selector: &str, reason: &str) {
        warn!(selector, reason, "field skipped");
        self.skipped += 1;
        self.warnings.push(format!("{selector}: {reason}"));
    }
}

enum Applied {
    Filled,
    Skipped(String),
}

/// Apply each resolved value to its control. A field the model left out is
/// skipped; a single-field interaction failure is logged and the loop moves
/// on. Filling one field never touches another.
pub async fn fill_fields(
    page: &Page,
    fields: &[FormField],
    values: &ResolvedValues,
) -> FillReport {
    let mut report = FillReport::default();
    for field in fields {
        report.attempted += 1;
        let Some(value) = values.get(&field.selector) else {
            report.skip(&field.selector, "no value resolved");
            continue;
        };
        match apply(page, field, value).await {
            Ok(Applied::Filled) => {
                debug!(selector = %field.selector, "field filled");
                report.filled += 1;
            }
            Ok(Applied::Skipped(reason)) => report.skip(&field.selector, &reason),
            Err(e) => report.skip(&field.selector, &format!("interaction failed: {e}")),
        }
    }
    report
}

async fn apply(page: &Page, field: &FormField, value: &Value) -> Result<Applied> {
    match field.control {
        ControlType::Text | ControlType::Email | ControlType::Number => {
            page.fill_text(&field.selector, &scalar_text(value)).await?;
            Ok(Applied::Filled)
        }
        ControlType::Checkbox => {
            page.set_checked(&field.selector, truthy(value)).await?;
            Ok(Applied::Filled)
        }
        ControlType::Select => match match_option(&field.options, &scalar_text(value)) {
            Some(option) => {
                page.select_option(&field.selector, &option.value).await?;
                Ok(Applied::Filled)
            }
            None => Ok(Applied::Skipped(format!(
                "no option matches {:?}",
                scalar_text(value)
            ))),
        },
        ControlType::Radio => match match_option(&field.options, &scalar_text(value)) {
            Some(option) => {
                let selector = format!("{}[value=\"{}\"]", field.selector, option.value);
                page.click(&selector).await?;
                Ok(Applied::Filled)
            }
            None => Ok(Applied::Skipped(format!(
                "no option matches {:?}",
                scalar_text(value)
            ))),
        },
    }
}

/// Trigger the form's submit action: the submit control if one exists,
/// otherwise a programmatic submit of the first form.
pub async fn submit_form(page: &Page) -> Result<()> {
    if page
        .click("button[type='submit'], input[type='submit']")
        .await
        .is_ok()
    {
        return Ok(());
    }
    page.evaluate_void(
        r#"
        (() => {
            const form = document.forms[0];
            if (!form) throw new Error('no form on page');
            form.requestSubmit ? form.requestSubmit() : form.submit();
        })()
        "#,
    )
    .await
}

/// The literal text to enter for a scalar value; numbers keep their textual
/// representation.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A checkbox is checked for boolean true or the strings "true"/"yes",
/// case-insensitive; anything else leaves it unchecked.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"),
        _ => false,
    }
}

/// Match a resolved value against the options of a select or radio group:
/// display text first (case-insensitive), then the underlying value.
fn match_option<'a>(options: &'a [FieldOption], raw: &str) -> Option<&'a FieldOption> {
    options
        .iter()
        .find(|o| o.text.eq_ignore_ascii_case(raw))
        .or_else(|| options.iter().find(|o| o.value == raw))
        .or_else(|| options.iter().find(|o| o.value.eq_ignore_ascii_case(raw)))
}
