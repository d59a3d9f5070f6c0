use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::page::Page;

/// The interaction category of a form control. Unsupported input types
/// (tel, date, password, ...) and textareas normalize to `Text` so the
/// filler always has a literal-entry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlType {
    Text,
    Email,
    Number,
    Checkbox,
    Radio,
    Select,
}

/// One selectable option of a select element or radio group, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Visible text of the option.
    pub text: String,
    /// Underlying value attribute.
    pub value: String,
}

/// A form control discovered on the page. Radio inputs sharing a name are
/// collapsed into a single field whose options list the group's members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    /// CSS selector addressing the control (for radio groups, the group).
    pub selector: String,
    pub control: ControlType,
    /// Associated label text; empty when no label could be determined.
    pub label: String,
    /// The control's name attribute, if any.
    pub name: String,
    /// The control's placeholder attribute, if any.
    pub placeholder: String,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

/// JS walk over every input, select and textarea on the page. Invisible
/// controls and non-fillable input types are skipped; a control that cannot
/// be described is dropped rather than failing the walk.
const EXTRACT_JS: &str = r#"
    JSON.stringify((() => {
        const visible = (el) => {
            const style = window.getComputedStyle(el);
            return style.display !== 'none' && style.visibility !== 'hidden';
        };
        const labelFor = (el) => {
            if (el.id) {
                const lab = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
                if (lab) return (lab.innerText || '').trim();
            }
            const wrap = el.closest('label');
            if (wrap) return (wrap.innerText || '').trim();
            const aria = el.getAttribute('aria-label');
            if (aria) return aria.trim();
            let node = el.previousSibling;
            while (node) {
                const text = (node.textContent || '').trim();
                if (text) return text;
                node = node.previousSibling;
            }
            return '';
        };
        const selectorFor = (el) => {
            if (el.id) return '#' + CSS.escape(el.id);
            const tag = el.tagName.toLowerCase();
            if (el.name) return tag + '[name="' + el.name + '"]';
            const testId = el.getAttribute('data-testid');
            if (testId) return '[data-testid="' + testId + '"]';
            return tag;
        };
        const normalize = (t) =>
            ['email', 'number', 'checkbox', 'radio', 'select'].includes(t) ? t : 'text';

        const fields = [];
        const radioGroups = {};
        for (const el of document.querySelectorAll('input, select, textarea')) {
            try {
                if (!visible(el)) continue;
                const tag = el.tagName.toLowerCase();
                const rawType = tag === 'select' ? 'select'
                    : tag === 'textarea' ? 'textarea'
                    : (el.type || 'text');
                if (['hidden', 'submit', 'button', 'reset', 'image', 'file'].includes(rawType)) {
                    continue;
                }

                if (rawType === 'radio' && el.name) {
                    let group = radioGroups[el.name];
                    if (!group) {
                        const fieldset = el.closest('fieldset');
                        const legend = fieldset ? fieldset.querySelector('legend') : null;
                        group = {
                            selector: 'input[type="radio"][name="' + el.name + '"]',
                            control: 'radio',
                            label: legend ? (legend.innerText || '').trim() : '',
                            name: el.name,
                            placeholder: '',
                            options: [],
                        };
                        radioGroups[el.name] = group;
                        fields.push(group);
                    }
                    group.options.push({ text: labelFor(el), value: el.value });
                    continue;
                }

                const field = {
                    selector: selectorFor(el),
                    control: normalize(rawType),
                    label: labelFor(el),
                    name: el.name || '',
                    placeholder: el.placeholder || '',
                    options: [],
                };
                if (tag === 'select') {
                    field.options = Array.from(el.options).map((o) => ({
                        text: (o.label || o.text || '').trim(),
                        value: o.value,
                    }));
                }
                fields.push(field);
            } catch (e) {
                // an unreadable control is skipped, not fatal
            }
        }
        return fields;
    })())
"#;

/// Walk the loaded page and describe every fillable form control, in
/// document order. The page is not mutated.
pub async fn extract_fields(page: &Page) -> Result<Vec<FormField>> {
    let json: String = page.evaluate_value(EXTRACT_JS).await?;
    let fields: Vec<FormField> = serde_json::from_str(&json)?;
    Ok(fields)
}
