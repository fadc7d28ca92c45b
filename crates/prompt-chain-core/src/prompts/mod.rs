//! Prompt templates, one per stage. Wording is data; the category list and tie-break order
//! are rendered from [`crate::Category`] so prompts and validation agree.

pub mod categories;
pub mod choose;
pub mod details;
pub mod intent;
pub mod reply;

pub use categories::{categories_prompt, CATEGORIES_TEMPLATE};
pub use choose::{choose_prompt, tie_break_rule, CHOOSE_TEMPLATE};
pub use details::{details_prompt, DETAILS_TEMPLATE};
pub use intent::{intent_prompt, INTENT_TEMPLATE};
pub use reply::{reply_prompt, REPLY_TEMPLATE};

/// Fill `{name}` placeholders in one left-to-right pass. Substituted values are never
/// rescanned, so braces inside a customer query or model output stay literal. Braces that do
/// not name a variable are copied through.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = vars.iter().find(|(name, _)| {
            tail.strip_prefix(*name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
