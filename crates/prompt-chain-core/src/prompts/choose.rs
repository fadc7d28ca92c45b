//! Stage 3: exactly one label, with the actionability tie-break spelled out.

use crate::category::Category;

pub const CHOOSE_TEMPLATE: &str = r#"Using the concise intent sentence and the candidate categories (with justifications) below, select the single best category from the allowed set:
[{category_set}]

Output exactly one category name and nothing else: no explanation, no punctuation, no quotes.
If multiple categories are equally suitable, prefer the one that enables the fastest resolution by customer support (the most directly actionable): {tie_break}.

Concise intent:
"""{intent}"""

Candidates (JSON array, most to least likely, with one-line justifications):
{candidates_json}"#;

/// Priority order as prompt text, e.g. `Account Access > Transaction Inquiry > Billing Issue > others`.
pub fn tie_break_rule() -> String {
    let mut parts: Vec<&str> = Category::TIE_BREAK_ORDER.iter().map(|c| c.label()).collect();
    parts.push("others");
    parts.join(" > ")
}

pub fn choose_prompt(intent: &str, candidates_json: &str) -> String {
    super::render(
        CHOOSE_TEMPLATE,
        &[
            ("category_set", Category::closed_set_list().as_str()),
            ("tie_break", tie_break_rule().as_str()),
            ("intent", intent),
            ("candidates_json", candidates_json),
        ],
    )
}
