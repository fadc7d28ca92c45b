//! Stage 2: up to three ranked candidates from the closed set, as a JSON array.

use crate::category::Category;
use crate::types::MAX_CANDIDATES;

pub const CATEGORIES_TEMPLATE: &str = r#"Given the concise intent sentence below, list up to {max_candidates} candidate categories, using labels from this allowed set exactly:
[{category_set}]

Return ONLY a JSON array ordered from most to least likely. Each element must be an object of the form {"category": "<label from the allowed set>", "justification": "<one line>"}. Do not wrap the JSON in markdown.

Concise intent sentence:
"""{intent}""""#;

pub fn categories_prompt(intent: &str) -> String {
    super::render(
        CATEGORIES_TEMPLATE,
        &[
            ("max_candidates", MAX_CANDIDATES.to_string().as_str()),
            ("category_set", Category::closed_set_list().as_str()),
            ("intent", intent),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_label_and_the_intent() {
        let p = categories_prompt("Customer reports a stolen debit card.");
        for c in Category::ALL {
            assert!(p.contains(c.label()), "missing {}", c);
        }
        assert!(p.contains("up to 3 candidate"));
        assert!(p.contains("\"\"\"Customer reports a stolen debit card.\"\"\""));
        assert!(!p.contains("{intent}") && !p.contains("{category_set}"));
    }
}
