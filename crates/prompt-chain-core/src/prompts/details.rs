//! Stage 4: structured details plus the category-typical fields that are missing.

pub const DETAILS_TEMPLATE: &str = r#"Given the customer's original query and the chosen category below, extract all potentially useful structured details that a support agent would need to proceed (examples: transaction date, amount, merchant name, last 4 digits of card, card type, account number suffix, preferred contact method, branch, loan product, error message text).

Return ONLY a JSON object of the form:
{"found_fields": {"<field_name>": "<value>"}, "missing_fields": ["<field_name>"]}
where "found_fields" holds details actually present in the query and "missing_fields" lists fields commonly required for this category that were NOT found, most important first. Use snake_case field names (e.g. "card_last4"). Do not wrap the JSON in markdown.

Customer query:
"""{customer_query}"""

Chosen category:
{chosen_category}"#;

pub fn details_prompt(customer_query: &str, chosen_category: &str) -> String {
    super::render(
        DETAILS_TEMPLATE,
        &[
            ("customer_query", customer_query),
            ("chosen_category", chosen_category),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_and_category_are_embedded() {
        let p = details_prompt("Card stolen yesterday", "Card Services");
        assert!(p.contains("\"\"\"Card stolen yesterday\"\"\""));
        assert!(p.trim_end().ends_with("Card Services"));
        assert!(p.contains("missing_fields"));
    }

    #[test]
    fn braces_in_the_query_are_not_expanded() {
        let p = details_prompt("my card {chosen_category} was stolen", "Card Services");
        assert!(p.contains("\"\"\"my card {chosen_category} was stolen\"\"\""));
        assert!(p.contains(r#"{"found_fields": {"<field_name>": "<value>"}"#));
    }
}
