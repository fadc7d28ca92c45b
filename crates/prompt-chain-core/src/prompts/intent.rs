//! Stage 1: one factual sentence describing what the customer wants.

pub const INTENT_TEMPLATE: &str = r#"You are a helpful customer-support NLP assistant. Read the customer query below and produce a single concise sentence that captures the customer's primary intent or report (what the customer wants or what problem they are reporting). Keep it factual and avoid suggestions or next steps; only state the intent.

Customer query:
"""{customer_query}"""

Return only the concise intent sentence."#;

pub fn intent_prompt(customer_query: &str) -> String {
    super::render(INTENT_TEMPLATE, &[("customer_query", customer_query)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_embedded() {
        let p = intent_prompt("My card was stolen");
        assert!(p.contains("\"\"\"My card was stolen\"\"\""));
        assert!(!p.contains("{customer_query}"));
    }
}
