//! Stage 5: short, empathetic customer-facing reply.

pub const REPLY_TEMPLATE: &str = r#"Using the chosen category and the extracted details, produce a short (1-3 sentence) customer-facing response that:
- acknowledges the customer's issue,
- confirms the chosen category in plain language,
- either provides the expected next action or requests the top missing detail needed to proceed.
Keep the tone empathetic, concise, and professional. Do not include internal diagnostic notes, field names, or any mention of categories as a system concept.

Chosen category: {chosen_category}
Extracted details JSON: {details_json}

Return only the user-facing reply text."#;

pub fn reply_prompt(chosen_category: &str, details_json: &str) -> String {
    super::render(
        REPLY_TEMPLATE,
        &[
            ("chosen_category", chosen_category),
            ("details_json", details_json),
        ],
    )
}
