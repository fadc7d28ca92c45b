//! Values handed from stage to stage. All are immutable once built.

use crate::category::{most_actionable, Category};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Most candidates Stage 2 may hand to Stage 3.
pub const MAX_CANDIDATES: usize = 3;

/// Justification attached to the Stage 2 fallback candidate.
pub const FALLBACK_JUSTIFICATION: &str = "<decoder could not parse model output>";

/// Sentinel placed in `missing_fields` when Stage 4 output could not be decoded.
pub const PARSE_ERROR_FIELD: &str = "parse_error";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("customer query must not be empty")]
    Empty,
}

/// Free-text customer query; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerQuery(String);

impl CustomerQuery {
    pub fn new(text: impl Into<String>) -> Result<Self, QueryError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! text_artifact {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub(crate) fn new(text: impl Into<String>) -> Self {
                Self(text.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_artifact!(
    /// One-sentence statement of what the customer wants (Stage 1).
    IntentSummary
);
text_artifact!(
    /// Customer-facing reply (Stage 5).
    CustomerReply
);

impl fmt::Display for CustomerQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCandidate {
    pub category: Category,
    pub justification: String,
}

impl CategoryCandidate {
    /// Substitute used when a candidate (or the whole list) cannot be decoded.
    pub fn fallback() -> Self {
        Self {
            category: Category::GeneralInformation,
            justification: FALLBACK_JUSTIFICATION.to_string(),
        }
    }
}

/// Ranked candidates, most likely first.
pub type CategoryCandidateList = Vec<CategoryCandidate>;

/// Stage 2 fallback: a single General Information candidate.
pub fn fallback_candidates() -> CategoryCandidateList {
    vec![CategoryCandidate::fallback()]
}

#[derive(Deserialize)]
pub(crate) struct RawCandidate {
    category: String,
    #[serde(default)]
    justification: String,
}

/// Turn a decoded array into a candidate list: labels outside the closed set become the
/// fallback candidate, repeats of an already listed category are dropped, rank order is kept
/// and the list is capped at [`MAX_CANDIDATES`]. Returns the list and whether anything was
/// substituted.
pub(crate) fn validate_candidates(raw: Vec<RawCandidate>) -> (CategoryCandidateList, bool) {
    let mut substituted = false;
    let mut out: CategoryCandidateList = Vec::with_capacity(MAX_CANDIDATES);
    for item in raw {
        let candidate = match Category::from_label(&item.category) {
            Some(category) => CategoryCandidate {
                category,
                justification: item.justification.trim().to_string(),
            },
            None => {
                tracing::warn!(label = %item.category, "candidate outside closed category set");
                substituted = true;
                CategoryCandidate::fallback()
            }
        };
        if out.iter().any(|c| c.category == candidate.category) {
            continue;
        }
        out.push(candidate);
        if out.len() == MAX_CANDIDATES {
            break;
        }
    }
    (out, substituted)
}

/// Stage 3 output: a validated label plus the model's raw answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChosenCategory {
    category: Category,
    raw: String,
}

impl ChosenCategory {
    pub fn new(category: Category, raw: impl Into<String>) -> Self {
        Self {
            category,
            raw: raw.into(),
        }
    }

    /// Resolve free text into exactly one label. An exact label is taken as is. A bare list
    /// of labels (`Billing Issue, Account Access`) is settled by the tie-break priority. Any
    /// other text resolves to the first label it mentions, or General Information if it
    /// mentions none. The flag is true whenever the text was not an exact label.
    pub fn resolve(raw: &str) -> (Self, bool) {
        let trimmed = raw.trim();
        if let Some(c) = Category::from_label(trimmed) {
            return (Self::new(c, trimmed), false);
        }
        let category = match Category::label_list(trimmed) {
            Some(tied) => most_actionable(tied),
            None => Category::mentioned_in(trimmed).first().copied(),
        }
        .unwrap_or(Category::GeneralInformation);
        (Self::new(category, trimmed), true)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    /// Model text this choice was resolved from.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ChosenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedDetails {
    pub found_fields: BTreeMap<String, String>,
    pub missing_fields: Vec<String>,
}

impl ExtractedDetails {
    /// Stage 4 fallback: nothing found, `missing_fields = ["parse_error"]`.
    pub fn fallback() -> Self {
        Self {
            found_fields: BTreeMap::new(),
            missing_fields: vec![PARSE_ERROR_FIELD.to_string()],
        }
    }

    /// First missing field, the one a reply should ask for.
    pub fn top_missing(&self) -> Option<&str> {
        self.missing_fields.first().map(String::as_str)
    }

    /// Validate a decoded JSON object. Accepts the nested form
    /// `{"found_fields": {...}, "missing_fields": [...]}` and the flat form where every key
    /// other than `missing_fields` is a found field. Scalar values are kept as strings, nulls
    /// are skipped; nested objects/arrays or non-string missing entries reject the whole value.
    pub(crate) fn from_json_object(mut obj: Map<String, Value>) -> Option<Self> {
        let missing_fields = match obj.remove("missing_fields") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?,
            Some(_) => return None,
        };

        let fields = match obj.remove("found_fields") {
            Some(Value::Object(found)) => found,
            Some(_) => return None,
            None => obj,
        };

        let mut found_fields = BTreeMap::new();
        for (key, value) in fields {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => return None,
            };
            found_fields.insert(key, text);
        }

        Some(Self {
            found_fields,
            missing_fields,
        })
    }
}

/// Snapshot of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    intent: IntentSummary,
    candidates: CategoryCandidateList,
    chosen: ChosenCategory,
    details: ExtractedDetails,
    reply: CustomerReply,
}

impl PipelineResult {
    pub(crate) fn new(
        intent: IntentSummary,
        candidates: CategoryCandidateList,
        chosen: ChosenCategory,
        details: ExtractedDetails,
        reply: CustomerReply,
    ) -> Self {
        Self {
            intent,
            candidates,
            chosen,
            details,
            reply,
        }
    }

    pub fn intent(&self) -> &IntentSummary {
        &self.intent
    }

    pub fn candidates(&self) -> &[CategoryCandidate] {
        &self.candidates
    }

    pub fn chosen(&self) -> &ChosenCategory {
        &self.chosen
    }

    pub fn details(&self) -> &ExtractedDetails {
        &self.details
    }

    pub fn reply(&self) -> &CustomerReply {
        &self.reply
    }

    pub fn into_parts(
        self,
    ) -> (
        IntentSummary,
        CategoryCandidateList,
        ChosenCategory,
        ExtractedDetails,
        CustomerReply,
    ) {
        (
            self.intent,
            self.candidates,
            self.chosen,
            self.details,
            self.reply,
        )
    }
}
