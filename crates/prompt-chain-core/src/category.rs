//! Closed category set shared by every category-producing stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Account Opening")]
    AccountOpening,
    #[serde(rename = "Billing Issue")]
    BillingIssue,
    #[serde(rename = "Account Access")]
    AccountAccess,
    #[serde(rename = "Transaction Inquiry")]
    TransactionInquiry,
    #[serde(rename = "Card Services")]
    CardServices,
    #[serde(rename = "Account Statement")]
    AccountStatement,
    #[serde(rename = "Loan Inquiry")]
    LoanInquiry,
    #[serde(rename = "General Information")]
    GeneralInformation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0:?}")]
pub struct UnknownCategory(pub String);

impl Category {
    /// Wire order of the closed set.
    pub const ALL: [Category; 8] = [
        Category::AccountOpening,
        Category::BillingIssue,
        Category::AccountAccess,
        Category::TransactionInquiry,
        Category::CardServices,
        Category::AccountStatement,
        Category::LoanInquiry,
        Category::GeneralInformation,
    ];

    /// Tie-break priority, most actionable first. Categories not listed rank below all of these.
    pub const TIE_BREAK_ORDER: [Category; 3] = [
        Category::AccountAccess,
        Category::TransactionInquiry,
        Category::BillingIssue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::AccountOpening => "Account Opening",
            Category::BillingIssue => "Billing Issue",
            Category::AccountAccess => "Account Access",
            Category::TransactionInquiry => "Transaction Inquiry",
            Category::CardServices => "Card Services",
            Category::AccountStatement => "Account Statement",
            Category::LoanInquiry => "Loan Inquiry",
            Category::GeneralInformation => "General Information",
        }
    }

    /// Match a label leniently: surrounding whitespace, quotes, backticks, brackets and a
    /// trailing period are ignored, as is case.
    pub fn from_label(text: &str) -> Option<Self> {
        let cleaned = text
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '[' | ']' | '.'))
            .trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(cleaned))
    }

    /// Position in [`Self::TIE_BREAK_ORDER`], `None` for the unordered rest.
    pub fn actionability_rank(self) -> Option<usize> {
        Self::TIE_BREAK_ORDER.iter().position(|c| *c == self)
    }

    /// Every label mentioned anywhere in `text`, ordered by first appearance.
    pub fn mentioned_in(text: &str) -> Vec<Category> {
        let lower = text.to_lowercase();
        let mut hits: Vec<(usize, Category)> = Self::ALL
            .into_iter()
            .filter_map(|c| lower.find(&c.label().to_lowercase()).map(|pos| (pos, c)))
            .collect();
        hits.sort_by_key(|(pos, _)| *pos);
        hits.into_iter().map(|(_, c)| c).collect()
    }

    /// Labels from text that is nothing but labels joined by `,` `/` `;` `|`, line breaks,
    /// ` or ` or ` and`. `None` as soon as any piece is not a label.
    pub fn label_list(text: &str) -> Option<Vec<Category>> {
        let joined = text
            .to_lowercase()
            .replace(" or ", ",")
            .replace(" and ", ",")
            .replace(['/', ';', '|', '\n'], ",");
        let labels = joined
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(Category::from_label)
            .collect::<Option<Vec<_>>>()?;
        (!labels.is_empty()).then_some(labels)
    }

    /// Comma-separated list of all labels, in wire order.
    pub fn closed_set_list() -> String {
        Self::ALL.map(Category::label).join(", ")
    }
}

/// Pick the most directly actionable category among equally suitable ones.
///
/// Ranked categories (Account Access > Transaction Inquiry > Billing Issue) win; among the
/// rest the first one given is kept.
pub fn most_actionable(candidates: impl IntoIterator<Item = Category>) -> Option<Category> {
    let mut best: Option<Category> = None;
    for c in candidates {
        best = match best {
            None => Some(c),
            Some(b) => match (c.actionability_rank(), b.actionability_rank()) {
                (Some(rc), Some(rb)) if rc < rb => Some(c),
                (Some(_), None) => Some(c),
                _ => Some(b),
            },
        };
    }
    best
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
