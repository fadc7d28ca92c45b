//! The five stage functions. Each makes exactly one gateway call and turns the completion
//! into the next stage's typed input. Gateway errors propagate; malformed content does not.

use crate::decoder::decode_with;
use crate::gateway::{GatewayError, ModelGateway};
use crate::prompts;
use crate::types::{
    fallback_candidates, validate_candidates, CategoryCandidate, CategoryCandidateList,
    ChosenCategory, CustomerQuery, CustomerReply, ExtractedDetails, IntentSummary, RawCandidate,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InterpretIntent,
    MapCategories,
    ChooseCategory,
    ExtractDetails,
    GenerateReply,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::InterpretIntent,
        Stage::MapCategories,
        Stage::ChooseCategory,
        Stage::ExtractDetails,
        Stage::GenerateReply,
    ];

    /// 1-based position in the chain.
    pub fn number(self) -> usize {
        match self {
            Stage::InterpretIntent => 1,
            Stage::MapCategories => 2,
            Stage::ChooseCategory => 3,
            Stage::ExtractDetails => 4,
            Stage::GenerateReply => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::InterpretIntent => "interpret_intent",
            Stage::MapCategories => "map_categories",
            Stage::ChooseCategory => "choose_category",
            Stage::ExtractDetails => "extract_details",
            Stage::GenerateReply => "generate_reply",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one stage sent and received.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub prompt: String,
    pub completion: String,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// A fallback or category substitution replaced (part of) the model output.
    pub degraded: bool,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Typed stage output plus its record.
#[derive(Debug, Clone)]
pub struct StageOutcome<T> {
    pub value: T,
    pub record: StageRecord,
}

impl<T> StageOutcome<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

async fn call(
    gateway: &dyn ModelGateway,
    stage: Stage,
    prompt: String,
) -> Result<(String, StageRecord), GatewayError> {
    debug!(stage = %stage, "prompt:\n{}", prompt);
    let started = Instant::now();
    let completion = gateway.complete(&prompt).await.map_err(|e| {
        warn!(stage = %stage, "gateway call failed: {}", e);
        e
    })?;
    let elapsed = started.elapsed();
    debug!(stage = %stage, "completion:\n{}", completion);
    let record = StageRecord {
        stage,
        prompt,
        completion: completion.clone(),
        elapsed,
        degraded: false,
    };
    Ok((completion, record))
}

fn finish<T>(value: T, mut record: StageRecord, degraded: bool) -> StageOutcome<T> {
    record.degraded = degraded;
    info!(
        stage = %record.stage,
        elapsed_ms = record.elapsed.as_millis() as u64,
        degraded,
        "stage {} complete",
        record.stage.number()
    );
    StageOutcome { value, record }
}

/// Stage 1: the completion is the intent sentence, taken as is.
pub async fn interpret_intent(
    gateway: &dyn ModelGateway,
    query: &CustomerQuery,
) -> Result<StageOutcome<IntentSummary>, GatewayError> {
    let (text, record) = call(
        gateway,
        Stage::InterpretIntent,
        prompts::intent_prompt(query.as_str()),
    )
    .await?;
    Ok(finish(IntentSummary::new(text), record, false))
}

/// Stage 2: decode ranked candidates; non-JSON or wrong shape yields the single fallback.
pub async fn map_to_categories(
    gateway: &dyn ModelGateway,
    intent: &IntentSummary,
) -> Result<StageOutcome<CategoryCandidateList>, GatewayError> {
    let (text, record) = call(
        gateway,
        Stage::MapCategories,
        prompts::categories_prompt(intent.as_str()),
    )
    .await?;

    let mut substituted = false;
    let decoded = decode_with(&text, fallback_candidates(), |raw: Vec<RawCandidate>| {
        let (list, sub) = validate_candidates(raw);
        substituted = sub;
        Some(list)
    });
    let degraded = decoded.is_fallback() || substituted;
    if decoded.is_fallback() {
        warn!(stage = %Stage::MapCategories, "candidate list not decodable; using General Information fallback");
    }
    Ok(finish(decoded.into_inner(), record, degraded))
}

/// Stage 3: one label, resolved from free text against the closed set.
pub async fn choose_category(
    gateway: &dyn ModelGateway,
    intent: &IntentSummary,
    candidates: &[CategoryCandidate],
) -> Result<StageOutcome<ChosenCategory>, GatewayError> {
    let candidates_json =
        serde_json::to_string_pretty(candidates).unwrap_or_else(|_| "[]".to_string());
    let (text, record) = call(
        gateway,
        Stage::ChooseCategory,
        prompts::choose_prompt(intent.as_str(), &candidates_json),
    )
    .await?;

    let (chosen, substituted) = ChosenCategory::resolve(&text);
    if substituted {
        warn!(
            stage = %Stage::ChooseCategory,
            raw = %chosen.raw(),
            "model answer was not a single label; resolved to {}",
            chosen.label()
        );
    }
    Ok(finish(chosen, record, substituted))
}

/// Stage 4: decode found/missing fields; failure yields `missing_fields = ["parse_error"]`.
pub async fn extract_details(
    gateway: &dyn ModelGateway,
    query: &CustomerQuery,
    chosen: &ChosenCategory,
) -> Result<StageOutcome<ExtractedDetails>, GatewayError> {
    let (text, record) = call(
        gateway,
        Stage::ExtractDetails,
        prompts::details_prompt(query.as_str(), chosen.label()),
    )
    .await?;

    let decoded = decode_with::<Map<String, Value>, _, _>(
        &text,
        ExtractedDetails::fallback(),
        ExtractedDetails::from_json_object,
    );
    let degraded = decoded.is_fallback();
    if degraded {
        warn!(stage = %Stage::ExtractDetails, "details not decodable; using parse_error fallback");
    }
    Ok(finish(decoded.into_inner(), record, degraded))
}

/// Stage 5: the completion is the customer reply, unvalidated.
pub async fn generate_reply(
    gateway: &dyn ModelGateway,
    chosen: &ChosenCategory,
    details: &ExtractedDetails,
) -> Result<StageOutcome<CustomerReply>, GatewayError> {
    let details_json = serde_json::to_string_pretty(details).unwrap_or_else(|_| "{}".to_string());
    let (text, record) = call(
        gateway,
        Stage::GenerateReply,
        prompts::reply_prompt(chosen.label(), &details_json),
    )
    .await?;
    Ok(finish(CustomerReply::new(text), record, false))
}
