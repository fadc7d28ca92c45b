//! prompt-chain-core: five-stage customer-support prompt chain.
//!
//! Query → intent → ranked category candidates → chosen category → extracted details →
//! customer reply, one completion call per stage. Malformed model output degrades to fixed
//! fallbacks; only gateway (transport/protocol) failures abort a run.

pub mod category;
pub mod config;
pub mod decoder;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
pub mod stages;
pub mod types;

pub use category::{most_actionable, Category, UnknownCategory};
pub use config::{ChainConfig, ConfigError};
pub use decoder::{decode_json, decode_with, Decoded};
pub use gateway::{
    GatewayError, GatewayErrorKind, ModelGateway, OpenRouterGateway, ScriptedGateway,
};
pub use orchestrator::{ChainRun, Orchestrator};
pub use stages::{Stage, StageOutcome, StageRecord};
pub use types::{
    fallback_candidates, CategoryCandidate, CategoryCandidateList, ChosenCategory,
    CustomerQuery, CustomerReply, ExtractedDetails, IntentSummary, PipelineResult, QueryError,
    FALLBACK_JUSTIFICATION, MAX_CANDIDATES, PARSE_ERROR_FIELD,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
