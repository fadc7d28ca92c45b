//! Chain Orchestrator: runs the five stages in order and assembles the [`PipelineResult`].
//!
//! The only suspension points are the gateway calls. A cancelled run drops the in-flight
//! call and produces no partial result.

use crate::gateway::{GatewayError, ModelGateway};
use crate::stages::{self, StageRecord};
use crate::types::{CustomerQuery, PipelineResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// A completed run with its per-stage transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChainRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub result: PipelineResult,
    pub transcript: Vec<StageRecord>,
}

impl ChainRun {
    /// True when any stage fell back or substituted part of the model output.
    pub fn degraded(&self) -> bool {
        self.transcript.iter().any(|r| r.degraded)
    }
}

pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Run stages 1→5. Any gateway error aborts the run.
    pub async fn run(&self, query: &CustomerQuery) -> Result<PipelineResult, GatewayError> {
        self.run_traced(query).await.map(|run| run.result)
    }

    /// Like [`Self::run`], also returning what every stage sent and received.
    pub async fn run_traced(&self, query: &CustomerQuery) -> Result<ChainRun, GatewayError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "prompt chain started");

        let gw = self.gateway.as_ref();
        let mut transcript = Vec::with_capacity(5);

        let intent = stages::interpret_intent(gw, query).await?;
        transcript.push(intent.record);
        let intent = intent.value;

        let candidates = stages::map_to_categories(gw, &intent).await?;
        transcript.push(candidates.record);
        let candidates = candidates.value;

        let chosen = stages::choose_category(gw, &intent, &candidates).await?;
        transcript.push(chosen.record);
        let chosen = chosen.value;

        let details = stages::extract_details(gw, query, &chosen).await?;
        transcript.push(details.record);
        let details = details.value;

        let reply = stages::generate_reply(gw, &chosen, &details).await?;
        transcript.push(reply.record);
        let reply = reply.value;

        let run = ChainRun {
            run_id,
            started_at,
            result: PipelineResult::new(intent, candidates, chosen, details, reply),
            transcript,
        };
        info!(
            %run_id,
            category = %run.result.chosen(),
            degraded = run.degraded(),
            elapsed_ms = (Utc::now() - started_at).num_milliseconds(),
            "prompt chain finished"
        );
        Ok(run)
    }

    /// Run with a budget for the whole chain; exceeding it yields [`GatewayError::Cancelled`].
    pub async fn run_with_timeout(
        &self,
        query: &CustomerQuery,
        budget: Duration,
    ) -> Result<ChainRun, GatewayError> {
        tokio::time::timeout(budget, self.run_traced(query))
            .await
            .map_err(|_| {
                GatewayError::Cancelled(format!("run exceeded {}ms budget", budget.as_millis()))
            })?
    }

    /// Run until `cancel` resolves, whichever comes first.
    pub async fn run_until<F>(&self, query: &CustomerQuery, cancel: F) -> Result<ChainRun, GatewayError>
    where
        F: Future,
    {
        tokio::select! {
            res = self.run_traced(query) => res,
            _ = cancel => {
                info!("prompt chain cancelled by caller");
                Err(GatewayError::Cancelled("cancelled by caller".to_string()))
            }
        }
    }
}
