//! JSON API surface for the qualification pipeline and the nurture poll.
//! The router is state-complete so binaries and tests can mount it as-is.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::info;

use crate::error::AppError;
use crate::workflows::leads::{
    read_leads, ColumnMap, InMemoryContactStore, KeywordSets, LeadPipeline, Phase,
    PipelineOptions, PipelineSummary,
};
use crate::workflows::nurture::{
    MessageSender, NurtureProcessor, NurtureSequence, NurtureSummary, OutboundMessage, SendError,
};

/// Shared state behind the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub store: InMemoryContactStore,
    pub max_shortlist: usize,
    pub nurture_state: String,
}

impl ApiState {
    pub fn new(store: InMemoryContactStore, max_shortlist: usize, nurture_state: &str) -> Self {
        Self {
            store,
            max_shortlist,
            nurture_state: nurture_state.to_string(),
        }
    }
}

/// Transport stand-in for deployments without an outbound mail channel.
/// Every message is logged and reported as delivered.
pub struct LogSender;

impl MessageSender for LogSender {
    fn send(&self, message: &OutboundMessage<'_>) -> Result<(), SendError> {
        info!(
            recipient = message.recipient,
            template = message.step.template_id,
            label = %message.step.label,
            "nurture message dispatched (log transport)"
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PipelineRunRequest {
    pub csv: String,
    #[serde(default)]
    pub start_phase: Option<u8>,
    #[serde(default)]
    pub max_shortlist: Option<usize>,
    #[serde(default)]
    pub columns: Option<ColumnMap>,
}

#[derive(Debug, Serialize)]
pub struct PipelineRunResponse {
    pub summary: PipelineSummary,
}

#[derive(Debug, Deserialize, Default)]
pub struct NurtureProcessRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub today: Option<NaiveDate>,
}

pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/pipeline/run", post(pipeline_run_endpoint))
        .route("/api/v1/nurture/process", post(nurture_process_endpoint))
        .with_state(state)
}

async fn pipeline_run_endpoint(
    State(state): State<ApiState>,
    Json(payload): Json<PipelineRunRequest>,
) -> Result<Json<PipelineRunResponse>, AppError> {
    let PipelineRunRequest {
        csv,
        start_phase,
        max_shortlist,
        columns,
    } = payload;

    let start_phase = match start_phase {
        Some(number) => Phase::from_number(number).ok_or_else(|| {
            AppError::InvalidRequest(format!("start_phase must be 1-7, got {number}"))
        })?,
        None => Phase::Filter,
    };

    let columns = columns.unwrap_or_else(ColumnMap::jobdigger);
    let dataset = read_leads(Cursor::new(csv.into_bytes()), &columns)?;

    let pipeline = LeadPipeline::new(&KeywordSets::dutch_defaults());
    let options = PipelineOptions {
        start_phase,
        max_shortlist: max_shortlist.unwrap_or(state.max_shortlist),
        ..PipelineOptions::default()
    };
    let outcome = pipeline.run(dataset, &options, None, &state.store)?;

    Ok(Json(PipelineRunResponse {
        summary: outcome.summary,
    }))
}

async fn nurture_process_endpoint(
    State(state): State<ApiState>,
    Json(payload): Json<NurtureProcessRequest>,
) -> Result<Json<NurtureSummary>, AppError> {
    let today = payload.today.unwrap_or_else(|| Local::now().date_naive());

    let processor = NurtureProcessor::new(
        state.store.clone(),
        LogSender,
        NurtureSequence::standard(),
        &state.nurture_state,
    );
    let summary = processor.process_all(today).map_err(AppError::Store)?;

    Ok(Json(summary))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_and_rejects_noise() {
        assert_eq!(
            parse_date(" 2026-08-30 "),
            Ok(NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date"))
        );
        assert!(parse_date("30-08-2026").is_err());
        assert!(parse_date("soon").is_err());
    }

    #[tokio::test]
    async fn bad_phase_numbers_are_rejected_before_parsing_the_csv() {
        let state = ApiState::new(InMemoryContactStore::new(), 500, "qualified");
        let request = PipelineRunRequest {
            csv: "not,even,csv".to_string(),
            start_phase: Some(9),
            max_shortlist: None,
            columns: None,
        };

        let error = super::pipeline_run_endpoint(State(state), Json(request))
            .await
            .expect_err("phase 9 does not exist");
        assert!(matches!(error, AppError::InvalidRequest(_)));
    }
}
