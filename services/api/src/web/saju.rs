//! services/api/src/web/saju.rs
//!
//! Contains the Axum handlers for the saju calculation and AI fortune
//! analysis endpoints.

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::rest::{parse_birth_input, BirthFields};
use crate::web::state::AppState;
use saju_core::domain::{
    BirthInput, ConsultationStatus, FortuneCategory, FourPillars, NewConsultation, Pillar,
};
use saju_core::domain::ZODIAC_ANIMALS;
use saju_core::elements::{element_distribution, fortune_scores, ElementDistribution};
use saju_core::pillars::four_pillars;
use saju_core::prompt::{build_prompt, PromptError, PromptSubject};

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// The partner's birth information, required for compatibility readings.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPayload {
    pub name: String,
    pub birth_date: String,
    #[serde(default)]
    pub birth_time: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub is_lunar: bool,
}

/// The request payload for the AI fortune analysis endpoint.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub category: String,
    pub name: String,
    pub birth_date: String,
    #[serde(default)]
    pub birth_time: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub is_lunar: bool,
    #[serde(default)]
    pub partner: Option<PartnerPayload>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// The request payload for the pure calculation endpoint (no LLM call).
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub name: String,
    pub birth_date: String,
    #[serde(default)]
    pub birth_time: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub is_lunar: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

//=========================================================================================
// JSON Rendering Helpers
//=========================================================================================

fn pillar_json(pillar: Pillar) -> serde_json::Value {
    json!({
        "stem": pillar.stem_name(),
        "branch": pillar.branch_name(),
        "label": pillar.label(),
    })
}

pub(crate) fn pillars_json(pillars: &FourPillars) -> serde_json::Value {
    json!({
        "year": pillar_json(pillars.year),
        "month": pillar_json(pillars.month),
        "day": pillar_json(pillars.day),
        "hour": pillar_json(pillars.hour),
        "hourAssumed": pillars.hour_assumed,
    })
}

/// Birth-year label and zodiac animal, taken from the year pillar so it
/// honors the 입춘 rollover and lunar normalization exactly like the chart.
fn birth_year_json(pillars: &FourPillars) -> serde_json::Value {
    json!({
        "label": pillars.year.label(),
        "animal": ZODIAC_ANIMALS[pillars.year.branch as usize],
    })
}

pub(crate) fn elements_json(distribution: &ElementDistribution) -> serde_json::Value {
    json!({
        "wood": distribution.wood,
        "fire": distribution.fire,
        "earth": distribution.earth,
        "metal": distribution.metal,
        "water": distribution.water,
        "dominant": distribution.dominant().korean(),
        "weakest": distribution.weakest().korean(),
    })
}

/// Computes the full chart for one person. Calendar failures (dates outside
/// the supported lunar range, impossible lunar dates) come back to the client
/// as validation errors; they are never retried.
fn chart_for(
    input: &BirthInput,
    field: &str,
) -> Result<(FourPillars, ElementDistribution), ApiError> {
    let pillars = four_pillars(input)
        .map_err(|e| ApiError::validation(e.to_string(), vec![field.to_string()]))?;
    let distribution = element_distribution(&pillars);
    Ok((pillars, distribution))
}

//=========================================================================================
// Saju Handlers
//=========================================================================================

/// Analyze a chart and generate an AI fortune reading.
#[utoipa::path(
    post,
    path = "/api/saju/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "The chart and the generated fortune"),
        (status = 400, description = "Validation failure"),
        (status = 429, description = "Upstream rate limit after retries"),
        (status = 504, description = "Upstream timeout after retries")
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = FortuneCategory::parse(payload.category.trim()).ok_or_else(|| {
        ApiError::validation("유효하지 않은 카테고리입니다.", vec!["category".to_string()])
    })?;

    let input = parse_birth_input(BirthFields {
        name: &payload.name,
        birth_date: &payload.birth_date,
        birth_time: payload.birth_time.as_deref(),
        gender: &payload.gender,
        is_lunar: payload.is_lunar,
    })?;
    let (pillars, distribution) = chart_for(&input, "birthDate")?;

    let partner_input = match &payload.partner {
        Some(partner) => Some(parse_birth_input(BirthFields {
            name: &partner.name,
            birth_date: &partner.birth_date,
            birth_time: partner.birth_time.as_deref(),
            gender: &partner.gender,
            is_lunar: partner.is_lunar,
        })?),
        None => None,
    };
    let partner_chart = match &partner_input {
        Some(partner) => Some(chart_for(partner, "partner.birthDate")?),
        None => None,
    };

    let subject = PromptSubject {
        name: &input.name,
        gender: input.gender,
        pillars: &pillars,
        elements: &distribution,
    };
    let partner_subject = partner_input.as_ref().zip(partner_chart.as_ref()).map(
        |(partner, (partner_pillars, partner_distribution))| PromptSubject {
            name: &partner.name,
            gender: partner.gender,
            pillars: partner_pillars,
            elements: partner_distribution,
        },
    );

    let prompt = build_prompt(category, &subject, partner_subject.as_ref()).map_err(
        |e: PromptError| ApiError::validation(e.to_string(), vec!["partner".to_string()]),
    )?;

    let fortune_text = state.fortune.generate_fortune(&prompt).await?;
    // The model is instructed to answer with pure JSON; when it does not,
    // the raw text still reaches the client under "overall".
    let fortune: serde_json::Value = serde_json::from_str(fortune_text.trim())
        .unwrap_or_else(|_| json!({ "overall": fortune_text.trim() }));

    let scores = fortune_scores(&distribution);
    let saju_data = json!({
        "category": category.as_str(),
        "pillars": pillars_json(&pillars),
        "elements": elements_json(&distribution),
        "scores": scores,
        "fortune": fortune,
    });

    let consultation = state
        .db
        .create_consultation(NewConsultation {
            session_id: Uuid::new_v4().to_string(),
            user_id: payload.user_id,
            product_id: payload.product_id,
            name: input.name.clone(),
            birth_date: input.birth_date,
            birth_time: input.birth_time,
            gender: input.gender,
            is_lunar: input.is_lunar,
            saju_data: Some(saju_data),
            status: ConsultationStatus::Completed,
        })
        .await?;

    Ok(Json(json!({
        "consultationId": consultation.id,
        "sessionId": consultation.session_id,
        "category": category.as_str(),
        "categoryLabel": category.korean(),
        "pillars": pillars_json(&pillars),
        "elements": elements_json(&distribution),
        "scores": scores,
        "fortune": fortune,
    })))
}

/// Calculate the four pillars and element balance without an AI reading.
#[utoipa::path(
    post,
    path = "/api/saju/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "The chart, element distribution and derived scores"),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CalculateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_birth_input(BirthFields {
        name: &payload.name,
        birth_date: &payload.birth_date,
        birth_time: payload.birth_time.as_deref(),
        gender: &payload.gender,
        is_lunar: payload.is_lunar,
    })?;
    let (pillars, distribution) = chart_for(&input, "birthDate")?;
    let scores = fortune_scores(&distribution);
    let birth_year = birth_year_json(&pillars);

    let saju_data = json!({
        "pillars": pillars_json(&pillars),
        "elements": elements_json(&distribution),
        "scores": scores,
        "birthYear": birth_year.clone(),
    });

    let consultation = state
        .db
        .create_consultation(NewConsultation {
            session_id: Uuid::new_v4().to_string(),
            user_id: payload.user_id,
            product_id: None,
            name: input.name.clone(),
            birth_date: input.birth_date,
            birth_time: input.birth_time,
            gender: input.gender,
            is_lunar: input.is_lunar,
            saju_data: Some(saju_data),
            status: ConsultationStatus::Completed,
        })
        .await?;

    Ok(Json(json!({
        "consultationId": consultation.id,
        "sessionId": consultation.session_id,
        "pillars": pillars_json(&pillars),
        "elements": elements_json(&distribution),
        "scores": scores,
        "birthYear": birth_year,
    })))
}
