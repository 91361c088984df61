//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the catalog and consultation endpoints,
//! the shared birth-input validation, and the master definition for the
//! OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use saju_core::domain::{
    BirthInput, Consultation, ConsultationStatus, FortuneCategory, Gender, NewConsultation,
    Product,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories_handler,
        list_products_handler,
        create_consultation_handler,
        get_consultation_handler,
        update_consultation_handler,
        crate::web::saju::analyze_handler,
        crate::web::saju::calculate_handler,
        crate::web::payments::create_payment_handler,
        crate::web::payments::confirm_payment_handler,
    ),
    components(
        schemas(
            CreateConsultationRequest,
            UpdateConsultationRequest,
            ConsultationResponse,
            crate::web::saju::AnalyzeRequest,
            crate::web::saju::CalculateRequest,
            crate::web::saju::PartnerPayload,
            crate::web::payments::CreatePaymentRequest,
            crate::web::payments::ConfirmPaymentRequest,
        )
    ),
    tags(
        (name = "Saju API", description = "사주팔자 분석, 상담, 결제 API")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Birth-Input Validation
//=========================================================================================

/// The raw birth fields as the client sends them.
pub(crate) struct BirthFields<'a> {
    pub name: &'a str,
    pub birth_date: &'a str,
    pub birth_time: Option<&'a str>,
    pub gender: &'a str,
    pub is_lunar: bool,
}

/// Validates and converts the raw fields into a domain `BirthInput`.
/// All offending fields are collected into one response so the client can
/// highlight every problem at once.
pub(crate) fn parse_birth_input(fields: BirthFields<'_>) -> Result<BirthInput, ApiError> {
    let mut bad_fields: Vec<String> = Vec::new();

    let name = fields.name.trim();
    if name.is_empty() {
        bad_fields.push("name".to_string());
    }

    let birth_date = NaiveDate::parse_from_str(fields.birth_date.trim(), "%Y-%m-%d").ok();
    if birth_date.is_none() {
        bad_fields.push("birthDate".to_string());
    }

    // An absent, empty or literal "unknown" time means the birth time is
    // not known; the calculator then assumes noon and flags the result.
    let birth_time: Result<Option<NaiveTime>, ()> = match fields.birth_time.map(str::trim) {
        None | Some("") | Some("unknown") => Ok(None),
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
            .map(Some)
            .map_err(|_| ()),
    };
    if birth_time.is_err() {
        bad_fields.push("birthTime".to_string());
    }

    let gender = Gender::parse(fields.gender.trim());
    if gender.is_none() {
        bad_fields.push("gender".to_string());
    }

    if !bad_fields.is_empty() {
        return Err(ApiError::validation(
            "입력값이 올바르지 않습니다.",
            bad_fields,
        ));
    }

    Ok(BirthInput {
        name: name.to_string(),
        birth_date: birth_date.unwrap(),
        birth_time: birth_time.unwrap(),
        gender: gender.unwrap(),
        is_lunar: fields.is_lunar,
    })
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The request payload for creating a new consultation.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsultationRequest {
    pub name: String,
    /// Birth date in `YYYY-MM-DD` format.
    pub birth_date: String,
    /// Birth time in `HH:MM` format, or `"unknown"` / omitted when not known.
    #[serde(default)]
    pub birth_time: Option<String>,
    /// Either `male` or `female`.
    pub gender: String,
    #[serde(default)]
    pub is_lunar: bool,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// The request payload for updating a consultation.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConsultationRequest {
    #[serde(default)]
    pub saju_data: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A consultation as returned to the client.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationResponse {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub name: String,
    pub birth_date: String,
    pub birth_time: Option<String>,
    pub gender: String,
    pub is_lunar: bool,
    pub saju_data: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Consultation> for ConsultationResponse {
    fn from(c: Consultation) -> Self {
        Self {
            id: c.id,
            session_id: c.session_id,
            user_id: c.user_id,
            product_id: c.product_id,
            name: c.name,
            birth_date: c.birth_date.format("%Y-%m-%d").to_string(),
            birth_time: c.birth_time.map(|t| t.format("%H:%M").to_string()),
            gender: c.gender.as_str().to_string(),
            is_lunar: c.is_lunar,
            saju_data: c.saju_data,
            status: c.status.as_str().to_string(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// List the available fortune categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "The static category list")
    )
)]
pub async fn list_categories_handler() -> impl IntoResponse {
    let categories: Vec<serde_json::Value> = FortuneCategory::ALL
        .iter()
        .map(|c| {
            json!({
                "code": c.as_str(),
                "label": c.korean(),
                "description": category_description(*c),
            })
        })
        .collect();
    Json(json!({ "categories": categories }))
}

fn category_description(category: FortuneCategory) -> &'static str {
    match category {
        FortuneCategory::Love => "연애 스타일과 인연의 흐름을 분석합니다.",
        FortuneCategory::Wealth => "재물의 흐름과 관리 방향을 분석합니다.",
        FortuneCategory::Career => "적성과 커리어의 방향을 분석합니다.",
        FortuneCategory::Compatibility => "두 사람의 사주 궁합을 분석합니다.",
        FortuneCategory::Yearly => "올해의 전체 운세 흐름을 분석합니다.",
        FortuneCategory::Comprehensive => "타고난 성품부터 인생 전반을 분석합니다.",
    }
}

/// The seed catalog, also used as a fallback when the products table is
/// empty or unreachable so the storefront never renders blank.
fn fallback_products() -> Vec<Product> {
    let seed = [
        ("love", "연애운 분석", "연애 스타일과 인연의 흐름", 9900),
        ("wealth", "재물운 분석", "재물의 흐름과 관리 방향", 9900),
        ("career", "직업운 분석", "적성과 커리어의 방향", 9900),
        ("yearly", "신년운세", "올해의 전체 운세 흐름", 12900),
        ("compatibility", "궁합 분석", "두 사람의 사주 궁합", 14900),
        ("comprehensive", "종합 사주 분석", "타고난 성품부터 인생 전반까지", 19900),
    ];
    seed.iter()
        .map(|(id, name, description, price)| Product {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            price: *price,
            category: id.to_string(),
            is_active: true,
        })
        .collect()
}

/// List the active products from the catalog.
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Active products, cheapest first")
    )
)]
pub async fn list_products_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let products = match state.db.list_active_products().await {
        Ok(products) if !products.is_empty() => products,
        Ok(_) => fallback_products(),
        Err(e) => {
            tracing::warn!(error = %e, "product listing failed, serving the seed catalog");
            fallback_products()
        }
    };
    Json(json!({ "products": products }))
}

//=========================================================================================
// Consultation Handlers
//=========================================================================================

/// Create a new consultation from the intake form.
#[utoipa::path(
    post,
    path = "/api/consultations",
    request_body = CreateConsultationRequest,
    responses(
        (status = 201, description = "Consultation created", body = ConsultationResponse),
        (status = 400, description = "Validation failure listing the offending fields")
    )
)]
pub async fn create_consultation_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateConsultationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_birth_input(BirthFields {
        name: &payload.name,
        birth_date: &payload.birth_date,
        birth_time: payload.birth_time.as_deref(),
        gender: &payload.gender,
        is_lunar: payload.is_lunar,
    })?;

    let consultation = state
        .db
        .create_consultation(NewConsultation {
            session_id: Uuid::new_v4().to_string(),
            user_id: payload.user_id,
            product_id: payload.product_id,
            name: input.name,
            birth_date: input.birth_date,
            birth_time: input.birth_time,
            gender: input.gender,
            is_lunar: input.is_lunar,
            saju_data: None,
            status: ConsultationStatus::Pending,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConsultationResponse::from(consultation)),
    ))
}

/// Fetch a consultation by record id or session id.
#[utoipa::path(
    get,
    path = "/api/consultations/{id}",
    params(("id" = String, Path, description = "Record id or session id")),
    responses(
        (status = 200, description = "The consultation", body = ConsultationResponse),
        (status = 404, description = "No matching consultation")
    )
)]
pub async fn get_consultation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let consultation = state.db.find_consultation(&id).await?;
    Ok(Json(ConsultationResponse::from(consultation)))
}

/// Update a consultation's stored analysis and/or status.
#[utoipa::path(
    patch,
    path = "/api/consultations/{id}",
    params(("id" = String, Path, description = "Record id or session id")),
    request_body = UpdateConsultationRequest,
    responses(
        (status = 200, description = "The updated consultation", body = ConsultationResponse),
        (status = 404, description = "No matching consultation")
    )
)]
pub async fn update_consultation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateConsultationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match payload.status.as_deref() {
        None => None,
        Some(raw) => Some(ConsultationStatus::parse(raw).ok_or_else(|| {
            ApiError::validation("유효하지 않은 상태값입니다.", vec!["status".to_string()])
        })?),
    };

    let existing = state.db.find_consultation(&id).await?;
    let updated = state
        .db
        .update_consultation(existing.id, payload.saju_data, status)
        .await?;

    Ok(Json(ConsultationResponse::from(updated)))
}
