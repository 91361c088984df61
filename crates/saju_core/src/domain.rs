//! crates/saju_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Birth information submitted by the intake form. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthInput {
    pub name: String,
    pub birth_date: NaiveDate,
    /// `None` when the birth time is unknown; the pillar calculator then
    /// substitutes noon and flags the result as approximate.
    pub birth_time: Option<NaiveTime>,
    pub gender: Gender,
    /// When true, `birth_date` is a lunar calendar date and must be
    /// normalized to solar before any pillar math.
    pub is_lunar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(value: &str) -> Option<Gender> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn korean(&self) -> &'static str {
        match self {
            Gender::Male => "남성",
            Gender::Female => "여성",
        }
    }
}

/// The fortune categories offered by the product catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FortuneCategory {
    Love,
    Wealth,
    Career,
    Compatibility,
    Yearly,
    Comprehensive,
}

impl FortuneCategory {
    pub const ALL: [FortuneCategory; 6] = [
        FortuneCategory::Love,
        FortuneCategory::Wealth,
        FortuneCategory::Career,
        FortuneCategory::Compatibility,
        FortuneCategory::Yearly,
        FortuneCategory::Comprehensive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FortuneCategory::Love => "love",
            FortuneCategory::Wealth => "wealth",
            FortuneCategory::Career => "career",
            FortuneCategory::Compatibility => "compatibility",
            FortuneCategory::Yearly => "yearly",
            FortuneCategory::Comprehensive => "comprehensive",
        }
    }

    pub fn korean(&self) -> &'static str {
        match self {
            FortuneCategory::Love => "연애운",
            FortuneCategory::Wealth => "재물운",
            FortuneCategory::Career => "직업운",
            FortuneCategory::Compatibility => "궁합",
            FortuneCategory::Yearly => "신년운세",
            FortuneCategory::Comprehensive => "종합운세",
        }
    }

    pub fn parse(value: &str) -> Option<FortuneCategory> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

pub const STEMS: [&str; 10] = ["갑", "을", "병", "정", "무", "기", "경", "신", "임", "계"];
pub const BRANCHES: [&str; 12] = [
    "자", "축", "인", "묘", "진", "사", "오", "미", "신", "유", "술", "해",
];
pub const ZODIAC_ANIMALS: [&str; 12] = [
    "쥐", "소", "호랑이", "토끼", "용", "뱀", "말", "양", "원숭이", "닭", "개", "돼지",
];

/// One heavenly-stem / earthly-branch pair. Stems index the 10-symbol cycle
/// (갑..계) and branches the 12-symbol cycle (자..해).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: u8,
    pub branch: u8,
}

impl Pillar {
    pub fn new(stem: u8, branch: u8) -> Self {
        debug_assert!(stem < 10 && branch < 12);
        Pillar { stem, branch }
    }

    pub fn stem_name(&self) -> &'static str {
        STEMS[self.stem as usize]
    }

    pub fn branch_name(&self) -> &'static str {
        BRANCHES[self.branch as usize]
    }

    /// Combined label, e.g. "갑자".
    pub fn label(&self) -> String {
        format!("{}{}", self.stem_name(), self.branch_name())
    }
}

/// The four pillars (year, month, day, hour) derived from a birth input.
/// Derived, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourPillars {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
    /// True when the birth time was unknown and noon was assumed.
    pub hour_assumed: bool,
}

impl FourPillars {
    pub fn pillars(&self) -> [Pillar; 4] {
        [self.year, self.month, self.day, self.hour]
    }
}

/// The five elements (오행), in the fixed tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn korean(&self) -> &'static str {
        match self {
            Element::Wood => "목",
            Element::Fire => "화",
            Element::Earth => "토",
            Element::Metal => "금",
            Element::Water => "수",
        }
    }
}

/// Lifecycle of a consultation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,
    Completed,
    Failed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::Completed => "completed",
            ConsultationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<ConsultationStatus> {
        match value {
            "pending" => Some(ConsultationStatus::Pending),
            "completed" => Some(ConsultationStatus::Completed),
            "failed" => Some(ConsultationStatus::Failed),
            _ => None,
        }
    }
}

/// A persisted fortune consultation.
#[derive(Debug, Clone)]
pub struct Consultation {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub name: String,
    pub birth_date: NaiveDate,
    pub birth_time: Option<NaiveTime>,
    pub gender: Gender,
    pub is_lunar: bool,
    /// Serialized pillars, element distribution and fortune text.
    pub saju_data: Option<serde_json::Value>,
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields required to create a consultation record.
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub session_id: String,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub name: String,
    pub birth_date: NaiveDate,
    pub birth_time: Option<NaiveTime>,
    pub gender: Gender,
    pub is_lunar: bool,
    pub saju_data: Option<serde_json::Value>,
    pub status: ConsultationStatus,
}

/// Lifecycle of a payment record. `Done` is only ever reached through a
/// successful gateway confirmation for the stored amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Done,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Done => "done",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<PaymentStatus> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "done" => Some(PaymentStatus::Done),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// A persisted payment.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: String,
    pub order_name: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub product_id: Option<String>,
    /// Amount in KRW. Must match the gateway-reported amount before the
    /// status may transition to `done`.
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_key: Option<String>,
    pub gateway_metadata: Option<serde_json::Value>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// The fields required to create a pending payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub order_name: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub product_id: Option<String>,
    pub amount: i64,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub is_active: bool,
}

/// A successful confirmation reported by the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayApproval {
    pub payment_key: String,
    pub method: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    /// The gateway's full response body, kept for audit.
    pub raw: serde_json::Value,
}
