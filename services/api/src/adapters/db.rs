//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries are runtime-checked (`sqlx::query_as`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use saju_core::domain::{
    Consultation, ConsultationStatus, Gender, NewConsultation, NewPayment, Payment,
    PaymentStatus, Product,
};
use saju_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProductRecord {
    id: String,
    name: String,
    description: String,
    price: i64,
    category: String,
    is_active: bool,
}

impl ProductRecord {
    fn to_domain(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct ConsultationRecord {
    id: Uuid,
    session_id: String,
    user_id: Option<String>,
    product_id: Option<String>,
    name: String,
    birth_date: NaiveDate,
    birth_time: Option<NaiveTime>,
    gender: String,
    is_lunar: bool,
    saju_data: Option<serde_json::Value>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConsultationRecord {
    fn to_domain(self) -> PortResult<Consultation> {
        let gender = Gender::parse(&self.gender)
            .ok_or_else(|| PortError::Unexpected(format!("bad gender column: {}", self.gender)))?;
        let status = ConsultationStatus::parse(&self.status)
            .ok_or_else(|| PortError::Unexpected(format!("bad status column: {}", self.status)))?;
        Ok(Consultation {
            id: self.id,
            session_id: self.session_id,
            user_id: self.user_id,
            product_id: self.product_id,
            name: self.name,
            birth_date: self.birth_date,
            birth_time: self.birth_time,
            gender,
            is_lunar: self.is_lunar,
            saju_data: self.saju_data,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PaymentRecord {
    id: Uuid,
    order_id: String,
    order_name: String,
    customer_name: String,
    customer_email: Option<String>,
    product_id: Option<String>,
    amount: i64,
    status: String,
    payment_key: Option<String>,
    gateway_metadata: Option<serde_json::Value>,
    failure_code: Option<String>,
    failure_message: Option<String>,
    created_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    fn to_domain(self) -> PortResult<Payment> {
        let status = PaymentStatus::parse(&self.status)
            .ok_or_else(|| PortError::Unexpected(format!("bad status column: {}", self.status)))?;
        Ok(Payment {
            id: self.id,
            order_id: self.order_id,
            order_name: self.order_name,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            product_id: self.product_id,
            amount: self.amount,
            status,
            payment_key: self.payment_key,
            gateway_metadata: self.gateway_metadata,
            failure_code: self.failure_code,
            failure_message: self.failure_message,
            created_at: self.created_at,
            approved_at: self.approved_at,
        })
    }
}

const CONSULTATION_COLUMNS: &str = "id, session_id, user_id, product_id, name, birth_date, \
     birth_time, gender, is_lunar, saju_data, status, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, order_id, order_name, customer_name, customer_email, \
     product_id, amount, status, payment_key, gateway_metadata, failure_code, failure_message, \
     created_at, approved_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_active_products(&self) -> PortResult<Vec<Product>> {
        let records = sqlx::query_as::<_, ProductRecord>(
            "SELECT id, name, description, price, category, is_active \
             FROM products WHERE is_active = true ORDER BY price ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_consultation(&self, new: NewConsultation) -> PortResult<Consultation> {
        let sql = format!(
            "INSERT INTO consultations \
             (id, session_id, user_id, product_id, name, birth_date, birth_time, gender, \
              is_lunar, saju_data, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW()) \
             RETURNING {CONSULTATION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ConsultationRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.session_id)
            .bind(&new.user_id)
            .bind(&new.product_id)
            .bind(&new.name)
            .bind(new.birth_date)
            .bind(new.birth_time)
            .bind(new.gender.as_str())
            .bind(new.is_lunar)
            .bind(&new.saju_data)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        record.to_domain()
    }

    async fn find_consultation(&self, key: &str) -> PortResult<Consultation> {
        // The path parameter can be either the record id or the opaque
        // session id the client holds.
        if let Ok(id) = Uuid::parse_str(key) {
            let sql = format!("SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE id = $1");
            if let Some(record) = sqlx::query_as::<_, ConsultationRecord>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?
            {
                return record.to_domain();
            }
        }

        let sql = format!(
            "SELECT {CONSULTATION_COLUMNS} FROM consultations \
             WHERE session_id = $1 ORDER BY created_at DESC LIMIT 1"
        );
        let record = sqlx::query_as::<_, ConsultationRecord>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("consultation {key}")))?;

        record.to_domain()
    }

    async fn update_consultation(
        &self,
        id: Uuid,
        saju_data: Option<serde_json::Value>,
        status: Option<ConsultationStatus>,
    ) -> PortResult<Consultation> {
        let sql = format!(
            "UPDATE consultations \
             SET saju_data = COALESCE($2, saju_data), \
                 status = COALESCE($3, status), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CONSULTATION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ConsultationRecord>(&sql)
            .bind(id)
            .bind(saju_data)
            .bind(status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("consultation {id}")))?;

        record.to_domain()
    }

    async fn create_payment(&self, new: NewPayment) -> PortResult<Payment> {
        let sql = format!(
            "INSERT INTO payments \
             (id, order_id, order_name, customer_name, customer_email, product_id, amount, \
              status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', NOW()) \
             RETURNING {PAYMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.order_id)
            .bind(&new.order_name)
            .bind(&new.customer_name)
            .bind(&new.customer_email)
            .bind(&new.product_id)
            .bind(new.amount)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        record.to_domain()
    }

    async fn find_payment_by_order_id(&self, order_id: &str) -> PortResult<Payment> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1");
        let record = sqlx::query_as::<_, PaymentRecord>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("payment {order_id}")))?;

        record.to_domain()
    }

    async fn approve_payment(
        &self,
        order_id: &str,
        payment_key: &str,
        metadata: serde_json::Value,
        approved_at: DateTime<Utc>,
    ) -> PortResult<bool> {
        // Compare-and-set on status: a concurrent confirm that already won
        // leaves zero rows to update, which the caller reports as
        // ALREADY_APPROVED instead of double-fulfilling. A previously
        // `failed` payment is still eligible, so a retried confirm that the
        // gateway approves is recorded instead of lost.
        let result = sqlx::query(
            "UPDATE payments \
             SET status = 'done', payment_key = $2, gateway_metadata = $3, approved_at = $4, \
                 failure_code = NULL, failure_message = NULL \
             WHERE order_id = $1 AND status <> 'done'",
        )
        .bind(order_id)
        .bind(payment_key)
        .bind(metadata)
        .bind(approved_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_payment_failed(
        &self,
        order_id: &str,
        failure_code: &str,
        failure_message: &str,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE payments \
             SET status = 'failed', failure_code = $2, failure_message = $3 \
             WHERE order_id = $1 AND status <> 'done'",
        )
        .bind(order_id)
        .bind(failure_code)
        .bind(failure_message)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(())
    }
}
