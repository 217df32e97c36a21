//! Effective-dated loss-rate configuration per store and product category
//!
//! Each (store, category) carries at most one active rate per date; creating
//! a new config auto-closes the preceding open-ended window to the day
//! before the new one's start, so effective windows never overlap.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::types::ProductCategory;
use shared::validation::validate_loss_rate;

/// Loss-rate configuration service
#[derive(Clone)]
pub struct LossConfigService {
    db: PgPool,
}

/// An effective-dated loss-rate rule
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LossRateConfig {
    pub id: Uuid,
    pub store_id: Uuid,
    pub product_category: String,
    pub loss_rate: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a loss-rate config
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLossConfigInput {
    pub store_id: Uuid,
    pub product_category: ProductCategory,
    pub loss_rate: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Input for updating a loss-rate config
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLossConfigInput {
    pub loss_rate: Option<Decimal>,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl LossConfigService {
    /// Create a new LossConfigService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All configs of one store
    pub async fn find_by_store(&self, store_id: Uuid) -> AppResult<Vec<LossRateConfig>> {
        let configs = sqlx::query_as::<_, LossRateConfig>(
            r#"
            SELECT id, store_id, product_category, loss_rate, effective_from, effective_to,
                   notes, created_by, created_at, updated_at
            FROM store_loss_config
            WHERE store_id = $1
            ORDER BY product_category ASC, effective_from DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(configs)
    }

    /// All configs across stores (accountant view)
    pub async fn find_all(&self) -> AppResult<Vec<LossRateConfig>> {
        let configs = sqlx::query_as::<_, LossRateConfig>(
            r#"
            SELECT id, store_id, product_category, loss_rate, effective_from, effective_to,
                   notes, created_by, created_at, updated_at
            FROM store_loss_config
            ORDER BY store_id ASC, product_category ASC, effective_from DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(configs)
    }

    /// Config by id
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<LossRateConfig> {
        let config = sqlx::query_as::<_, LossRateConfig>(
            r#"
            SELECT id, store_id, product_category, loss_rate, effective_from, effective_to,
                   notes, created_by, created_at, updated_at
            FROM store_loss_config
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Loss-rate config".to_string()))?;

        Ok(config)
    }

    /// The config whose effective window contains `date`, if any.
    ///
    /// Windows never overlap, but the latest `effective_from` wins as a
    /// tie-break should bad data ever qualify twice.
    pub async fn effective_config(
        &self,
        store_id: Uuid,
        category: ProductCategory,
        date: NaiveDate,
    ) -> AppResult<Option<LossRateConfig>> {
        let config = sqlx::query_as::<_, LossRateConfig>(
            r#"
            SELECT id, store_id, product_category, loss_rate, effective_from, effective_to,
                   notes, created_by, created_at, updated_at
            FROM store_loss_config
            WHERE store_id = $1
              AND product_category = $2
              AND effective_from <= $3
              AND (effective_to IS NULL OR effective_to >= $3)
            ORDER BY effective_from DESC
            LIMIT 1
            "#,
        )
        .bind(store_id)
        .bind(category.as_str())
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(config)
    }

    /// The loss rate effective at `date`; zero when no config applies
    pub async fn get_effective_rate(
        &self,
        store_id: Uuid,
        category: ProductCategory,
        date: NaiveDate,
    ) -> AppResult<Decimal> {
        Ok(self
            .effective_config(store_id, category, date)
            .await?
            .map(|c| c.loss_rate)
            .unwrap_or(Decimal::ZERO))
    }

    /// Create a new config, auto-closing the preceding open-ended window
    pub async fn create(
        &self,
        input: CreateLossConfigInput,
        user_id: Option<Uuid>,
    ) -> AppResult<LossRateConfig> {
        input.validate()?;
        if let Err(msg) = validate_loss_rate(input.loss_rate) {
            return Err(AppError::Validation {
                field: "loss_rate".to_string(),
                message: msg.to_string(),
                message_vi: "Hệ số hao hụt phải nằm trong [0, 1)".to_string(),
            });
        }
        if let Some(effective_to) = input.effective_to {
            if effective_to < input.effective_from {
                return Err(AppError::Validation {
                    field: "effective_to".to_string(),
                    message: "effective_to must not precede effective_from".to_string(),
                    message_vi: "Ngày kết thúc hiệu lực phải sau ngày bắt đầu".to_string(),
                });
            }
        }

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM store_loss_config
                WHERE store_id = $1 AND product_category = $2 AND effective_from = $3
            )
            "#,
        )
        .bind(input.store_id)
        .bind(input.product_category.as_str())
        .bind(input.effective_from)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("loss-rate config".to_string()));
        }

        // Open-ended windows starting earlier are auto-closed below; any
        // other window reaching into the new one would overlap it
        let overlaps = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM store_loss_config
                WHERE store_id = $1
                  AND product_category = $2
                  AND (effective_from >= $3
                       OR (effective_to IS NOT NULL AND effective_to >= $3))
            )
            "#,
        )
        .bind(input.store_id)
        .bind(input.product_category.as_str())
        .bind(input.effective_from)
        .fetch_one(&self.db)
        .await?;

        if overlaps {
            return Err(AppError::BusinessRuleViolation {
                message: "Loss-rate effective windows must not overlap".to_string(),
                message_vi: "Khoảng hiệu lực của hệ số hao hụt không được chồng lấn".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        // Close open-ended windows that would otherwise overlap
        let day_before = input.effective_from.pred_opt();
        sqlx::query(
            r#"
            UPDATE store_loss_config
            SET effective_to = $1, updated_at = NOW()
            WHERE store_id = $2
              AND product_category = $3
              AND effective_to IS NULL
              AND effective_from < $4
            "#,
        )
        .bind(day_before)
        .bind(input.store_id)
        .bind(input.product_category.as_str())
        .bind(input.effective_from)
        .execute(&mut *tx)
        .await?;

        let config = sqlx::query_as::<_, LossRateConfig>(
            r#"
            INSERT INTO store_loss_config
                (store_id, product_category, loss_rate, effective_from, effective_to, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, store_id, product_category, loss_rate, effective_from, effective_to,
                      notes, created_by, created_at, updated_at
            "#,
        )
        .bind(input.store_id)
        .bind(input.product_category.as_str())
        .bind(input.loss_rate)
        .bind(input.effective_from)
        .bind(input.effective_to)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(config)
    }

    /// Update a config in place
    pub async fn update(&self, id: Uuid, input: UpdateLossConfigInput) -> AppResult<LossRateConfig> {
        input.validate()?;
        let existing = self.find_by_id(id).await?;

        let loss_rate = input.loss_rate.unwrap_or(existing.loss_rate);
        if let Err(msg) = validate_loss_rate(loss_rate) {
            return Err(AppError::Validation {
                field: "loss_rate".to_string(),
                message: msg.to_string(),
                message_vi: "Hệ số hao hụt phải nằm trong [0, 1)".to_string(),
            });
        }

        let effective_from = input.effective_from.unwrap_or(existing.effective_from);
        let effective_to = match input.effective_to {
            Some(date) => Some(date),
            None => existing.effective_to,
        };
        let notes = match input.notes {
            Some(notes) => Some(notes),
            None => existing.notes,
        };

        let config = sqlx::query_as::<_, LossRateConfig>(
            r#"
            UPDATE store_loss_config
            SET loss_rate = $1, effective_from = $2, effective_to = $3, notes = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING id, store_id, product_category, loss_rate, effective_from, effective_to,
                      notes, created_by, created_at, updated_at
            "#,
        )
        .bind(loss_rate)
        .bind(effective_from)
        .bind(effective_to)
        .bind(&notes)
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(config)
    }

    /// Delete a config
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM store_loss_config WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Loss-rate config".to_string()));
        }

        Ok(())
    }

    /// All configs of a store effective today
    pub async fn current_configs(
        &self,
        store_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Vec<LossRateConfig>> {
        let configs = sqlx::query_as::<_, LossRateConfig>(
            r#"
            SELECT id, store_id, product_category, loss_rate, effective_from, effective_to,
                   notes, created_by, created_at, updated_at
            FROM store_loss_config
            WHERE store_id = $1
              AND effective_from <= $2
              AND (effective_to IS NULL OR effective_to >= $2)
            ORDER BY product_category ASC
            "#,
        )
        .bind(store_id)
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        Ok(configs)
    }
}
