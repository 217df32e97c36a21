//! Period closing for tank inventory
//!
//! A closing freezes each tank's opening balance, in-period movement,
//! physical loss, and closing balance for a date range. Snapshots are
//! immutable once written: the only mutation is deleting the most recently
//! closed period, which keeps the opening-balance chain intact.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::loss_config::LossConfigService;
use crate::models::{ClosingItem, ClosingPreview};
use shared::periods::{day_end_exclusive, day_start};
use shared::types::ProductCategory;
use shared::validation::validate_date_range;

/// Period-closing service
#[derive(Clone)]
pub struct InventoryClosingService {
    db: PgPool,
    loss_config: LossConfigService,
}

/// One persisted closing snapshot row (one per store, tank, period).
///
/// Invariant: `closing_balance = opening_balance + import_quantity
/// − export_quantity − loss_amount`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryClosing {
    pub id: Uuid,
    pub store_id: Uuid,
    pub tank_id: Uuid,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub closing_date: DateTime<Utc>,
    pub opening_balance: Decimal,
    pub import_quantity: Decimal,
    pub export_quantity: Decimal,
    pub loss_rate: Decimal,
    pub loss_amount: Decimal,
    pub closing_balance: Decimal,
    pub loss_config_id: Option<Uuid>,
    pub product_category: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Snapshot row joined with tank and product names for display
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClosingDetail {
    pub id: Uuid,
    pub store_id: Uuid,
    pub tank_id: Uuid,
    pub tank_code: String,
    pub tank_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub closing_date: DateTime<Utc>,
    pub opening_balance: Decimal,
    pub import_quantity: Decimal,
    pub export_quantity: Decimal,
    pub loss_rate: Decimal,
    pub loss_amount: Decimal,
    pub closing_balance: Decimal,
    pub loss_config_id: Option<Uuid>,
    pub product_category: Option<String>,
}

/// A distinct closed period of one store
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClosingPeriod {
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub closing_date: DateTime<Utc>,
}

/// Request to preview or execute a closing
#[derive(Debug, Clone, Deserialize)]
pub struct ClosingRequest {
    pub store_id: Uuid,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct TankRow {
    id: Uuid,
    tank_code: String,
    name: String,
    product_id: Uuid,
    product_name: String,
    product_category: String,
}

impl InventoryClosingService {
    /// Create a new InventoryClosingService instance
    pub fn new(db: PgPool) -> Self {
        let loss_config = LossConfigService::new(db.clone());
        Self { db, loss_config }
    }

    /// Opening balance of a tank at the start of `period_from`.
    ///
    /// The latest snapshot ending before the period provides it in one chain
    /// lookup; only tanks that were never closed fall back to the baseline
    /// plus the full ledger history before the period.
    pub async fn get_opening_balance(
        &self,
        tank_id: Uuid,
        period_from: NaiveDate,
        warehouse_id: Uuid,
    ) -> AppResult<Decimal> {
        let last_closing = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT closing_balance
            FROM inventory_closing
            WHERE tank_id = $1 AND period_to < $2
            ORDER BY period_to DESC
            LIMIT 1
            "#,
        )
        .bind(tank_id)
        .bind(period_from)
        .fetch_optional(&self.db)
        .await?;

        if let Some(balance) = last_closing {
            return Ok(balance);
        }

        let baseline = sqlx::query_scalar::<_, Decimal>(
            "SELECT current_stock FROM tanks WHERE id = $1",
        )
        .bind(tank_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tank".to_string()))?;

        let ledger_delta = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity_in - quantity_out), 0)
            FROM inventory_ledger
            WHERE warehouse_id = $1
              AND tank_id = $2
              AND superseded_by_shift_id IS NULL
              AND created_at < $3
            "#,
        )
        .bind(warehouse_id)
        .bind(tank_id)
        .bind(day_start(period_from))
        .fetch_one(&self.db)
        .await?;

        Ok(baseline + ledger_delta)
    }

    /// Compute the closing for every active tank of the store without
    /// persisting anything.
    ///
    /// Fails with a conflict when the exact (store, period_from, period_to)
    /// was already closed.
    pub async fn preview_closing(&self, request: &ClosingRequest) -> AppResult<ClosingPreview> {
        if let Err(msg) = validate_date_range(request.period_from, request.period_to) {
            return Err(AppError::Validation {
                field: "period_from".to_string(),
                message: msg.to_string(),
                message_vi: "Từ ngày phải trước hoặc bằng đến ngày".to_string(),
            });
        }

        let store = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM stores WHERE id = $1",
        )
        .bind(request.store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Store {}", request.store_id)))?;

        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM warehouses WHERE store_id = $1 AND warehouse_type = 'STORE'",
        )
        .bind(request.store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Warehouse for store {}", request.store_id)))?;

        let already_closed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM inventory_closing
                WHERE store_id = $1 AND period_from = $2 AND period_to = $3
            )
            "#,
        )
        .bind(request.store_id)
        .bind(request.period_from)
        .bind(request.period_to)
        .fetch_one(&self.db)
        .await?;

        if already_closed {
            return Err(self.period_conflict(request.period_from, request.period_to));
        }

        let tanks = sqlx::query_as::<_, TankRow>(
            r#"
            SELECT t.id, t.tank_code, t.name, t.product_id,
                   p.name AS product_name, p.category AS product_category
            FROM tanks t
            JOIN products p ON p.id = t.product_id
            WHERE t.store_id = $1 AND t.is_active = TRUE
            ORDER BY t.tank_code ASC
            "#,
        )
        .bind(request.store_id)
        .fetch_all(&self.db)
        .await?;

        let period_start = day_start(request.period_from);
        let period_end = day_end_exclusive(request.period_to);

        let mut items = Vec::with_capacity(tanks.len());
        for tank in &tanks {
            let category = ProductCategory::from_str(&tank.product_category)
                .unwrap_or(ProductCategory::Gasoline);

            let opening_balance = self
                .get_opening_balance(tank.id, request.period_from, warehouse_id)
                .await?;

            let (import_quantity, export_quantity) = sqlx::query_as::<_, (Decimal, Decimal)>(
                r#"
                SELECT COALESCE(SUM(quantity_in), 0), COALESCE(SUM(quantity_out), 0)
                FROM inventory_ledger
                WHERE warehouse_id = $1
                  AND tank_id = $2
                  AND superseded_by_shift_id IS NULL
                  AND created_at >= $3
                  AND created_at < $4
                "#,
            )
            .bind(warehouse_id)
            .bind(tank.id)
            .bind(period_start)
            .bind(period_end)
            .fetch_one(&self.db)
            .await?;

            // Rate effective at the last day of the period
            let loss_config = self
                .loss_config
                .effective_config(request.store_id, category, request.period_to)
                .await?;
            let loss_rate = loss_config
                .as_ref()
                .map(|c| c.loss_rate)
                .unwrap_or(Decimal::ZERO);

            let loss_amount = export_quantity * loss_rate;
            let closing_balance =
                opening_balance + import_quantity - export_quantity - loss_amount;

            items.push(ClosingItem {
                tank_id: tank.id,
                tank_code: tank.tank_code.clone(),
                tank_name: tank.name.clone(),
                product_id: tank.product_id,
                product_name: tank.product_name.clone(),
                product_category: category.as_str().to_string(),
                opening_balance,
                import_quantity,
                export_quantity,
                loss_rate,
                loss_amount,
                closing_balance,
                loss_config_id: loss_config.map(|c| c.id),
            });
        }

        Ok(ClosingPreview {
            store_id: store.0,
            store_name: store.1,
            period_from: request.period_from,
            period_to: request.period_to,
            items,
        })
    }

    /// Execute a closing: re-run the preview against current ledger state and
    /// persist one snapshot row per tank, all or nothing.
    ///
    /// A unique index over (store, tank, period) turns a concurrent
    /// double-close into a conflict for the second writer; callers may retry
    /// once after re-fetching state.
    pub async fn execute_closing(
        &self,
        request: &ClosingRequest,
        user_id: Option<Uuid>,
    ) -> AppResult<Vec<InventoryClosing>> {
        let preview = self.preview_closing(request).await?;
        let closing_date = Utc::now();

        let mut tx = self.db.begin().await?;
        let mut closings = Vec::with_capacity(preview.items.len());

        for item in &preview.items {
            let closing = sqlx::query_as::<_, InventoryClosing>(
                r#"
                INSERT INTO inventory_closing
                    (store_id, tank_id, period_from, period_to, closing_date, opening_balance,
                     import_quantity, export_quantity, loss_rate, loss_amount, closing_balance,
                     loss_config_id, product_category, notes, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING id, store_id, tank_id, period_from, period_to, closing_date,
                          opening_balance, import_quantity, export_quantity, loss_rate,
                          loss_amount, closing_balance, loss_config_id, product_category,
                          notes, created_by, created_at
                "#,
            )
            .bind(request.store_id)
            .bind(item.tank_id)
            .bind(request.period_from)
            .bind(request.period_to)
            .bind(closing_date)
            .bind(item.opening_balance)
            .bind(item.import_quantity)
            .bind(item.export_quantity)
            .bind(item.loss_rate)
            .bind(item.loss_amount)
            .bind(item.closing_balance)
            .bind(item.loss_config_id)
            .bind(&item.product_category)
            .bind(&request.notes)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    self.period_conflict(request.period_from, request.period_to)
                }
                _ => AppError::from(err),
            })?;

            closings.push(closing);
        }

        tx.commit().await?;

        Ok(closings)
    }

    /// Closed snapshot rows of a store, optionally limited to periods
    /// overlapping [from_date, to_date]
    pub async fn list_closings(
        &self,
        store_id: Uuid,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> AppResult<Vec<ClosingDetail>> {
        let closings = sqlx::query_as::<_, ClosingDetail>(
            r#"
            SELECT ic.id, ic.store_id, ic.tank_id, t.tank_code, t.name AS tank_name,
                   t.product_id, p.name AS product_name,
                   ic.period_from, ic.period_to, ic.closing_date, ic.opening_balance,
                   ic.import_quantity, ic.export_quantity, ic.loss_rate, ic.loss_amount,
                   ic.closing_balance, ic.loss_config_id, ic.product_category
            FROM inventory_closing ic
            JOIN tanks t ON t.id = ic.tank_id
            JOIN products p ON p.id = t.product_id
            WHERE ic.store_id = $1
              AND ($2::date IS NULL OR ic.period_to >= $2)
              AND ($3::date IS NULL OR ic.period_from <= $3)
            ORDER BY ic.period_from ASC, t.tank_code ASC
            "#,
        )
        .bind(store_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(&self.db)
        .await?;

        Ok(closings)
    }

    /// Distinct closed periods of a store, newest first
    pub async fn list_closing_periods(&self, store_id: Uuid) -> AppResult<Vec<ClosingPeriod>> {
        let periods = sqlx::query_as::<_, ClosingPeriod>(
            r#"
            SELECT period_from, period_to, MAX(closing_date) AS closing_date
            FROM inventory_closing
            WHERE store_id = $1
            GROUP BY period_from, period_to
            ORDER BY period_from DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(periods)
    }

    /// Delete a closed period. Only the most recently closed period of the
    /// store may be deleted; anything earlier is pinned by the chain that
    /// later openings were derived from.
    pub async fn delete_closing(
        &self,
        store_id: Uuid,
        period_from: NaiveDate,
        period_to: NaiveDate,
    ) -> AppResult<()> {
        let latest_period_to = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(period_to) FROM inventory_closing WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_one(&self.db)
        .await?;

        let latest_period_to = match latest_period_to {
            Some(date) => date,
            None => return Err(AppError::NotFound("Closing period".to_string())),
        };

        if latest_period_to > period_to {
            return Err(AppError::BusinessRuleViolation {
                message: "Only the most recently closed period may be deleted".to_string(),
                message_vi: "Chỉ được phép xóa kỳ chốt mới nhất".to_string(),
            });
        }

        let result = sqlx::query(
            r#"
            DELETE FROM inventory_closing
            WHERE store_id = $1 AND period_from = $2 AND period_to = $3
            "#,
        )
        .bind(store_id)
        .bind(period_from)
        .bind(period_to)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Closing period".to_string()));
        }

        Ok(())
    }

    fn period_conflict(&self, period_from: NaiveDate, period_to: NaiveDate) -> AppError {
        AppError::Conflict {
            resource: "inventory_closing".to_string(),
            message: format!(
                "Period {} → {} has already been closed",
                period_from, period_to
            ),
            message_vi: format!("Kỳ {} → {} đã được chốt trước đó", period_from, period_to),
        }
    }
}
