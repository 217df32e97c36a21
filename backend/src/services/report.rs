//! Segmented inventory reporting
//!
//! Reconstructs an arbitrary date range as alternating CLOSED and OPEN
//! sub-periods. CLOSED segments are read verbatim from closing snapshots;
//! frozen data is never recomputed. OPEN segments are derived live from the
//! ledger, carrying each tank's balance across segment boundaries.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::closing::{ClosingDetail, InventoryClosingService};
use crate::models::ClosingItem;
use shared::periods::{day_end_exclusive, day_start, split_range, ClosedPeriod, SegmentBounds};
use shared::types::SegmentType;
use shared::validation::validate_date_range;

/// Segmented report service
#[derive(Clone)]
pub struct InventoryReportService {
    db: PgPool,
    closing: InventoryClosingService,
}

/// A tank listed in the report header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportTank {
    pub tank_id: Uuid,
    pub tank_code: String,
    pub tank_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_category: String,
}

/// One CLOSED or OPEN sub-period of the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportPeriod {
    pub segment_type: SegmentType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub items: Vec<ClosingItem>,
}

/// The assembled report
#[derive(Debug, Clone, Serialize)]
pub struct SegmentedReport {
    pub store_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub tanks: Vec<ReportTank>,
    pub periods: Vec<ReportPeriod>,
}

#[derive(Debug, FromRow)]
struct PrecedingClosing {
    period_to: NaiveDate,
    closing_balance: Decimal,
    closing_date: DateTime<Utc>,
}

impl InventoryReportService {
    /// Create a new InventoryReportService instance
    pub fn new(db: PgPool) -> Self {
        let closing = InventoryClosingService::new(db.clone());
        Self { db, closing }
    }

    /// Reconstruct `[from_date, to_date]` for a store as CLOSED and OPEN
    /// segments with per-tank items.
    pub async fn get_segmented_report(
        &self,
        store_id: Uuid,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> AppResult<SegmentedReport> {
        if let Err(msg) = validate_date_range(from_date, to_date) {
            return Err(AppError::Validation {
                field: "from_date".to_string(),
                message: msg.to_string(),
                message_vi: "Từ ngày phải trước hoặc bằng đến ngày".to_string(),
            });
        }

        let store_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
                .bind(store_id)
                .fetch_one(&self.db)
                .await?;
        if !store_exists {
            return Err(AppError::NotFound(format!("Store {}", store_id)));
        }

        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM warehouses WHERE store_id = $1 AND warehouse_type = 'STORE'",
        )
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Warehouse for store {}", store_id)))?;

        let tanks = sqlx::query_as::<_, ReportTank>(
            r#"
            SELECT t.id AS tank_id, t.tank_code, t.name AS tank_name,
                   t.product_id, p.name AS product_name, p.category AS product_category
            FROM tanks t
            JOIN products p ON p.id = t.product_id
            WHERE t.store_id = $1 AND t.is_active = TRUE
            ORDER BY t.tank_code ASC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        // Snapshots overlapping the range, already ordered by period_from
        let closings = self
            .closing
            .list_closings(store_id, Some(from_date), Some(to_date))
            .await?;

        let mut closed_periods: Vec<ClosedPeriod> = Vec::new();
        for closing in &closings {
            let period = ClosedPeriod {
                period_from: closing.period_from,
                period_to: closing.period_to,
            };
            if closed_periods.last() != Some(&period) {
                closed_periods.push(period);
            }
        }

        let segments = split_range(from_date, to_date, &closed_periods);

        let mut periods = Vec::with_capacity(segments.len());
        for segment in &segments {
            let items = match segment.segment_type {
                SegmentType::Closed => {
                    Self::closed_items(&closings, &closed_periods, segment)
                }
                SegmentType::Open => {
                    self.open_items(&tanks, warehouse_id, segment).await?
                }
            };

            periods.push(ReportPeriod {
                segment_type: segment.segment_type,
                from_date: segment.from,
                to_date: segment.to,
                items,
            });
        }

        Ok(SegmentedReport {
            store_id,
            from_date,
            to_date,
            tanks,
            periods,
        })
    }

    /// Items of a CLOSED segment, copied verbatim from the snapshot rows
    fn closed_items(
        closings: &[ClosingDetail],
        closed_periods: &[ClosedPeriod],
        segment: &SegmentBounds,
    ) -> Vec<ClosingItem> {
        let period = match segment.closed_index.and_then(|i| closed_periods.get(i)) {
            Some(period) => *period,
            None => return Vec::new(),
        };

        closings
            .iter()
            .filter(|c| c.period_from == period.period_from && c.period_to == period.period_to)
            .map(|c| ClosingItem {
                tank_id: c.tank_id,
                tank_code: c.tank_code.clone(),
                tank_name: c.tank_name.clone(),
                product_id: c.product_id,
                product_name: c.product_name.clone(),
                product_category: c.product_category.clone().unwrap_or_default(),
                opening_balance: c.opening_balance,
                import_quantity: c.import_quantity,
                export_quantity: c.export_quantity,
                loss_rate: c.loss_rate,
                loss_amount: c.loss_amount,
                closing_balance: c.closing_balance,
                loss_config_id: c.loss_config_id,
            })
            .collect()
    }

    /// Items of an OPEN segment, summed live from the ledger
    async fn open_items(
        &self,
        tanks: &[ReportTank],
        warehouse_id: Uuid,
        segment: &SegmentBounds,
    ) -> AppResult<Vec<ClosingItem>> {
        let mut items = Vec::with_capacity(tanks.len());

        for tank in tanks {
            let preceding = self.preceding_closing(tank.tank_id, segment.from).await?;

            let opening_balance = match &preceding {
                Some(closing) if closing.period_to.succ_opt() == Some(segment.from) => {
                    closing.closing_balance
                }
                _ => {
                    self.closing
                        .get_opening_balance(tank.tank_id, segment.from, warehouse_id)
                        .await?
                }
            };

            // A closing executed mid-day freezes everything it saw; entries
            // recorded before that instant on the same date must not count
            // into the open segment as well.
            let lower_bound = match &preceding {
                Some(closing) if closing.closing_date.date_naive() == segment.from => {
                    closing.closing_date
                }
                _ => day_start(segment.from),
            };
            let upper_bound = day_end_exclusive(segment.to);

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
            .bind(tank.tank_id)
            .bind(lower_bound)
            .bind(upper_bound)
            .fetch_one(&self.db)
            .await?;

            items.push(ClosingItem {
                tank_id: tank.tank_id,
                tank_code: tank.tank_code.clone(),
                tank_name: tank.tank_name.clone(),
                product_id: tank.product_id,
                product_name: tank.product_name.clone(),
                product_category: tank.product_category.clone(),
                opening_balance,
                import_quantity,
                export_quantity,
                loss_rate: Decimal::ZERO,
                loss_amount: Decimal::ZERO,
                closing_balance: opening_balance + import_quantity - export_quantity,
                loss_config_id: None,
            });
        }

        Ok(items)
    }

    /// The latest closing of a tank ending before `date`
    async fn preceding_closing(
        &self,
        tank_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Option<PrecedingClosing>> {
        let closing = sqlx::query_as::<_, PrecedingClosing>(
            r#"
            SELECT period_to, closing_balance, closing_date
            FROM inventory_closing
            WHERE tank_id = $1 AND period_to < $2
            ORDER BY period_to DESC
            LIMIT 1
            "#,
        )
        .bind(tank_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(closing)
    }
}
