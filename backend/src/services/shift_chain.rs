//! Shift-chain backfill
//!
//! Walks every shift in chronological order per store and rebuilds each
//! shift's opening-stock snapshot: the previous shift's opening plus its
//! ledger movement gives its closing, which becomes this shift's opening.
//! The first shift of a store's chain opens at the tank baseline. The
//! snapshot is a derived cache; this pass recomputes it from scratch.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::OpeningStockItem;

/// One-shot shift-chain backfill service
#[derive(Clone)]
pub struct ShiftChainService {
    db: PgPool,
}

/// Counters reported after a backfill run
#[derive(Debug, Default, Clone, Copy)]
pub struct BackfillSummary {
    pub shifts_processed: u64,
    pub shifts_updated: u64,
    pub shifts_skipped: u64,
}

#[derive(Debug, FromRow)]
struct ShiftRow {
    id: Uuid,
    store_id: Uuid,
    shift_no: i32,
    shift_date: NaiveDate,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
}

impl ShiftChainService {
    /// Create a new ShiftChainService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Rebuild the opening-stock snapshot of every shift, in
    /// (store, date, shift number) order.
    ///
    /// Stores without a warehouse are logged and skipped; the batch runs to
    /// completion regardless.
    pub async fn backfill_opening_stock(&self) -> AppResult<BackfillSummary> {
        let shifts = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT id, store_id, shift_no, shift_date
            FROM shifts
            ORDER BY store_id, shift_date, shift_no
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let products = sqlx::query_as::<_, ProductRow>(
            "SELECT id, code, name FROM products ORDER BY code",
        )
        .fetch_all(&self.db)
        .await?;

        tracing::info!(shifts = shifts.len(), "Starting opening-stock backfill");

        // Single-writer, single-pass: this map holds each shift's freshly
        // computed snapshot so later shifts chain off it without re-reading
        // storage.
        let mut computed: HashMap<Uuid, Vec<OpeningStockItem>> = HashMap::new();
        let mut warehouses: HashMap<Uuid, Option<Uuid>> = HashMap::new();
        let mut seen_stores: HashSet<Uuid> = HashSet::new();
        let mut summary = BackfillSummary::default();

        for index in 0..shifts.len() {
            let shift = &shifts[index];
            summary.shifts_processed += 1;

            let warehouse_id = match warehouses.entry(shift.store_id) {
                std::collections::hash_map::Entry::Occupied(entry) => *entry.get(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let id = sqlx::query_scalar::<_, Uuid>(
                        "SELECT id FROM warehouses WHERE store_id = $1 AND warehouse_type = 'STORE'",
                    )
                    .bind(shift.store_id)
                    .fetch_optional(&self.db)
                    .await?;
                    *entry.insert(id)
                }
            };

            let warehouse_id = match warehouse_id {
                Some(id) => id,
                None => {
                    tracing::warn!(
                        store_id = %shift.store_id,
                        shift_id = %shift.id,
                        "Store has no warehouse, skipping shift"
                    );
                    summary.shifts_skipped += 1;
                    continue;
                }
            };

            let is_first_in_store = seen_stores.insert(shift.store_id);

            // Nearest earlier shift in the same store
            let previous = shifts[..index]
                .iter()
                .rev()
                .find(|s| s.store_id == shift.store_id);

            let mut items: Vec<OpeningStockItem> = Vec::new();
            for product in &products {
                let opening_stock = match previous {
                    Some(prev) => {
                        let prev_opening = computed
                            .get(&prev.id)
                            .and_then(|list| list.iter().find(|x| x.product_id == product.id))
                            .map(|x| x.opening_stock)
                            .unwrap_or(Decimal::ZERO);

                        let (prev_import, prev_export) = self
                            .shift_ledger_totals(product.id, warehouse_id, prev.id)
                            .await?;

                        prev_opening + prev_import - prev_export
                    }
                    None => self.baseline_stock(product.id, shift.store_id).await?,
                };

                // Zero-stock products are noise mid-chain, but the first
                // shift is always persisted to mark the chain's start.
                if opening_stock != Decimal::ZERO || is_first_in_store {
                    items.push(OpeningStockItem {
                        product_id: product.id,
                        product_code: product.code.clone(),
                        product_name: product.name.clone(),
                        opening_stock,
                    });
                }
            }

            if !items.is_empty() {
                let snapshot = serde_json::to_value(&items)
                    .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;
                sqlx::query("UPDATE shifts SET opening_stock_json = $1 WHERE id = $2")
                    .bind(snapshot)
                    .bind(shift.id)
                    .execute(&self.db)
                    .await?;

                summary.shifts_updated += 1;
                tracing::debug!(
                    shift_no = shift.shift_no,
                    shift_date = %shift.shift_date,
                    products = items.len(),
                    "Backfilled shift opening stock"
                );
            }

            computed.insert(shift.id, items);
        }

        tracing::info!(
            processed = summary.shifts_processed,
            updated = summary.shifts_updated,
            skipped = summary.shifts_skipped,
            "Opening-stock backfill finished"
        );

        Ok(summary)
    }

    /// Import/export of one product booked against one shift
    async fn shift_ledger_totals(
        &self,
        product_id: Uuid,
        warehouse_id: Uuid,
        shift_id: Uuid,
    ) -> AppResult<(Decimal, Decimal)> {
        let totals = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(quantity_in), 0), COALESCE(SUM(quantity_out), 0)
            FROM inventory_ledger
            WHERE product_id = $1
              AND warehouse_id = $2
              AND shift_id = $3
              AND superseded_by_shift_id IS NULL
            "#,
        )
        .bind(product_id)
        .bind(warehouse_id)
        .bind(shift_id)
        .fetch_one(&self.db)
        .await?;

        Ok(totals)
    }

    /// Tank baseline of one product in one store, for the first shift of a
    /// chain
    async fn baseline_stock(&self, product_id: Uuid, store_id: Uuid) -> AppResult<Decimal> {
        let baseline = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(current_stock), 0)
            FROM tanks
            WHERE product_id = $1 AND store_id = $2
            "#,
        )
        .bind(product_id)
        .bind(store_id)
        .fetch_one(&self.db)
        .await?;

        Ok(baseline)
    }
}
