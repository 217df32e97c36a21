//! Stock derivation from the inventory ledger
//!
//! The ledger is the single source of truth for stock: every balance is
//! `Σ(quantity_in − quantity_out)` over non-superseded entries, recomputed on
//! demand and never stored. Entries with `superseded_by_shift_id` set were
//! corrected by a later shift-scoped record and are excluded from every sum.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock calculator for tanks, warehouses, and stores
#[derive(Clone)]
pub struct StockCalculatorService {
    db: PgPool,
}

/// Per-product balance within a warehouse
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductStock {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub balance: Decimal,
}

/// Per-tank stock with capacity utilisation
#[derive(Debug, Clone, Serialize)]
pub struct TankStock {
    pub tank_id: Uuid,
    pub tank_code: String,
    pub tank_name: String,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub capacity: Decimal,
    pub current_stock: Decimal,
    pub fill_percentage: Decimal,
}

/// Per-(tank, product) balance within a warehouse
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TankProductStock {
    pub tank_id: Option<Uuid>,
    pub tank_code: Option<String>,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub balance: Decimal,
}

/// Advisory result of an export check; the caller decides how to act on it
#[derive(Debug, Clone, Serialize)]
pub struct ExportCheck {
    pub can_export: bool,
    pub current_stock: Decimal,
    pub shortage: Decimal,
}

/// Advisory result of a capacity check
#[derive(Debug, Clone, Serialize)]
pub struct CapacityCheck {
    pub will_exceed: bool,
    pub current_stock: Decimal,
    pub capacity: Decimal,
    pub available: Decimal,
}

#[derive(Debug, FromRow)]
struct TankStockRow {
    tank_id: Uuid,
    tank_code: String,
    tank_name: String,
    product_id: Uuid,
    product_code: String,
    product_name: String,
    capacity: Decimal,
    current_stock: Decimal,
}

impl StockCalculatorService {
    /// Create a new StockCalculatorService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current stock of a single tank; zero when the tank has no history
    pub async fn get_tank_stock(
        &self,
        tank_id: Uuid,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity_in - quantity_out), 0)
            FROM inventory_ledger
            WHERE tank_id = $1
              AND superseded_by_shift_id IS NULL
              AND ($2::timestamptz IS NULL OR created_at < $2)
            "#,
        )
        .bind(tank_id)
        .bind(as_of)
        .fetch_one(&self.db)
        .await?;

        Ok(balance)
    }

    /// Current stock of several tanks at once; tanks without entries map to
    /// zero
    pub async fn get_tanks_stock(&self, tank_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Decimal>> {
        if tank_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, Decimal)>(
            r#"
            SELECT tank_id, COALESCE(SUM(quantity_in - quantity_out), 0) AS balance
            FROM inventory_ledger
            WHERE tank_id = ANY($1)
              AND superseded_by_shift_id IS NULL
            GROUP BY tank_id
            "#,
        )
        .bind(tank_ids)
        .fetch_all(&self.db)
        .await?;

        let mut stock: HashMap<Uuid, Decimal> = rows.into_iter().collect();
        for tank_id in tank_ids {
            stock.entry(*tank_id).or_insert(Decimal::ZERO);
        }

        Ok(stock)
    }

    /// Stock of one product in one warehouse
    pub async fn get_warehouse_product_stock(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity_in - quantity_out), 0)
            FROM inventory_ledger
            WHERE warehouse_id = $1
              AND product_id = $2
              AND superseded_by_shift_id IS NULL
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        )
        .bind(warehouse_id)
        .bind(product_id)
        .bind(as_of)
        .fetch_one(&self.db)
        .await?;

        Ok(balance)
    }

    /// All product balances in a warehouse; products with zero balance are
    /// dropped
    pub async fn get_warehouse_stock(&self, warehouse_id: Uuid) -> AppResult<Vec<ProductStock>> {
        let rows = sqlx::query_as::<_, ProductStock>(
            r#"
            SELECT il.product_id,
                   p.code AS product_code,
                   p.name AS product_name,
                   COALESCE(SUM(il.quantity_in - il.quantity_out), 0) AS balance
            FROM inventory_ledger il
            LEFT JOIN products p ON p.id = il.product_id
            WHERE il.warehouse_id = $1
              AND il.superseded_by_shift_id IS NULL
            GROUP BY il.product_id, p.code, p.name
            HAVING COALESCE(SUM(il.quantity_in - il.quantity_out), 0) <> 0
            ORDER BY p.code
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Stock of every active tank in a store, with capacity utilisation
    pub async fn get_store_tanks_stock(&self, store_id: Uuid) -> AppResult<Vec<TankStock>> {
        let rows = sqlx::query_as::<_, TankStockRow>(
            r#"
            SELECT t.id AS tank_id,
                   t.tank_code,
                   t.name AS tank_name,
                   p.id AS product_id,
                   p.code AS product_code,
                   p.name AS product_name,
                   t.capacity,
                   COALESCE(SUM(il.quantity_in - il.quantity_out), 0) AS current_stock
            FROM tanks t
            JOIN products p ON p.id = t.product_id
            LEFT JOIN inventory_ledger il
                ON il.tank_id = t.id AND il.superseded_by_shift_id IS NULL
            WHERE t.store_id = $1
              AND t.is_active = TRUE
            GROUP BY t.id, t.tank_code, t.name, p.id, p.code, p.name, t.capacity
            ORDER BY t.tank_code
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let fill_percentage = if row.capacity > Decimal::ZERO {
                    row.current_stock / row.capacity * Decimal::ONE_HUNDRED
                } else {
                    Decimal::ZERO
                };
                TankStock {
                    tank_id: row.tank_id,
                    tank_code: row.tank_code,
                    tank_name: row.tank_name,
                    product_id: row.product_id,
                    product_code: row.product_code,
                    product_name: row.product_name,
                    capacity: row.capacity,
                    current_stock: row.current_stock,
                    fill_percentage,
                }
            })
            .collect())
    }

    /// Warehouse balances broken down by tank; zero balances are dropped
    pub async fn get_warehouse_stock_by_tank(
        &self,
        warehouse_id: Uuid,
    ) -> AppResult<Vec<TankProductStock>> {
        let rows = sqlx::query_as::<_, TankProductStock>(
            r#"
            SELECT il.tank_id,
                   t.tank_code,
                   il.product_id,
                   p.code AS product_code,
                   p.name AS product_name,
                   COALESCE(SUM(il.quantity_in - il.quantity_out), 0) AS balance
            FROM inventory_ledger il
            LEFT JOIN tanks t ON t.id = il.tank_id
            LEFT JOIN products p ON p.id = il.product_id
            WHERE il.warehouse_id = $1
              AND il.superseded_by_shift_id IS NULL
            GROUP BY il.tank_id, t.tank_code, il.product_id, p.code, p.name
            HAVING COALESCE(SUM(il.quantity_in - il.quantity_out), 0) <> 0
            ORDER BY t.tank_code
            "#,
        )
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Advisory check: is there enough stock in the tank for this export?
    pub async fn can_export(&self, tank_id: Uuid, quantity: Decimal) -> AppResult<ExportCheck> {
        let current_stock = self.get_tank_stock(tank_id, None).await?;
        let can_export = current_stock >= quantity;
        let shortage = if can_export {
            Decimal::ZERO
        } else {
            quantity - current_stock
        };

        Ok(ExportCheck {
            can_export,
            current_stock,
            shortage,
        })
    }

    /// Advisory check: would receiving this quantity overflow the tank?
    pub async fn will_exceed_capacity(
        &self,
        tank_id: Uuid,
        additional_quantity: Decimal,
    ) -> AppResult<CapacityCheck> {
        let current_stock = self.get_tank_stock(tank_id, None).await?;

        let capacity = sqlx::query_scalar::<_, Decimal>("SELECT capacity FROM tanks WHERE id = $1")
            .bind(tank_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Tank".to_string()))?;

        Ok(CapacityCheck {
            will_exceed: current_stock + additional_quantity > capacity,
            current_stock,
            capacity,
            available: capacity - current_stock,
        })
    }
}
