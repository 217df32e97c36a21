//! Inventory document posting and the append-only ledger write path
//!
//! Every accepted document writes one ledger row per line item inside the
//! same transaction as the document itself; a document without its ledger
//! rows would corrupt the ledger's single-source-of-truth role. Ledger rows
//! are never updated; undoing a document deletes its rows by reference.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock_calculator::StockCalculatorService;
use shared::petroleum::{self, DocumentCalculation, DocumentCompartment};
use shared::validation::validate_quantity;

/// Inventory service for document posting and ledger maintenance
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    stock_calculator: StockCalculatorService,
}

/// Inventory document types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "inventory_doc_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocType {
    Import,
    Export,
    TransferIn,
    TransferOut,
    Adjustment,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Import => "IMPORT",
            DocType::Export => "EXPORT",
            DocType::TransferIn => "TRANSFER_IN",
            DocType::TransferOut => "TRANSFER_OUT",
            DocType::Adjustment => "ADJUSTMENT",
        }
    }

    /// Whether documents of this type add stock to the receiving warehouse
    pub fn is_inbound(&self) -> bool {
        matches!(self, DocType::Import | DocType::TransferIn)
    }
}

/// An inventory document header
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryDocument {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub doc_type: DocType,
    pub doc_date: NaiveDate,
    pub status: String,
    pub supplier_name: Option<String>,
    pub invoice_number: Option<String>,
    pub license_plate: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A document line item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryDocumentItem {
    pub id: Uuid,
    pub document_id: Uuid,
    pub product_id: Uuid,
    pub tank_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
}

/// A measured truck compartment persisted with a receiving document
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TruckCompartmentRecord {
    pub id: Uuid,
    pub document_id: Uuid,
    pub compartment_number: i32,
    pub product_id: Uuid,
    pub tank_id: Option<Uuid>,
    pub compartment_height: Option<Decimal>,
    pub truck_temperature: Decimal,
    pub truck_volume: Decimal,
    pub warehouse_height: Option<Decimal>,
    pub actual_temperature: Decimal,
    pub actual_volume: Decimal,
    pub received_volume: Decimal,
}

/// Input for posting a plain document
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentInput {
    pub warehouse_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub doc_type: DocType,
    pub doc_date: NaiveDate,
    #[validate(length(max = 255))]
    pub supplier_name: Option<String>,
    #[validate(length(max = 50))]
    pub invoice_number: Option<String>,
    #[validate(length(max = 20))]
    pub license_plate: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<DocumentItemInput>,
}

/// One line item of a document
#[derive(Debug, Deserialize)]
pub struct DocumentItemInput {
    pub product_id: Uuid,
    pub tank_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
}

/// Input for posting a tanker-truck receiving document
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTruckDocumentInput {
    pub warehouse_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub doc_date: NaiveDate,
    #[validate(length(max = 255))]
    pub supplier_name: Option<String>,
    #[validate(length(max = 50))]
    pub invoice_number: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub license_plate: String,
    pub notes: Option<String>,
    #[validate]
    pub compartments: Vec<TruckCompartmentInput>,
}

/// One measured compartment of a tanker truck (up to 7 per truck)
#[derive(Debug, Deserialize, Validate)]
pub struct TruckCompartmentInput {
    #[validate(range(min = 1, max = 7))]
    pub compartment_number: i32,
    pub product_id: Uuid,
    pub tank_id: Option<Uuid>,
    pub compartment_height: Option<Decimal>,
    pub truck_temperature: Decimal,
    pub truck_volume: Decimal,
    pub warehouse_height: Option<Decimal>,
    pub actual_temperature: Decimal,
    pub received_volume: Decimal,
}

/// A posted truck document with its measurement rows and loss calculation
#[derive(Debug, Serialize)]
pub struct TruckDocumentResult {
    pub document: InventoryDocument,
    pub compartments: Vec<TruckCompartmentRecord>,
    pub calculation: DocumentCalculation,
}

/// Full document detail
#[derive(Debug, Serialize)]
pub struct DocumentDetail {
    pub document: InventoryDocument,
    pub items: Vec<InventoryDocumentItem>,
    pub compartments: Vec<TruckCompartmentRecord>,
}

/// Filters for listing documents
#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    pub warehouse_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub doc_type: Option<DocType>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Input for the initial-stock workflow
#[derive(Debug, Deserialize)]
pub struct InitialStockInput {
    pub tank_id: Uuid,
    pub quantity: Decimal,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        let stock_calculator = StockCalculatorService::new(db.clone());
        Self {
            db,
            stock_calculator,
        }
    }

    /// Resolve the warehouse a document posts against
    async fn resolve_warehouse(
        &self,
        warehouse_id: Option<Uuid>,
        store_id: Option<Uuid>,
    ) -> AppResult<Uuid> {
        if let Some(id) = warehouse_id {
            return Ok(id);
        }

        let store_id = store_id.ok_or_else(|| AppError::Validation {
            field: "warehouse_id".to_string(),
            message: "Either warehouse_id or store_id must be provided".to_string(),
            message_vi: "Phải cung cấp warehouse_id hoặc store_id".to_string(),
        })?;

        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM warehouses WHERE store_id = $1 AND warehouse_type = 'STORE'",
        )
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    /// Run the advisory guards for one line item and act on the result
    async fn check_guards(&self, tank_id: Uuid, quantity: Decimal, inbound: bool) -> AppResult<()> {
        if inbound {
            let check = self
                .stock_calculator
                .will_exceed_capacity(tank_id, quantity)
                .await?;
            if check.will_exceed {
                return Err(AppError::CapacityExceeded(format!(
                    "tank {} has {} available, received {}",
                    tank_id, check.available, quantity
                )));
            }
        } else {
            let check = self.stock_calculator.can_export(tank_id, quantity).await?;
            if !check.can_export {
                return Err(AppError::InsufficientStock(format!(
                    "tank {} is short {} (current stock {})",
                    tank_id, check.shortage, check.current_stock
                )));
            }
        }
        Ok(())
    }

    async fn insert_ledger_row(
        tx: &mut Transaction<'_, Postgres>,
        warehouse_id: Uuid,
        product_id: Uuid,
        tank_id: Option<Uuid>,
        ref_type: &str,
        ref_id: Uuid,
        quantity: Decimal,
        inbound: bool,
    ) -> AppResult<()> {
        let (quantity_in, quantity_out) = if inbound {
            (quantity, Decimal::ZERO)
        } else {
            (Decimal::ZERO, quantity)
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_ledger
                (warehouse_id, product_id, tank_id, ref_type, ref_id, quantity_in, quantity_out)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(warehouse_id)
        .bind(product_id)
        .bind(tank_id)
        .bind(ref_type)
        .bind(ref_id)
        .bind(quantity_in)
        .bind(quantity_out)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Post a plain import/export/transfer/adjustment document.
    ///
    /// The document, its items, and its ledger rows are written in one
    /// transaction.
    pub async fn create_document(
        &self,
        user_id: Uuid,
        input: CreateDocumentInput,
    ) -> AppResult<InventoryDocument> {
        input.validate()?;
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Document must have at least one item".to_string(),
                message_vi: "Phiếu phải có ít nhất một dòng hàng".to_string(),
            });
        }
        for item in &input.items {
            if let Err(msg) = validate_quantity(item.quantity) {
                return Err(AppError::Validation {
                    field: "quantity".to_string(),
                    message: msg.to_string(),
                    message_vi: "Số lượng phải là số dương".to_string(),
                });
            }
        }

        let warehouse_id = self
            .resolve_warehouse(input.warehouse_id, input.store_id)
            .await?;

        let inbound = input.doc_type.is_inbound();
        for item in &input.items {
            if let Some(tank_id) = item.tank_id {
                self.check_guards(tank_id, item.quantity, inbound).await?;
            }
        }

        let mut tx = self.db.begin().await?;

        let document = sqlx::query_as::<_, InventoryDocument>(
            r#"
            INSERT INTO inventory_documents
                (warehouse_id, doc_type, doc_date, status, supplier_name, invoice_number,
                 license_plate, notes, created_by)
            VALUES ($1, $2, $3, 'COMPLETED', $4, $5, $6, $7, $8)
            RETURNING id, warehouse_id, doc_type, doc_date, status, supplier_name,
                      invoice_number, license_plate, notes, created_by, created_at
            "#,
        )
        .bind(warehouse_id)
        .bind(input.doc_type)
        .bind(input.doc_date)
        .bind(&input.supplier_name)
        .bind(&input.invoice_number)
        .bind(&input.license_plate)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO inventory_document_items
                    (document_id, product_id, tank_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(document.id)
            .bind(item.product_id)
            .bind(item.tank_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;

            Self::insert_ledger_row(
                &mut tx,
                warehouse_id,
                item.product_id,
                item.tank_id,
                input.doc_type.as_str(),
                document.id,
                item.quantity,
                inbound,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(document)
    }

    /// Post a tanker-truck receiving document.
    ///
    /// Runs the petroleum compensator over the measured compartments, then
    /// persists the document, the compartments, the document-level loss
    /// calculation, and one ledger row per compartment atomically.
    pub async fn create_truck_document(
        &self,
        user_id: Uuid,
        input: CreateTruckDocumentInput,
    ) -> AppResult<TruckDocumentResult> {
        input.validate()?;
        if input.compartments.is_empty() {
            return Err(AppError::BusinessRuleViolation {
                message: "A truck document must have at least one measured compartment"
                    .to_string(),
                message_vi: "Phiếu nhập xe téc phải có ít nhất một ngăn đo đạc".to_string(),
            });
        }
        for compartment in &input.compartments {
            if let Err(msg) = validate_quantity(compartment.truck_volume) {
                return Err(AppError::Validation {
                    field: "truck_volume".to_string(),
                    message: msg.to_string(),
                    message_vi: "Thể tích tại xe phải là số dương".to_string(),
                });
            }
            if compartment.received_volume < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "received_volume".to_string(),
                    message: "Received volume must not be negative".to_string(),
                    message_vi: "Lượng thực nhận không được âm".to_string(),
                });
            }
        }

        let warehouse_id = self
            .resolve_warehouse(input.warehouse_id, input.store_id)
            .await?;

        let product_ids: Vec<Uuid> = input.compartments.iter().map(|c| c.product_id).collect();
        let product_codes: std::collections::HashMap<Uuid, String> =
            sqlx::query_as::<_, (Uuid, String)>("SELECT id, code FROM products WHERE id = ANY($1)")
                .bind(&product_ids)
                .fetch_all(&self.db)
                .await?
                .into_iter()
                .collect();

        // Temperature compensation per compartment, then document totals
        let mut document_compartments = Vec::with_capacity(input.compartments.len());
        for compartment in &input.compartments {
            let code = product_codes
                .get(&compartment.product_id)
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            let calc = petroleum::calculate_compartment(
                compartment.truck_volume,
                compartment.truck_temperature,
                compartment.actual_temperature,
                code,
            );
            document_compartments.push(DocumentCompartment {
                truck_volume: compartment.truck_volume,
                actual_volume: calc.actual_volume,
                received_volume: compartment.received_volume,
                product_code: code.clone(),
            });
        }
        let calculation =
            petroleum::calculate_document(&document_compartments).map_err(|_| {
                AppError::BusinessRuleViolation {
                    message: "A truck document must have at least one measured compartment"
                        .to_string(),
                    message_vi: "Phiếu nhập xe téc phải có ít nhất một ngăn đo đạc".to_string(),
                }
            })?;

        for compartment in &input.compartments {
            if let Some(tank_id) = compartment.tank_id {
                self.check_guards(tank_id, compartment.received_volume, true)
                    .await?;
            }
        }

        let mut tx = self.db.begin().await?;

        let document = sqlx::query_as::<_, InventoryDocument>(
            r#"
            INSERT INTO inventory_documents
                (warehouse_id, doc_type, doc_date, status, supplier_name, invoice_number,
                 license_plate, notes, created_by)
            VALUES ($1, 'IMPORT', $2, 'COMPLETED', $3, $4, $5, $6, $7)
            RETURNING id, warehouse_id, doc_type, doc_date, status, supplier_name,
                      invoice_number, license_plate, notes, created_by, created_at
            "#,
        )
        .bind(warehouse_id)
        .bind(input.doc_date)
        .bind(&input.supplier_name)
        .bind(&input.invoice_number)
        .bind(&input.license_plate)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut compartment_records = Vec::with_capacity(input.compartments.len());
        for (compartment, derived) in input.compartments.iter().zip(&document_compartments) {
            let record = sqlx::query_as::<_, TruckCompartmentRecord>(
                r#"
                INSERT INTO inventory_truck_compartments
                    (document_id, compartment_number, product_id, tank_id, compartment_height,
                     truck_temperature, truck_volume, warehouse_height, actual_temperature,
                     actual_volume, received_volume)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING id, document_id, compartment_number, product_id, tank_id,
                          compartment_height, truck_temperature, truck_volume, warehouse_height,
                          actual_temperature, actual_volume, received_volume
                "#,
            )
            .bind(document.id)
            .bind(compartment.compartment_number)
            .bind(compartment.product_id)
            .bind(compartment.tank_id)
            .bind(compartment.compartment_height)
            .bind(compartment.truck_temperature)
            .bind(compartment.truck_volume)
            .bind(compartment.warehouse_height)
            .bind(compartment.actual_temperature)
            .bind(derived.actual_volume)
            .bind(compartment.received_volume)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO inventory_document_items
                    (document_id, product_id, tank_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, NULL)
                "#,
            )
            .bind(document.id)
            .bind(compartment.product_id)
            .bind(compartment.tank_id)
            .bind(compartment.received_volume)
            .execute(&mut *tx)
            .await?;

            Self::insert_ledger_row(
                &mut tx,
                warehouse_id,
                compartment.product_id,
                compartment.tank_id,
                DocType::Import.as_str(),
                document.id,
                compartment.received_volume,
                true,
            )
            .await?;

            compartment_records.push(record);
        }

        sqlx::query(
            r#"
            INSERT INTO inventory_loss_calculations
                (document_id, expansion_coefficient, loss_coefficient, total_truck_volume,
                 total_actual_volume, total_received_volume, total_loss_volume,
                 allowed_loss_volume, excess_shortage_volume, temperature_adjustment_volume,
                 status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(document.id)
        .bind(calculation.expansion_coefficient)
        .bind(calculation.loss_coefficient)
        .bind(calculation.total_truck_volume)
        .bind(calculation.total_actual_volume)
        .bind(calculation.total_received_volume)
        .bind(calculation.total_loss_volume)
        .bind(calculation.allowed_loss_volume)
        .bind(calculation.excess_shortage_volume)
        .bind(calculation.temperature_adjustment_volume)
        .bind(calculation.status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(TruckDocumentResult {
            document,
            compartments: compartment_records,
            calculation,
        })
    }

    /// Administrative reversal: delete a document together with its ledger
    /// rows, restoring the pre-posting state
    pub async fn delete_document(&self, document_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM inventory_ledger WHERE ref_id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM inventory_documents WHERE id = $1")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory document".to_string()));
        }

        tx.commit().await?;

        Ok(())
    }

    /// List documents with optional filters
    pub async fn list_documents(
        &self,
        query: &DocumentListQuery,
    ) -> AppResult<Vec<InventoryDocument>> {
        let documents = sqlx::query_as::<_, InventoryDocument>(
            r#"
            SELECT d.id, d.warehouse_id, d.doc_type, d.doc_date, d.status, d.supplier_name,
                   d.invoice_number, d.license_plate, d.notes, d.created_by, d.created_at
            FROM inventory_documents d
            LEFT JOIN warehouses w ON w.id = d.warehouse_id
            WHERE ($1::uuid IS NULL OR d.warehouse_id = $1)
              AND ($2::uuid IS NULL OR w.store_id = $2)
              AND ($3::inventory_doc_type IS NULL OR d.doc_type = $3)
              AND ($4::date IS NULL OR d.doc_date >= $4)
              AND ($5::date IS NULL OR d.doc_date <= $5)
            ORDER BY d.doc_date DESC, d.created_at DESC
            "#,
        )
        .bind(query.warehouse_id)
        .bind(query.store_id)
        .bind(query.doc_type)
        .bind(query.from_date)
        .bind(query.to_date)
        .fetch_all(&self.db)
        .await?;

        Ok(documents)
    }

    /// Full detail of one document
    pub async fn get_document(&self, document_id: Uuid) -> AppResult<DocumentDetail> {
        let document = sqlx::query_as::<_, InventoryDocument>(
            r#"
            SELECT id, warehouse_id, doc_type, doc_date, status, supplier_name,
                   invoice_number, license_plate, notes, created_by, created_at
            FROM inventory_documents
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory document".to_string()))?;

        let items = sqlx::query_as::<_, InventoryDocumentItem>(
            r#"
            SELECT id, document_id, product_id, tank_id, quantity, unit_price
            FROM inventory_document_items
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.db)
        .await?;

        let compartments = sqlx::query_as::<_, TruckCompartmentRecord>(
            r#"
            SELECT id, document_id, compartment_number, product_id, tank_id,
                   compartment_height, truck_temperature, truck_volume, warehouse_height,
                   actual_temperature, actual_volume, received_volume
            FROM inventory_truck_compartments
            WHERE document_id = $1
            ORDER BY compartment_number
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.db)
        .await?;

        Ok(DocumentDetail {
            document,
            items,
            compartments,
        })
    }

    /// Initial-stock workflow: write the tank baseline once.
    ///
    /// The baseline is the starting point before any ledger history exists;
    /// once the tank has ledger entries, all change goes through documents.
    pub async fn set_initial_stock(&self, input: InitialStockInput) -> AppResult<()> {
        if input.quantity < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Initial stock must not be negative".to_string(),
                message_vi: "Tồn kho ban đầu không được âm".to_string(),
            });
        }

        let has_history = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_ledger WHERE tank_id = $1)",
        )
        .bind(input.tank_id)
        .fetch_one(&self.db)
        .await?;

        if has_history {
            return Err(AppError::BusinessRuleViolation {
                message: "Initial stock can only be set before the tank has ledger history"
                    .to_string(),
                message_vi: "Chỉ được nhập tồn ban đầu khi bể chưa có giao dịch".to_string(),
            });
        }

        let result = sqlx::query("UPDATE tanks SET current_stock = $1 WHERE id = $2")
            .bind(input.quantity)
            .bind(input.tank_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Tank".to_string()));
        }

        Ok(())
    }
}
