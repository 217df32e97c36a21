//! Business logic services for the Fuel Depot Management Platform

pub mod closing;
pub mod inventory;
pub mod loss_config;
pub mod report;
pub mod shift_chain;
pub mod stock_calculator;

pub use closing::InventoryClosingService;
pub use inventory::InventoryService;
pub use loss_config::LossConfigService;
pub use report::InventoryReportService;
pub use shift_chain::ShiftChainService;
pub use stock_calculator::StockCalculatorService;
