use chrono::NaiveDate;

use crate::error::{Result, StoreError};

/// Flat purchase-order record; quantity and cost stay free-text numeric
/// strings and nothing is derived from them.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct PurchaseOrder {
    pub id: i32,
    pub order_date: NaiveDate,
    pub description: String,
    pub quantity: String,
    pub cost: String,
    pub contractor: String,
    pub site: String,
    pub company: String,
    pub supplier: String,
    pub worker: String,
    pub created_at: i64,
}

impl PurchaseOrder {
    pub fn new() -> Self {
        Self {
            id: 0,
            order_date: chrono::Local::now().date_naive(),
            description: String::new(),
            quantity: String::new(),
            cost: String::new(),
            contractor: String::new(),
            site: String::new(),
            company: String::new(),
            supplier: String::new(),
            worker: String::new(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(StoreError::validation("Descripción"));
        }
        if self.quantity.trim().is_empty() {
            return Err(StoreError::validation("Cantidad"));
        }
        if self.cost.trim().is_empty() {
            return Err(StoreError::validation("Costo"));
        }
        if self.contractor.trim().is_empty() {
            return Err(StoreError::validation("Constructora"));
        }
        if self.site.trim().is_empty() {
            return Err(StoreError::validation("Obra"));
        }
        if self.company.trim().is_empty() {
            return Err(StoreError::validation("Empresa"));
        }
        if self.supplier.trim().is_empty() {
            return Err(StoreError::validation("Proveedor"));
        }
        if self.worker.trim().is_empty() {
            return Err(StoreError::validation("Trabajador"));
        }
        Ok(())
    }
}
