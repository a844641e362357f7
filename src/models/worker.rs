use crate::error::{Result, StoreError};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Worker {
    pub id: i32,
    pub name: String,
    pub alias: String,
    pub address: String,
    pub phone: String,
    pub job: String,
    /// Company name string, as on the worker form; not a foreign key.
    pub company: String,
    pub work_status: String,
    pub created_at: i64,
}

impl Worker {
    pub fn new() -> Self {
        Self {
            id: 0,
            name: String::new(),
            alias: String::new(),
            address: String::new(),
            phone: String::new(),
            job: String::new(),
            company: String::new(),
            work_status: String::new(),
            created_at: 0,
        }
    }

    /// Every field on the worker form is required.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation("Nombre"));
        }
        if self.alias.trim().is_empty() {
            return Err(StoreError::validation("Alias"));
        }
        if self.address.trim().is_empty() {
            return Err(StoreError::validation("Dirección"));
        }
        if self.phone.trim().is_empty() {
            return Err(StoreError::validation("Teléfono"));
        }
        if self.job.trim().is_empty() {
            return Err(StoreError::validation("Puesto"));
        }
        if self.company.trim().is_empty() {
            return Err(StoreError::validation("Empresa"));
        }
        if self.work_status.trim().is_empty() {
            return Err(StoreError::validation("Estado"));
        }
        Ok(())
    }
}
