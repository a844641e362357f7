use crate::error::{Result, StoreError};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Contractor {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub created_at: i64,
}

impl Contractor {
    pub fn new() -> Self {
        Self {
            id: 0,
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation("Nombre"));
        }
        Ok(())
    }
}
