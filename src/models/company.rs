use crate::error::{Result, StoreError};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub phone2: String,
    pub email: String,
    pub created_at: i64,
}

impl Company {
    pub fn new() -> Self {
        Self {
            id: 0,
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            phone2: String::new(),
            email: String::new(),
            created_at: 0,
        }
    }

    /// Only the name is required; the contact fields may stay empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation("Nombre"));
        }
        Ok(())
    }
}
