use crate::error::{Result, StoreError};

/// Controlled activity label offered by the measurement line-item picker.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Activity {
    pub id: i32,
    pub description: String,
    pub created_at: i64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            id: 0,
            description: String::new(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(StoreError::validation("Descripción"));
        }
        Ok(())
    }
}
