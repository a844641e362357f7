use crate::error::{Result, StoreError};

/// A construction project ("obra"). Associated companies live in the
/// `site_companies` relation table and are loaded separately by id.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Site {
    pub id: i32,
    pub name: String,
    pub contractor: String,
    pub foreman: String,
    pub foreman_phone: String,
    pub site_manager: String,
    pub site_manager_phone: String,
    pub address: String,
    pub town: String,
    pub status: String,
    pub start_date: String,
    pub request_ref: String,
    pub created_at: i64,
}

impl Site {
    pub fn new() -> Self {
        Self {
            id: 0,
            name: String::new(),
            contractor: String::new(),
            foreman: String::new(),
            foreman_phone: String::new(),
            site_manager: String::new(),
            site_manager_phone: String::new(),
            address: String::new(),
            town: String::new(),
            status: String::new(),
            start_date: String::new(),
            request_ref: String::new(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_reports_the_nombre_field() {
        let site = Site::new();
        let err = site.validate().unwrap_err();
        assert_eq!(err.to_string(), "Nombre es requerido");

        let mut site = Site::new();
        site.name = "Torre Sur".to_string();
        assert!(site.validate().is_ok());
    }
}
