use thiserror::Error;

/// Remediation text shown instead of a raw permission error. The store is
/// expected to be provisioned with full grants for the application role.
pub const PERMISSION_HELP: &str = "PERMISSION ERROR: the database role used by the application \
cannot read or write this table. Connect as a superuser and run:\n\
  GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO <app_role>;\n\
  GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA public TO <app_role>;\n\
then retry the operation.";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{}", PERMISSION_HELP)]
    PermissionDenied,

    #[error("{field} es requerido")]
    Validation { field: &'static str },

    #[error("referencia inválida: {0}")]
    InvalidReference(&'static str),

    #[error("export tool missing: {0}")]
    ExportToolMissing(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn validation(field: &'static str) -> Self {
        StoreError::Validation { field }
    }

    /// Postgres `insufficient_privilege`.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("42501") {
                return StoreError::PermissionDenied;
            }
        }
        StoreError::Database(err)
    }
}

/// True when a query failed because the sort column (or an index on it) is
/// missing; list screens downgrade these to an unordered read.
pub fn is_missing_sort_order(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => missing_sort_order(db.code().as_deref(), db.message()),
        _ => false,
    }
}

// undefined_column / undefined_object, or a server message naming an index
fn missing_sort_order(code: Option<&str>, message: &str) -> bool {
    matches!(code, Some("42703") | Some("42704")) || message.contains("index")
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_column_codes_downgrade_the_ordered_read() {
        assert!(missing_sort_order(Some("42703"), "column does not exist"));
        assert!(missing_sort_order(Some("42704"), "object does not exist"));
        assert!(!missing_sort_order(Some("42501"), "permission denied"));
        assert!(!missing_sort_order(None, "syntax error"));
    }

    #[test]
    fn index_mentions_downgrade_without_a_code() {
        assert!(missing_sort_order(None, "index \"created_at_idx\" does not exist"));
        assert!(!missing_sort_order(None, "relation does not exist"));
    }

    #[test]
    fn non_database_errors_are_not_sort_order_failures() {
        assert!(!is_missing_sort_order(&sqlx::Error::RowNotFound));
    }
}
