//! Durable store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema error: {0}")]
    Schema(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = StoreError::Schema("bad statement".to_string());
        assert_eq!(err.to_string(), "Schema error: bad statement");
    }
}
