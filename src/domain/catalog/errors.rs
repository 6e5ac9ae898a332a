// ============================================================================
// Catalog Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    NotFound(i64),

    #[error("Transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),
}
