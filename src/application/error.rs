use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product already exists: {0}")]
    ProductAlreadyExists(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Client already exists: {0}")]
    ClientAlreadyExists(String),

    #[error("Sale not found: invoice #{0}")]
    SaleNotFound(i64),

    #[error("Cart is empty; nothing to check out")]
    EmptyCart,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
