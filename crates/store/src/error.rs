use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store payload corrupt: {0}")]
    Corrupt(String),
}
