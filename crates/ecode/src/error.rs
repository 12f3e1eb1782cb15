use ecode_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodeError>;

#[derive(Error, Debug)]
pub enum CodeError {
    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("Invalid code")]
    NotFound,

    #[error("Code revoked")]
    Revoked,

    #[error("Already redeemed")]
    AlreadyRedeemed,

    #[error("Code expired")]
    Expired,

    #[error("Unavailable")]
    Unavailable,

    #[error("No unique code after {0} attempts")]
    GenerationExhausted(u32),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CodeError {
    /// Business-rule rejections, as opposed to infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            CodeError::Store(_) | CodeError::GenerationExhausted(_)
        )
    }
}
