use crate::shared::errors::{self, ApiError, codes};
use crate::weight_api::error_recorder::IntoApiError;

use super::weight::WeightError;

pub type HandlerResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Credentials rejected")]
    Unauthorized,

    #[error("Invalid weight: {0}")]
    InvalidWeight(#[from] WeightError),

    #[error("Database insert failed: {0}")]
    InsertFailed(diesel::result::Error),

    #[error("Database read failed: {0}")]
    ReadFailed(diesel::result::Error),
}

impl IntoApiError for Error {
    fn error_code(&self) -> &'static str {
        match self {
            Error::MethodNotAllowed => codes::METHOD_NOT_ALLOWED,
            Error::Unauthorized => codes::UNAUTHORIZED,
            Error::InvalidWeight(_) => codes::INVALID_INPUT,
            Error::InsertFailed(_) | Error::ReadFailed(_) => {
                codes::DATABASE_ERROR
            }
        }
    }

    /// The caller never learns which secret was wrong or what the database
    /// said.
    fn into_api_error(self) -> ApiError {
        match self {
            Error::MethodNotAllowed => errors::method_not_allowed(),
            Error::Unauthorized => errors::unauthorized(),
            Error::InvalidWeight(_) => errors::invalid_input("invalid weight"),
            Error::InsertFailed(_) => errors::database_error("db insert failed"),
            Error::ReadFailed(_) => errors::database_error("db read failed"),
        }
    }
}
