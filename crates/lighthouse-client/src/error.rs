//! Client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity not registered")]
    NotFound,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    Api(String),
}
