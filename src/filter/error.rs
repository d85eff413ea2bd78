use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid sort token: {0}")]
    InvalidSort(String),

    #[error("Invalid filter expression (expected name=value): {0}")]
    InvalidFilterExpression(String),

    #[error("Invalid page number: {0}")]
    InvalidPage(String),
}
