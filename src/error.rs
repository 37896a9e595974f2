use thiserror::Error;

/// Rejections raised at the service and command-line boundary. The engine in
/// `core` never fails; these only guard what callers hand to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("{field} has {points} points; at most {limit} are allowed")]
    RangeTooLarge {
        field: &'static str,
        points: usize,
        limit: usize,
    },
}

impl RequestError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

pub type RequestResult<T> = Result<T, RequestError>;
