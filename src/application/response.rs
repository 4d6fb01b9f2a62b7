use serde::Serialize;

use super::LedgerError;

/// Uniform result envelope for machine-readable consumers: service failures
/// become `success: false` plus a message instead of crossing the boundary
/// as errors.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            msg: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            msg: Some(msg.into()),
        }
    }
}

impl<T> From<Result<T, LedgerError>> for Envelope<T> {
    fn from(result: Result<T, LedgerError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(err.to_string()),
        }
    }
}
