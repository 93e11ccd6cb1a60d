//! Access-control decisions for obstacle and server info queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authenticated caller. Elevated capability is a flag, not a separate type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

/// Why a request was refused. Every kind is a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("user is not authenticated")]
    Unauthenticated,
    #[error("method {0} is not allowed, use GET")]
    MethodNotAllowed(String),
    #[error("invalid value for parameter `{name}`: {value:?}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("user is not permitted to {0}")]
    Unauthorized(&'static str),
}

impl AccessError {
    /// Short machine-readable kind, used in error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::Unauthenticated => "unauthenticated",
            AccessError::MethodNotAllowed(_) => "method_not_allowed",
            AccessError::InvalidParameter { .. } => "invalid_parameter",
            AccessError::Unauthorized(_) => "unauthorized",
        }
    }
}

/// Require an authenticated caller.
pub fn require_principal(principal: Option<Principal>) -> Result<Principal, AccessError> {
    principal.ok_or(AccessError::Unauthenticated)
}

/// Resolve the optional `log` query parameter into "record this access?".
///
/// Accepts exactly `true` or `false`; absent means `true`. Only superusers may
/// pass `false`.
pub fn resolve_logging(principal: &Principal, log: Option<&str>) -> Result<bool, AccessError> {
    match log {
        None | Some("true") => Ok(true),
        Some("false") if principal.is_superuser => Ok(false),
        Some("false") => Err(AccessError::Unauthorized("disable access logging")),
        Some(other) => Err(AccessError::InvalidParameter {
            name: "log",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_superuser: bool) -> Principal {
        Principal {
            user_id: 7,
            username: "team".to_string(),
            is_superuser,
        }
    }

    #[test]
    fn missing_principal_is_unauthenticated() {
        assert_eq!(require_principal(None), Err(AccessError::Unauthenticated));
        assert_eq!(require_principal(Some(user(false))), Ok(user(false)));
    }

    #[test]
    fn logging_defaults_on() {
        assert_eq!(resolve_logging(&user(false), None), Ok(true));
        assert_eq!(resolve_logging(&user(false), Some("true")), Ok(true));
        assert_eq!(resolve_logging(&user(true), Some("true")), Ok(true));
    }

    #[test]
    fn only_superuser_disables_logging() {
        assert_eq!(resolve_logging(&user(true), Some("false")), Ok(false));
        assert_eq!(
            resolve_logging(&user(false), Some("false")),
            Err(AccessError::Unauthorized("disable access logging"))
        );
    }

    #[test]
    fn log_values_are_case_sensitive() {
        for value in ["42", "True", "FALSE", "", "1"] {
            let err = resolve_logging(&user(true), Some(value)).unwrap_err();
            assert_eq!(err.kind(), "invalid_parameter", "value {value:?}");
        }
    }
}
