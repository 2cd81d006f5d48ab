//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient funds: available 30.00, required 120.00",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`LedgerError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 4000–4999 | Funds           | 422 Unprocessable Entity     |
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// Wallet with the given ID was not found.
    #[error("wallet not found: {0}")]
    WalletNotFound(uuid::Uuid),

    /// No wallet exists for the given user.
    #[error("no wallet for user: {0}")]
    WalletNotFoundForUser(uuid::Uuid),

    /// Mutation attempted against a frozen or closed wallet.
    #[error("wallet {wallet_id} is {status}, mutations rejected")]
    WalletNotActive {
        /// Target wallet.
        wallet_id: uuid::Uuid,
        /// Current non-active status string.
        status: &'static str,
    },

    /// Debit would drive a balance negative. Carries the shortfall
    /// context so callers can render an actionable message.
    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        /// Total spendable funds (cash + bonus) at decision time.
        available: Decimal,
        /// Amount the operation needed.
        required: Decimal,
    },

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Interest was already calculated for this wallet and period.
    /// Treated as an idempotent no-op by the accrual engine; callers
    /// never observe it.
    #[error("interest already calculated for this period")]
    DuplicateAccrualPeriod,

    /// Serialized critical-section retries exhausted; transient.
    #[error("concurrent modification conflict, retries exhausted")]
    ConflictRetryExhausted,

    /// Deposit request with the given ID was not found.
    #[error("deposit request not found: {0}")]
    DepositRequestNotFound(uuid::Uuid),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::WalletNotFound(_) => 2001,
            Self::WalletNotFoundForUser(_) => 2002,
            Self::DepositRequestNotFound(_) => 2003,
            Self::WalletNotActive { .. } => 2004,
            Self::DuplicateAccrualPeriod => 2005,
            Self::ConflictRetryExhausted => 2006,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
            Self::InsufficientFunds { .. } => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::WalletNotFound(_)
            | Self::WalletNotFoundForUser(_)
            | Self::DepositRequestNotFound(_) => StatusCode::NOT_FOUND,
            Self::WalletNotActive { .. }
            | Self::DuplicateAccrualPeriod
            | Self::ConflictRetryExhausted => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Only the shortfall carries structured details.
        let details = match &self {
            Self::InsufficientFunds { available, required } => {
                Some(format!("available={available}, required={required}"))
            }
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_funds_maps_to_422() {
        let err = LedgerError::InsufficientFunds {
            available: dec!(30),
            required: dec!(120),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), 4001);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = LedgerError::WalletNotFound(uuid::Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_active_maps_to_409() {
        let err = LedgerError::WalletNotActive {
            wallet_id: uuid::Uuid::new_v4(),
            status: "frozen",
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("frozen"));
    }

    #[test]
    fn insufficient_funds_message_includes_shortfall() {
        let err = LedgerError::InsufficientFunds {
            available: dec!(30),
            required: dec!(120),
        };
        let msg = err.to_string();
        assert!(msg.contains("30"));
        assert!(msg.contains("120"));
    }
}
