//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Handler -> Result<Json<T>, ApiError>                                   │
//! │         │                                                               │
//! │         ├── DbError::NotFound ─────────────► 404 NOT_FOUND              │
//! │         ├── CoreError::InsufficientStock ──► 409 INSUFFICIENT_STOCK     │
//! │         ├── ValidationError ───────────────► 400 VALIDATION_ERROR       │
//! │         ├── AuthError::InvalidCredentials ─► 401 UNAUTHORIZED           │
//! │         └── DbError::QueryFailed ──────────► 500 DATABASE_ERROR         │
//! │                                              (details only in the log) │
//! │                                                                         │
//! │  Body: { "code": "NOT_FOUND", "message": "Product not found: 123" }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use barkas_core::{CoreError, ValidationError};
use barkas_db::{AuthError, DbError};
use serde::Serialize;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Kamera Analog: available 1, requested 2"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Unique value already taken (409)
    Conflict,

    /// Checkout with an empty cart (422)
    EmptyCart,

    /// Requested more than is in stock (409)
    InsufficientStock,

    /// Not signed in, or the session is no longer valid (401)
    Unauthorized,

    /// Signed in without the required role (403)
    Forbidden,

    /// Authentication backend unreachable (503)
    ServiceUnavailable,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Please sign in")
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "You do not have access to this page")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Rule(e) => ApiError::from(e),
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint rejected write: {}", message);
                ApiError::validation("Value out of range")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, "Cart is empty"),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            e @ CoreError::InvalidDateRange { .. } => ApiError::validation(e.to_string()),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Cookie session failures are logged; the client only sees a 500.
impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        tracing::error!("Visitor session failed: {}", err);
        ApiError::internal("Session unavailable")
    }
}

/// Auth failures never reveal which part of the credentials was wrong.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::new(ErrorCode::Unauthorized, "Invalid email or password")
            }
            e @ (AuthError::InvalidToken | AuthError::SessionExpired | AuthError::SessionRevoked) => {
                ApiError::new(ErrorCode::Unauthorized, e.to_string())
            }
            AuthError::Validation(e) => ApiError::from(e),
            AuthError::Database(DbError::UniqueViolation { field, value }) => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            AuthError::Database(e) => {
                tracing::error!("Auth storage failure: {}", e);
                ApiError::new(ErrorCode::ServiceUnavailable, "Authentication service unavailable")
            }
            AuthError::Hashing(e) | AuthError::Signing(e) => {
                tracing::error!("Auth internal failure: {}", e);
                ApiError::internal("Authentication failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_hide_details() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rule_errors_pass_through() {
        let err = ApiError::from(DbError::Rule(CoreError::InsufficientStock {
            product: "Radio".into(),
            available: 1,
            requested: 2,
        }));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Radio"));

        let err = ApiError::from(DbError::not_found("Order", "o-1"));
        assert_eq!(err.code.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_messages_are_generic() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.message, "Invalid email or password");
        assert_eq!(err.code.status(), StatusCode::UNAUTHORIZED);

        let err = ApiError::from(AuthError::Database(DbError::PoolExhausted));
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert_eq!(err.message, "Authentication service unavailable");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::from(CoreError::EmptyCart)).unwrap();
        assert_eq!(json["code"], "EMPTY_CART");
        assert_eq!(json["message"], "Cart is empty");
    }
}
