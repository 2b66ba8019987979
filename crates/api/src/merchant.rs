//! Merchant identity extractor for Axum handlers.
//!
//! Authentication happens upstream (API gateway); by the time a request
//! reaches this service the caller's merchant id arrives in the trusted
//! `X-Merchant-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use taic_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Merchant extracted from the `X-Merchant-Id` header.
///
/// Use this as an extractor parameter in any handler that operates on
/// merchant-owned data:
///
/// ```ignore
/// async fn my_handler(merchant: Merchant) -> AppResult<Json<()>> {
///     tracing::info!(merchant_id = merchant.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Merchant {
    /// The merchant's internal database id.
    pub id: DbId,
}

impl FromRequestParts<AppState> for Merchant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-merchant-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing X-Merchant-Id header".into()))?;

        let id: DbId = header
            .parse()
            .map_err(|_| AppError::BadRequest("X-Merchant-Id must be a numeric id".into()))?;

        Ok(Merchant { id })
    }
}
