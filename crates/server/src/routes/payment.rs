//! Payment route handlers: initiation and the gateway callback.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use mercato_core::TxRef;

use crate::checkout::CheckoutService;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::AddressSnapshot;
use crate::state::AppState;

/// Shipping address submitted at payment initiation.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub sub_city: String,
    pub street: String,
    #[serde(default)]
    pub house_no: Option<String>,
}

impl From<AddressForm> for AddressSnapshot {
    fn from(form: AddressForm) -> Self {
        Self {
            full_name: form.full_name,
            phone: form.phone,
            city: form.city,
            sub_city: form.sub_city,
            street: form.street,
            house_no: form.house_no,
        }
    }
}

/// Query parameters of the gateway callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub trx_ref: String,
}

/// Initiate a payment for the current cart.
///
/// Returns `202 Accepted` with the hosted checkout URL and the transaction
/// reference; the order itself only materializes once the gateway calls
/// back with a verifiable payment.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn initiate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<AddressForm>,
) -> Result<impl IntoResponse> {
    let service = CheckoutService::new(state.pool(), state.gateway(), state.config());
    let initiated = service
        .initiate_payment(&user, AddressSnapshot::from(form))
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "payment initiated",
            "payment_url": initiated.payment_url,
            "tx_ref": initiated.tx_ref,
        })),
    ))
}

/// Handle the gateway's asynchronous payment callback.
///
/// Called by the gateway (or via customer redirect) once a transaction
/// settles. The reference is verified server-side; query parameters are
/// never trusted as proof of payment.
#[instrument(skip(state))]
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse> {
    let tx_ref = TxRef::parse(&params.trx_ref)
        .map_err(|e| AppError::BadRequest(format!("invalid trx_ref: {e}")))?;

    let service = CheckoutService::new(state.pool(), state.gateway(), state.config());
    let order = service.handle_callback(&tx_ref).await?;

    Ok(Json(json!({
        "message": "order successfully placed and paid",
        "order_id": order.id,
        "tx_ref": tx_ref,
    })))
}
