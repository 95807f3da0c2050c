//! Handlers for the `/ndas` resource.
//!
//! Buyers request and sign; the listing's seller sends and rejects. Send and
//! reject require the seller role up front; ownership checks are left to
//! [`NdaService`](dealroom_core::services::NdaService).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dealroom_core::nda::NdaView;
use dealroom_core::services::{NdaAccessStatus, NdaDisposition, NdaOutcome};
use dealroom_core::types::DbId;
use dealroom_events::types::{NDA_REJECTED, NDA_RENEWED, NDA_REQUESTED, NDA_SENT, NDA_SIGNED};
use dealroom_events::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, ClientContext};
use crate::middleware::rbac::RequireSeller;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RequestNdaInput {
    pub listing_id: DbId,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendNdaInput {
    #[serde(default)]
    pub document_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignNdaInput {
    #[serde(default)]
    pub signed_document_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectNdaInput {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query parameters for `GET /ndas`.
#[derive(Debug, Default, Deserialize)]
pub struct NdaListParams {
    /// List NDAs on the caller's own listings instead of their requests.
    #[serde(default)]
    pub as_seller: bool,
    pub listing_id: Option<DbId>,
}

/// Result of a workflow action: what happened plus the NDA afterwards.
#[derive(Debug, Serialize)]
pub struct NdaActionResponse {
    pub message: &'static str,
    pub nda: NdaView,
}

fn action_response(state: &AppState, outcome: &NdaOutcome) -> NdaActionResponse {
    NdaActionResponse {
        message: outcome.disposition.message(),
        nda: state.ndas.view(&outcome.nda),
    }
}

// ---------------------------------------------------------------------------
// POST /ndas/request
// ---------------------------------------------------------------------------

/// Ask for NDA access to a listing.
///
/// Returns 201 when a new request was created, 200 when an existing one was
/// renewed or is already pending/signed.
pub async fn request_nda(
    auth: AuthUser,
    State(state): State<AppState>,
    client: ClientContext,
    Json(input): Json<RequestNdaInput>,
) -> AppResult<(StatusCode, Json<DataResponse<NdaActionResponse>>)> {
    let outcome = state
        .ndas
        .request(input.listing_id, &auth.principal(), client.into_actor())
        .await?;

    let event_type = match outcome.disposition {
        NdaDisposition::Created => Some(NDA_REQUESTED),
        NdaDisposition::Renewed => Some(NDA_RENEWED),
        _ => None,
    };
    if let Some(event_type) = event_type {
        state
            .event_bus
            .publish(DomainEvent::for_nda(event_type, &outcome.nda, auth.user_id));
    }

    let status = if outcome.disposition == NdaDisposition::Created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(DataResponse {
            data: action_response(&state, &outcome),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /ndas
// ---------------------------------------------------------------------------

pub async fn list_ndas(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NdaListParams>,
) -> AppResult<Json<DataResponse<Vec<NdaView>>>> {
    let ndas = state
        .ndas
        .list(&auth.principal(), params.as_seller, params.listing_id)
        .await?;
    let data = ndas.iter().map(|nda| state.ndas.view(nda)).collect();
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /ndas/{id}
// ---------------------------------------------------------------------------

pub async fn get_nda(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<NdaView>>> {
    let nda = state.ndas.get(id, &auth.principal()).await?;
    Ok(Json(DataResponse {
        data: state.ndas.view(&nda),
    }))
}

// ---------------------------------------------------------------------------
// POST /ndas/{id}/send
// ---------------------------------------------------------------------------

pub async fn send_nda(
    RequireSeller(auth): RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendNdaInput>,
) -> AppResult<Json<DataResponse<NdaActionResponse>>> {
    let outcome = state
        .ndas
        .send(id, &auth.principal(), input.document_url)
        .await?;

    state
        .event_bus
        .publish(DomainEvent::for_nda(NDA_SENT, &outcome.nda, auth.user_id));

    Ok(Json(DataResponse {
        data: action_response(&state, &outcome),
    }))
}

// ---------------------------------------------------------------------------
// POST /ndas/{id}/sign
// ---------------------------------------------------------------------------

pub async fn sign_nda(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    client: ClientContext,
    Json(input): Json<SignNdaInput>,
) -> AppResult<Json<DataResponse<NdaActionResponse>>> {
    let outcome = state
        .ndas
        .sign(
            id,
            &auth.principal(),
            client.into_actor(),
            input.signed_document_url,
        )
        .await?;

    if outcome.disposition.changed() {
        state
            .event_bus
            .publish(DomainEvent::for_nda(NDA_SIGNED, &outcome.nda, auth.user_id));
    }

    Ok(Json(DataResponse {
        data: action_response(&state, &outcome),
    }))
}

// ---------------------------------------------------------------------------
// POST /ndas/{id}/reject
// ---------------------------------------------------------------------------

/// The reason is forwarded on the event bus only; it is not stored.
pub async fn reject_nda(
    RequireSeller(auth): RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectNdaInput>,
) -> AppResult<Json<DataResponse<NdaActionResponse>>> {
    let nda = state
        .ndas
        .reject(id, &auth.principal(), input.reason.as_deref())
        .await?;

    let event = DomainEvent::for_nda(NDA_REJECTED, &nda, auth.user_id).with_payload(
        serde_json::json!({
            "buyer_id": nda.buyer_id,
            "status": nda.status,
            "reason": input.reason,
        }),
    );
    state.event_bus.publish(event);

    Ok(Json(DataResponse {
        data: NdaActionResponse {
            message: NdaDisposition::Rejected.message(),
            nda: state.ndas.view(&nda),
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /ndas/listing/{listing_id}/status
// ---------------------------------------------------------------------------

pub async fn nda_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(listing_id): Path<DbId>,
) -> AppResult<Json<DataResponse<NdaAccessStatus>>> {
    let status = state.ndas.status(listing_id, &auth.principal()).await?;
    Ok(Json(DataResponse { data: status }))
}
