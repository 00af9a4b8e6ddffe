// POST /receiveWebhook
//
// Design Decision: All protocol decisions live in taskrelay-core's WebhookRelay.
// This handler only extracts the two headers and the raw body, then maps the
// outcome or error category onto a status code.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use taskrelay_core::{
    ErrorCategory, InboundRequest, RelayError, WebhookOutcome, SECRET_HEADER, SIGNATURE_HEADER,
};

use crate::AppState;

/// Handshake, signed delivery, or 400
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let request = InboundRequest::classify(
        headers.get(SECRET_HEADER).map(HeaderValue::as_bytes),
        headers.get(SIGNATURE_HEADER).map(HeaderValue::as_bytes),
    );

    let outcome = state
        .relay
        .handle(request, &body)
        .map_err(|e| error_status(&e))?;

    match outcome {
        WebhookOutcome::Handshake { secret } => {
            let value = HeaderValue::from_bytes(&secret).map_err(|e| {
                tracing::error!("Failed to echo handshake secret: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            Ok((StatusCode::OK, [(SECRET_HEADER, value)], "OK").into_response())
        }
        WebhookOutcome::Dispatched { .. } | WebhookOutcome::Ignored(_) => {
            Ok((StatusCode::OK, "OK").into_response())
        }
    }
}

/// Map a relay error to the status code the caller sees
pub fn error_status(err: &RelayError) -> StatusCode {
    match err.category() {
        ErrorCategory::AuthenticationFailure => StatusCode::UNAUTHORIZED,
        ErrorCategory::MalformedRequest => {
            tracing::debug!("Rejected webhook request: {}", err);
            StatusCode::BAD_REQUEST
        }
        ErrorCategory::InternalFault | ErrorCategory::DownstreamFault => {
            tracing::error!("Failed to process webhook: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
