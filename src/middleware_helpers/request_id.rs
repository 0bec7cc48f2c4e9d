use crate::tracing::{RequestId, REQUEST_ID_HEADER};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Attaches a request id to every request and echoes it on the response.
///
/// A client-supplied `x-request-id` is reused when it is a valid header value.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let (request_id, header_value) = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .and_then(|v| HeaderValue::from_str(v).ok().map(|hv| (RequestId::new(v), hv)))
        .unwrap_or_else(generated_id);

    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);
    request
        .headers_mut()
        .insert(header_name.clone(), header_value.clone());
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.as_str(),
        method = %request.method(),
        uri = %request.uri(),
    );
    let mut response = crate::tracing::scope_request_id(
        request_id,
        async move { next.run(request).await }.instrument(span),
    )
    .await;

    response.headers_mut().insert(header_name, header_value);
    response
}

fn generated_id() -> (RequestId, HeaderValue) {
    let id = RequestId::default();
    // uuid text is always a valid header value
    let value = HeaderValue::from_str(id.as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    (id, value)
}
