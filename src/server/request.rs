use std::io::Read;

use anyhow::{Context, Result};
use http::Method;
use tracing::debug;

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::pipeline::Request;

/// Convert a `may_minihttp::Request` into a pipeline [`Request`].
///
/// Header names are lowercased, a valid `x-request-id` header is reused as the
/// request id, and a non-empty body is parsed as JSON when possible.
///
/// # Errors
///
/// Fails when the method is not a valid HTTP token.
pub fn parse_request(req: may_minihttp::Request) -> Result<Request> {
    let method = req.method().to_string();
    let target = req.path().to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
        .collect();

    let mut raw_body = String::new();
    if let Err(err) = req.body().read_to_string(&mut raw_body) {
        debug!(error = %err, "Request body unreadable - treated as empty");
        raw_body.clear();
    }

    build_request(&method, &target, headers, &raw_body)
}

pub(crate) fn build_request(
    method: &str,
    target: &str,
    headers: Vec<(String, String)>,
    raw_body: &str,
) -> Result<Request> {
    let method = Method::from_bytes(method.as_bytes())
        .with_context(|| format!("invalid HTTP method `{method}`"))?;

    let mut request = Request::new(method, target);
    for (name, value) in headers {
        request = request.with_header(&name, value);
    }
    let request_id = RequestId::from_header_or_new(request.get_header(REQUEST_ID_HEADER));
    request = request.with_request_id(request_id);

    if !raw_body.is_empty() {
        match serde_json::from_str(raw_body) {
            Ok(json) => request = request.with_body(json),
            Err(err) => debug!(
                request_id = %request_id,
                body_size_bytes = raw_body.len(),
                error = %err,
                "Request body is not JSON - ignored"
            ),
        }
    }

    // R1: HTTP request converted
    debug!(
        request_id = %request_id,
        method = %request.method,
        path = %request.path,
        headers_count = request.headers.len(),
        query_count = request.query_params.len(),
        "HTTP request parsed"
    );

    Ok(request)
}
