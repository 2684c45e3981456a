use http::StatusCode;
use may_minihttp::Response as HttpResponse;
use serde_json::Value;
use tracing::error;

use crate::pipeline::Response;

fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// `may_minihttp` only accepts `'static` header lines
fn content_type_line(response: &Response) -> &'static str {
    match response.get_header("content-type") {
        Some(ct) if ct.starts_with("text/html") => "Content-Type: text/html; charset=utf-8",
        Some(ct) if ct.starts_with("text/plain") => "Content-Type: text/plain; charset=utf-8",
        Some(ct) if ct.starts_with("application/json") => "Content-Type: application/json",
        _ => match response.body {
            Value::String(_) => "Content-Type: text/plain; charset=utf-8",
            _ => "Content-Type: application/json",
        },
    }
}

/// Write a pipeline [`Response`] to the wire.
///
/// String bodies are sent as-is, everything else as JSON.
pub fn write_response(res: &mut HttpResponse, response: &Response) {
    res.status_code(usize::from(response.status), status_reason(response.status));
    res.header(content_type_line(response));
    let bytes = match &response.body {
        Value::String(s) => s.clone().into_bytes(),
        other => serde_json::to_vec(other).unwrap_or_else(|err| {
            error!(error = %err, "Response body serialization failed");
            b"null".to_vec()
        }),
    };
    res.body_vec(bytes);
}
