//! The sample application: channel selected by the first path segment.
//!
//! ```text
//! GET /{channel}/stack/{content}    stack dispatch, original content as default
//! GET /{channel}/router/{content}   router dispatch, original content as default
//! ```
//!
//! `{channel}` is `alpha`, `beta` or `none` (no channel). [`SAMPLE_REQUESTS`] lists
//! every combination with the status and body it produces.

use serde_json::Value;

use crate::channels::{
    ChannelResolver, ChannelRouter, ContentMap, ResolverOptions, RouterOptions, Selector,
    StackDispatcher,
};
use crate::error::ChannelError;
use crate::pipeline::{Pipeline, Response};

/// Channels the sample registers, highest precedence first
pub const SAMPLE_CHANNELS: [&str; 2] = ["alpha", "beta"];

/// Path value that selects no channel
pub const NO_CHANNEL: &str = "none";

/// `(path, status, message)` for every request the sample app documents
pub const SAMPLE_REQUESTS: &[(&str, u16, &str)] = &[
    ("/alpha/stack/alpha", 200, "OK Alpha"),
    ("/alpha/stack/beta", 200, "OK Beta"),
    ("/alpha/stack/original", 200, "Original Content"),
    ("/beta/stack/alpha", 404, "Cannot GET /beta/stack/alpha"),
    ("/beta/stack/beta", 200, "OK Beta"),
    ("/beta/stack/original", 200, "Original Content"),
    ("/none/stack/alpha", 404, "Cannot GET /none/stack/alpha"),
    ("/none/stack/beta", 404, "Cannot GET /none/stack/beta"),
    ("/none/stack/original", 200, "Original Content"),
    ("/alpha/router/alpha", 200, "OK Alpha"),
    ("/alpha/router/beta", 404, "Cannot GET /alpha/router/beta"),
    ("/alpha/router/original", 404, "Cannot GET /alpha/router/original"),
    ("/beta/router/alpha", 404, "Cannot GET /beta/router/alpha"),
    ("/beta/router/beta", 200, "OK Beta"),
    ("/beta/router/original", 404, "Cannot GET /beta/router/original"),
    ("/none/router/alpha", 404, "Cannot GET /none/router/alpha"),
    ("/none/router/beta", 404, "Cannot GET /none/router/beta"),
    ("/none/router/original", 200, "Original Content"),
];

pub fn original_content() -> Pipeline {
    Pipeline::new().get("/original", |_req| Response::text("Original Content"))
}

pub fn channel_content() -> Result<ContentMap, ChannelError> {
    ContentMap::new()
        .with(
            "alpha",
            Pipeline::new().get("/alpha", |_req| Response::text("OK Alpha")),
        )?
        .with(
            "beta",
            Pipeline::new().get("/beta", |_req| Response::text("OK Beta")),
        )
}

/// Text of a plain-text body, or the message of an error body
pub fn response_message(response: &Response) -> Option<&str> {
    response
        .body_text()
        .or_else(|| response.body.get("error").and_then(Value::as_str))
}

/// Selector reading the `channel` path parameter
pub fn path_selector() -> Selector {
    Selector::from_fn(|req| {
        req.get_path_param("channel")
            .filter(|channel| *channel != NO_CHANNEL)
            .map(str::to_string)
    })
}

/// Build the sample application over `options`.
///
/// The selector in `options` is replaced with [`path_selector`].
///
/// # Errors
///
/// `InvalidConfiguration` if `options` are rejected by the resolver.
pub fn sample_app(options: ResolverOptions) -> Result<Pipeline, ChannelError> {
    let resolver = ChannelResolver::new(options.selector(path_selector()))?;
    let content = channel_content()?;
    let original = original_content();

    let per_channel = Pipeline::new()
        .layer(resolver)
        .mount(
            "/stack",
            StackDispatcher::new(content.clone(), original.clone()),
        )
        .mount(
            "/router",
            ChannelRouter::new(original, content, RouterOptions::default())?,
        );

    Ok(Pipeline::new().mount("/{channel}", per_channel))
}
