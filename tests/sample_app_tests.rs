use brrtchannels::channels::ResolverOptions;
use brrtchannels::demo::{response_message, sample_app, SAMPLE_CHANNELS, SAMPLE_REQUESTS};

mod common;
use common::get;
use common::http::send_request;
use common::server::TestServer;

fn app() -> brrtchannels::Pipeline {
    sample_app(ResolverOptions::new(SAMPLE_CHANNELS)).unwrap()
}

#[test]
fn test_documented_sample_requests() {
    let app = app();
    for &(path, status, expected) in SAMPLE_REQUESTS {
        let res = get(&app, path);
        assert_eq!(res.status, status, "status for {path}");
        assert_eq!(response_message(&res), Some(expected), "body for {path}");
    }
}

#[test]
fn test_unregistered_channel_segment_is_server_error() {
    let res = get(&app(), "/gamma/stack/original");
    assert_eq!(res.status, 500);
    assert_eq!(
        response_message(&res),
        Some("channel `gamma` not found in list of channels: alpha,beta")
    );
}

#[test]
fn test_channels_without_cascade() {
    let app = sample_app(ResolverOptions::new(SAMPLE_CHANNELS).cascade(false)).unwrap();
    assert_eq!(get(&app, "/alpha/stack/beta").status, 404);
    assert_eq!(get(&app, "/alpha/stack/alpha").status, 200);
}

#[test]
fn test_sample_app_over_http() {
    let server = TestServer::start(app());

    let (status, body) = send_request(&server.addr(), "/alpha/stack/beta");
    assert_eq!(status, 200);
    assert_eq!(body, "OK Beta");

    let (status, body) = send_request(&server.addr(), "/alpha/router/original");
    assert_eq!(status, 404);
    assert!(body.contains("Cannot GET /alpha/router/original"));

    let (status, body) = send_request(&server.addr(), "/none/router/original");
    assert_eq!(status, 200);
    assert_eq!(body, "Original Content");
}
