use std::io::Write;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use brrtchannels::channels::Selector;
use brrtchannels::pipeline::{Pipeline, Request, Response};
use futures::future;

mod common;
use common::http::send_request;
use common::resolver;
use common::server::TestServer;

/// Selector that never resolves for `/hang`
fn stalling_selector() -> Selector {
    Selector::from_async(|req: &Request| {
        let stall = req.path == "/hang";
        async move {
            if stall {
                future::pending::<()>().await;
            }
            Ok(Some("alpha".to_string()))
        }
    })
}

fn app() -> Pipeline {
    Pipeline::new()
        .layer(resolver(&["alpha"], stalling_selector()))
        .get("/hang", |_req| Response::text("unreachable"))
        .get("/ok", |_req| Response::text("ok"))
        .get("/panic", |_req: &Request| -> Response { panic!("content exploded") })
}

#[test]
fn test_pending_selector_does_not_stall_other_connections() {
    let server = TestServer::start(app());

    let mut stalled = TcpStream::connect(server.addr()).unwrap();
    write!(stalled, "GET /hang HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
    thread::sleep(Duration::from_millis(100));

    let (status, body) = send_request(&server.addr(), "/ok");
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
    drop(stalled);
}

#[test]
fn test_panicking_content_answers_500() {
    let server = TestServer::start(app());

    let (status, body) = send_request(&server.addr(), "/panic");
    assert_eq!(status, 500);
    assert!(body.contains("Handler panicked: content exploded"));

    // The worker survives the panic
    let (status, body) = send_request(&server.addr(), "/ok");
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}
